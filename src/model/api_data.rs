//! Raw vendor responses and the request event that groups them.

use crate::model::types::StationType;
use crate::time_intervals::UtcInterval;
use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

/// Version of this crate stamped into every request event.
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serializable snapshot of one HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAPIResponse {
    pub url: String,
    pub status_code: u16,
    pub reason: String,
    pub text: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

impl WeatherAPIResponse {
    /// Consumes a reqwest response, keeping the body both as text and bytes.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let url = response.url().to_string();
        let status = response.status();
        let content = response.bytes().await?.to_vec();
        Ok(Self {
            url,
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            text: String::from_utf8_lossy(&content).into_owned(),
            content,
        })
    }

    /// Builds a response that was never sent over the wire.
    pub fn synthetic(url: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            url: url.into(),
            status_code: 200,
            reason: "OK".to_string(),
            content: text.clone().into_bytes(),
            text,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// One `get_readings` call: request metadata plus every HTTP response it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAPIData {
    pub station_id: String,
    pub station_type: StationType,
    pub request_id: String,
    pub request_datetime: DateTime<Utc>,
    pub time_interval: UtcInterval,
    pub package_version: String,
    pub responses: Vec<WeatherAPIResponse>,
}

/// Flat form of [`WeatherAPIData`] with responses packed into one JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAPIRecord {
    pub station_id: String,
    pub station_type: StationType,
    pub request_id: String,
    pub request_datetime: DateTime<Utc>,
    pub time_interval: UtcInterval,
    pub package_version: String,
    pub responses: String,
}

impl WeatherAPIData {
    /// Starts a request event with a fresh request id.
    pub fn new(
        station_id: impl Into<String>,
        station_type: StationType,
        request_datetime: DateTime<Utc>,
        time_interval: UtcInterval,
        responses: Vec<WeatherAPIResponse>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            station_type,
            request_id: Uuid::new_v4().to_string(),
            request_datetime,
            time_interval,
            package_version: PACKAGE_VERSION.to_string(),
            responses,
        }
    }

    /// `{station_id}_{window start epoch}_{request_id}`, used for file names.
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.station_id,
            self.time_interval.start().timestamp(),
            self.request_id
        )
    }

    pub fn to_record(&self) -> Result<WeatherAPIRecord, serde_json::Error> {
        Ok(WeatherAPIRecord {
            station_id: self.station_id.clone(),
            station_type: self.station_type,
            request_id: self.request_id.clone(),
            request_datetime: self.request_datetime,
            time_interval: self.time_interval,
            package_version: self.package_version.clone(),
            responses: serde_json::to_string(&self.responses)?,
        })
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
