//! Davis WeatherLink v2 historic endpoint.

use crate::error::{ConfigError, ParseError, StationError};
use crate::model::{SensorReading, StationType, WeatherAPIResponse};
use crate::stations::client::{ensure_success, HttpClient};
use crate::stations::config::{require, BaseConfig, StationConfig, VendorFields};
use crate::stations::helpers::{
    fahrenheit_to_celsius, inches_to_mm, optional_f64, parse_body, round2, utc_from_unix_seconds,
};
use crate::stations::station::WeatherStation;
use crate::time_intervals::UtcInterval;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

pub const DAVIS_URL: &str = "https://api.weatherlink.com/v2/historic";

/// Longest span the historic endpoint serves in one call.
const MAX_SPAN_SECONDS: i64 = 86_400;
/// Remainders shorter than this are rejected by the vendor.
const MIN_SPAN_SECONDS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DavisConfig {
    /// Station id in WeatherLink.
    pub sn: String,
    pub apikey: String,
    /// Secret used to sign requests; never sent.
    pub apisec: String,
}

impl VendorFields for DavisConfig {
    const STATION_TYPE: StationType = StationType::Davis;

    fn validate(&self) -> Result<(), ConfigError> {
        require("sn", &self.sn)?;
        require("apikey", &self.apikey)?;
        require("apisec", &self.apisec)
    }
}

/// Splits a window into sub-windows the historic endpoint accepts.
///
/// Full days are consumed first; a remainder under five minutes is dropped.
pub fn get_intervals(interval: &UtcInterval) -> Vec<UtcInterval> {
    let mut remaining = interval.duration().num_seconds();
    let mut start = interval.start();
    let mut splits = Vec::new();

    while remaining > 0 {
        let span = if remaining > MAX_SPAN_SECONDS {
            MAX_SPAN_SECONDS
        } else if remaining < MIN_SPAN_SECONDS {
            break;
        } else {
            remaining
        };
        let window = UtcInterval::with_duration(start, Duration::seconds(span));
        start = window.end();
        splits.push(window);
        remaining -= span;
    }
    splits
}

/// Hex HMAC-SHA256 over the sorted parameter names and values.
pub fn compute_signature(
    config: &DavisConfig,
    t: i64,
    start_timestamp: i64,
    end_timestamp: i64,
) -> Result<String, StationError> {
    let message = format!(
        "api-key{}end-timestamp{}start-timestamp{}station-id{}t{}",
        config.apikey, end_timestamp, start_timestamp, config.sn, t
    );
    let mut mac = HmacSha256::new_from_slice(config.apisec.as_bytes())
        .map_err(|e| StationError::auth(config.sn.as_str(), e))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub struct DavisStation {
    config: StationConfig<DavisConfig>,
    client: HttpClient,
    base_url: String,
}

impl DavisStation {
    pub fn new(config: StationConfig<DavisConfig>) -> Self {
        Self {
            config,
            client: HttpClient::new(),
            base_url: DAVIS_URL.to_string(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(Self::new(StationConfig::from_value(value)?))
    }

    pub fn config(&self) -> &StationConfig<DavisConfig> {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_window(&self, window: &UtcInterval) -> Result<WeatherAPIResponse, StationError> {
        let vendor = &self.config.vendor;
        let t = Utc::now().timestamp();
        let start_timestamp = window.start().timestamp();
        let end_timestamp = window.end().timestamp();
        let signature = compute_signature(vendor, t, start_timestamp, end_timestamp)?;

        let request = self
            .client
            .get(format!("{}/{}", self.base_url, vendor.sn))
            .query(&[
                ("api-key", vendor.apikey.clone()),
                ("t", t.to_string()),
                ("start-timestamp", start_timestamp.to_string()),
                ("end-timestamp", end_timestamp.to_string()),
                ("api-signature", signature),
            ]);
        let response = self.client.send(request).await?;
        ensure_success(&response)?;
        Ok(response)
    }
}

#[async_trait]
impl WeatherStation for DavisStation {
    fn base(&self) -> &BaseConfig {
        &self.config.base
    }

    fn station_type(&self) -> StationType {
        StationType::Davis
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        let windows = get_intervals(interval);
        if windows.is_empty() {
            tracing::debug!(
                station_id = %self.id(),
                interval = %interval,
                "window too short for Davis, no request sent"
            );
        }
        let mut responses = Vec::with_capacity(windows.len());
        for window in &windows {
            match self.fetch_window(window).await {
                Ok(response) => responses.push(response),
                Err(err) => return Err(err.with_responses(responses)),
            }
        }
        Ok(responses)
    }

    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError> {
        let body = parse_body(text)?;
        let Some(sensors) = body.get("sensors") else {
            return Ok(Vec::new());
        };
        let sensors = sensors
            .as_array()
            .ok_or_else(|| ParseError::unexpected("'sensors' is not an array"))?;

        let mut readings = Vec::new();
        for sensor in sensors {
            let Some(records) = sensor.get("data").and_then(Value::as_array) else {
                continue;
            };
            for record in records {
                let Some(temp_out) = record.get("temp_out") else {
                    continue;
                };
                let ts = record
                    .get("ts")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| ParseError::missing_field("ts"))?;
                let mut reading = SensorReading::at(utc_from_unix_seconds(ts)?);
                reading.atemp = optional_f64(Some(temp_out))?.map(fahrenheit_to_celsius);
                reading.pcpn = match optional_f64(record.get("rainfall_mm"))? {
                    Some(mm) => Some(round2(mm)),
                    None => optional_f64(record.get("rainfall_in"))?.map(inches_to_mm),
                };
                reading.relh = optional_f64(record.get("hum_out"))?.map(round2);
                readings.push(reading);
            }
        }
        Ok(readings)
    }
}
