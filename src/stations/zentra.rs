//! Zentra Cloud readings endpoint.

use crate::error::{ConfigError, ParseError, StationError};
use crate::model::{SensorReading, StationType, WeatherAPIResponse};
use crate::stations::client::{ensure_success, HttpClient};
use crate::stations::config::{require, BaseConfig, StationConfig, VendorFields};
use crate::stations::helpers::{format_local, optional_f64, parse_body, utc_from_unix_seconds};
use crate::stations::station::WeatherStation;
use crate::time_intervals::UtcInterval;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

pub const ZENTRA_URL: &str = "https://zentracloud.com/api/v3/get_readings";

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
const THROTTLED: u16 = 429;
/// Wait used when the lockout message cannot be read.
const DEFAULT_LOCKOUT_SECONDS: u64 = 60;
/// Zentra is polled on a 14 minute window so consecutive runs do not overlap.
const WINDOW_MINUTES: i64 = 14;

static LOCKOUT_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Lock out expires in (\d+) seconds").expect("lockout pattern is valid")
});

/// Sensor series joined into one reading per timestamp.
const SENSOR_FIELDS: [(&str, &str); 3] = [
    ("Air Temperature", "atemp"),
    ("Precipitation", "pcpn"),
    ("Relative Humidity", "relh"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZentraConfig {
    /// Device serial number.
    pub sn: String,
    pub token: String,
}

impl VendorFields for ZentraConfig {
    const STATION_TYPE: StationType = StationType::Zentra;

    fn validate(&self) -> Result<(), ConfigError> {
        require("sn", &self.sn)?;
        require("token", &self.token)
    }
}

/// Sleep before retrying a throttled request: the advertised lockout plus one second.
pub fn lockout_delay(body: &str) -> Duration {
    let seconds = LOCKOUT_MESSAGE
        .captures(body)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(DEFAULT_LOCKOUT_SECONDS);
    Duration::from_secs(seconds + 1)
}

pub struct ZentraStation {
    config: StationConfig<ZentraConfig>,
    client: HttpClient,
    base_url: String,
    max_retries: u32,
}

impl ZentraStation {
    pub fn new(config: StationConfig<ZentraConfig>, max_retries: u32) -> Self {
        Self {
            config,
            client: HttpClient::new(),
            base_url: ZENTRA_URL.to_string(),
            max_retries,
        }
    }

    pub fn from_value(value: Value, max_retries: u32) -> Result<Self, ConfigError> {
        Ok(Self::new(StationConfig::from_value(value)?, max_retries))
    }

    pub fn config(&self) -> &StationConfig<ZentraConfig> {
        &self.config
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request(&self, interval: &UtcInterval) -> Result<WeatherAPIResponse, StationError> {
        let vendor = &self.config.vendor;
        let tz = self.timezone();
        let request = self
            .client
            .get(self.base_url.as_str())
            .header("Authorization", format!("Token {}", vendor.token))
            .query(&[
                ("device_sn", vendor.sn.clone()),
                ("start_date", format_local(interval.start(), tz, LOCAL_TIME_FORMAT)),
                ("end_date", format_local(interval.end(), tz, LOCAL_TIME_FORMAT)),
            ]);
        self.client.send(request).await
    }
}

#[async_trait]
impl WeatherStation for ZentraStation {
    fn base(&self) -> &BaseConfig {
        &self.config.base
    }

    fn station_type(&self) -> StationType {
        StationType::Zentra
    }

    fn window_minutes(&self) -> i64 {
        WINDOW_MINUTES
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        let mut retries = 0;
        loop {
            let response = self.request(interval).await?;
            if response.status_code != THROTTLED {
                ensure_success(&response)?;
                return Ok(vec![response]);
            }
            if retries >= self.max_retries {
                return Err(StationError::RetriesExhausted {
                    station_id: self.id().to_string(),
                    retries: self.max_retries,
                });
            }
            retries += 1;
            let delay = lockout_delay(&response.text);
            tracing::warn!(
                station_id = %self.id(),
                attempt = retries,
                delay_secs = delay.as_secs(),
                "Zentra throttled the request, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError> {
        let body = parse_body(text)?;
        let Some(data) = body.get("data") else {
            tracing::debug!(station_id = %self.id(), "no data element in Zentra response");
            return Ok(Vec::new());
        };

        let mut by_time: BTreeMap<DateTime<Utc>, SensorReading> = BTreeMap::new();
        for (sensor, field) in SENSOR_FIELDS {
            let Some(series) = data.get(sensor) else {
                continue;
            };
            let readings = series
                .get(0)
                .and_then(|s| s.get("readings"))
                .and_then(Value::as_array)
                .ok_or_else(|| ParseError::unexpected(format!("'{sensor}' has no readings list")))?;
            for reading in readings {
                let timestamp = reading
                    .get("timestamp_utc")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| ParseError::missing_field("timestamp_utc"))?;
                let data_datetime = utc_from_unix_seconds(timestamp)?;
                let value = optional_f64(reading.get("value"))?;
                by_time
                    .entry(data_datetime)
                    .or_insert_with(|| SensorReading::at(data_datetime))
                    .set_field(field, value);
            }
        }
        Ok(by_time.into_values().collect())
    }
}
