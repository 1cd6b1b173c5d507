//! Rainwise get-historical endpoint.

use crate::error::{ConfigError, ParseError, StationError};
use crate::model::{SensorReading, StationType, WeatherAPIResponse};
use crate::stations::client::{ensure_success, HttpClient};
use crate::stations::config::{require, BaseConfig, StationConfig, VendorFields};
use crate::stations::helpers::{
    dt_utc_from_str, fahrenheit_to_celsius, format_local, inches_to_mm, optional_f64, parse_body,
    round2,
};
use crate::stations::station::WeatherStation;
use crate::time_intervals::UtcInterval;
use async_trait::async_trait;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

pub const RAINWISE_URL: &str = "http://api.rainwise.net/main/v1.5/registered/get-historical.php";

/// Request and response times are station-local wall clock.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Minutes between returned samples.
const SAMPLE_INTERVAL: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainwiseConfig {
    /// Account name; the station MAC is sent when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Site id assigned by Rainwise.
    pub sid: String,
    /// Password id assigned by Rainwise.
    pub pid: String,
    pub mac: String,
    /// `json` or `xml`.
    pub ret_form: String,
}

impl VendorFields for RainwiseConfig {
    const STATION_TYPE: StationType = StationType::Rainwise;

    fn validate(&self) -> Result<(), ConfigError> {
        require("sid", &self.sid)?;
        require("pid", &self.pid)?;
        require("mac", &self.mac)?;
        require("ret_form", &self.ret_form)
    }
}

pub struct RainwiseStation {
    config: StationConfig<RainwiseConfig>,
    client: HttpClient,
    base_url: String,
}

impl RainwiseStation {
    pub fn new(config: StationConfig<RainwiseConfig>) -> Self {
        Self {
            config,
            client: HttpClient::new(),
            base_url: RAINWISE_URL.to_string(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(Self::new(StationConfig::from_value(value)?))
    }

    pub fn config(&self) -> &StationConfig<RainwiseConfig> {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Looks up a sample by its `times` key in an object- or array-shaped column.
fn column_value<'a>(body: &'a Value, column: &str, key: &str) -> Option<&'a Value> {
    match body.get(column)? {
        Value::Object(values) => values.get(key),
        Value::Array(values) => key.parse::<usize>().ok().and_then(|i| values.get(i)),
        _ => None,
    }
}

#[async_trait]
impl WeatherStation for RainwiseStation {
    fn base(&self) -> &BaseConfig {
        &self.config.base
    }

    fn station_type(&self) -> StationType {
        StationType::Rainwise
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        let vendor = &self.config.vendor;
        let username = vendor.username.as_deref().unwrap_or(vendor.mac.as_str());
        let tz = self.timezone();
        let request = self.client.get(self.base_url.as_str()).query(&[
            ("username", username.to_string()),
            ("sid", vendor.sid.clone()),
            ("pid", vendor.pid.clone()),
            ("mac", vendor.mac.clone()),
            ("format", vendor.ret_form.clone()),
            ("interval", SAMPLE_INTERVAL.to_string()),
            ("sdate", format_local(interval.start(), tz, TIME_FORMAT)),
            ("edate", format_local(interval.end(), tz, TIME_FORMAT)),
        ]);
        let response = self.client.send(request).await?;
        ensure_success(&response)?;
        Ok(vec![response])
    }

    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError> {
        let body = parse_body(text)?;
        if body.get("station_id").is_none() {
            return Ok(Vec::new());
        }
        let times: Vec<(String, &Value)> = match body.get("times") {
            Some(Value::Object(times)) => times.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Some(Value::Array(times)) => times
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            Some(_) => return Err(ParseError::unexpected("'times' is not a collection")),
            None => return Err(ParseError::missing_field("times")),
        };

        let tz = self.timezone();
        let mut readings = Vec::with_capacity(times.len());
        for (key, time) in times {
            let time = time
                .as_str()
                .ok_or_else(|| ParseError::unexpected(format!("time '{key}' is not a string")))?;
            let mut reading = SensorReading::at(dt_utc_from_str(time, tz)?);
            reading.atemp = optional_f64(column_value(&body, "temp", &key))?.map(fahrenheit_to_celsius);
            reading.pcpn = optional_f64(column_value(&body, "precip", &key))?.map(inches_to_mm);
            reading.relh = optional_f64(column_value(&body, "hum", &key))?.map(round2);
            readings.push(reading);
        }
        readings.sort_by_key(|r| r.data_datetime);
        Ok(readings)
    }
}
