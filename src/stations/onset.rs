//! Onset HOBOlink web services.

use crate::error::{ConfigError, ParseError, StationError};
use crate::model::{SensorReading, StationType, WeatherAPIResponse, READING_FIELDS};
use crate::stations::client::{ensure_success, HttpClient};
use crate::stations::config::{require, BaseConfig, StationConfig, VendorFields};
use crate::stations::helpers::{optional_f64, parse_body};
use crate::stations::station::WeatherStation;
use crate::time_intervals::UtcInterval;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub const ONSET_URL: &str = "https://webservice.hobolink.com/ws";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnsetConfig {
    /// Logger serial number.
    pub sn: String,
    pub client_id: String,
    pub client_secret: String,
    pub ret_form: String,
    /// Account id from the HOBOlink URL.
    pub user_id: String,
    /// Sensor serial numbers keyed by canonical field, e.g. `{"atemp": "21079936-1"}`.
    pub sensor_sn: BTreeMap<String, String>,
}

impl VendorFields for OnsetConfig {
    const STATION_TYPE: StationType = StationType::Onset;

    fn validate(&self) -> Result<(), ConfigError> {
        require("sn", &self.sn)?;
        require("client_id", &self.client_id)?;
        require("client_secret", &self.client_secret)?;
        require("user_id", &self.user_id)?;
        if self.sensor_sn.is_empty() {
            return Err(ConfigError::invalid("sensor_sn", "must map at least one sensor"));
        }
        if let Some(field) = self
            .sensor_sn
            .keys()
            .find(|field| !READING_FIELDS.contains(&field.as_str()))
        {
            return Err(ConfigError::invalid(
                "sensor_sn",
                format!("'{field}' is not a reading field"),
            ));
        }
        Ok(())
    }
}

pub struct OnsetStation {
    config: StationConfig<OnsetConfig>,
    client: HttpClient,
    base_url: String,
    access_token: Mutex<Option<String>>,
}

impl OnsetStation {
    pub fn new(config: StationConfig<OnsetConfig>) -> Self {
        Self {
            config,
            client: HttpClient::new(),
            base_url: ONSET_URL.to_string(),
            access_token: Mutex::new(None),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(Self::new(StationConfig::from_value(value)?))
    }

    pub fn config(&self) -> &StationConfig<OnsetConfig> {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Last token obtained by [`OnsetStation::get_auth`].
    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Exchanges client credentials for a fresh bearer token.
    pub async fn get_auth(&self) -> Result<String, StationError> {
        let vendor = &self.config.vendor;
        let request = self
            .client
            .post(format!("{}/auth/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", vendor.client_id.as_str()),
                ("client_secret", vendor.client_secret.as_str()),
            ]);
        let response = self.client.send(request).await?;
        if response.status_code != 200 {
            return Err(StationError::auth(
                self.id(),
                format!(
                    "token request failed with status {}: {}",
                    response.status_code, response.text
                ),
            ));
        }
        let body: Value = serde_json::from_str(&response.text).map_err(ParseError::from)?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::missing_field("access_token"))?
            .to_string();

        *self
            .access_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.clone());
        Ok(token)
    }

    fn field_for_sensor(&self) -> HashMap<&str, &str> {
        self.config
            .vendor
            .sensor_sn
            .iter()
            .map(|(field, sn)| (sn.as_str(), field.as_str()))
            .collect()
    }
}

/// Observation timestamps end in `Z`; the rest is a plain UTC wall clock.
fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = text.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| ParseError::datetime_parse(text, e))
}

#[async_trait]
impl WeatherStation for OnsetStation {
    fn base(&self) -> &BaseConfig {
        &self.config.base
    }

    fn station_type(&self) -> StationType {
        StationType::Onset
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        // token is requested right before use so it cannot expire in between
        let token = self.get_auth().await?;
        let vendor = &self.config.vendor;
        let request = self
            .client
            .get(format!(
                "{}/data/file/{}/user/{}",
                self.base_url, vendor.ret_form, vendor.user_id
            ))
            .bearer_auth(token)
            .query(&[
                ("loggers", vendor.sn.clone()),
                ("start_date_time", interval.start().format(TIME_FORMAT).to_string()),
                ("end_date_time", interval.end().format(TIME_FORMAT).to_string()),
            ]);
        let response = self.client.send(request).await?;
        ensure_success(&response)?;
        Ok(vec![response])
    }

    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError> {
        let body = parse_body(text)?;
        let Some(observations) = body.get("observation_list") else {
            return Ok(Vec::new());
        };
        let observations = observations
            .as_array()
            .ok_or_else(|| ParseError::unexpected("'observation_list' is not an array"))?;

        let fields = self.field_for_sensor();
        let mut by_time: BTreeMap<DateTime<Utc>, SensorReading> = BTreeMap::new();
        for observation in observations {
            let sensor_sn = observation
                .get("sensor_sn")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::missing_field("sensor_sn"))?;
            let Some(field) = fields.get(sensor_sn) else {
                continue;
            };
            let timestamp = observation
                .get("timestamp")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::missing_field("timestamp"))?;
            let data_datetime = parse_timestamp(timestamp)?;
            let value = optional_f64(observation.get("si_value"))?;
            by_time
                .entry(data_datetime)
                .or_insert_with(|| SensorReading::at(data_datetime))
                .set_field(field, value);
        }
        Ok(by_time.into_values().collect())
    }
}
