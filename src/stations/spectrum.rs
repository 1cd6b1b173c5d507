//! Spectrum SpecConnect customer API.

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

pub const SPECTRUM_URL: &str =
    "https://api.specconnect.net:6703/api/Customer/GetDataInDateTimeRange";

/// SpecConnect expects station-local wall clock times.
const LOCAL_TIME_FORMAT: &str = "%m-%d-%Y %H:%M";

/// Fixed positions within `SensorData`.
const PRECIP_INDEX: usize = 0;
const TEMP_INDEX: usize = 1;
const HUMIDITY_INDEX: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Station serial number.
    pub sn: String,
    pub apikey: String,
}

impl VendorFields for SpectrumConfig {
    const STATION_TYPE: StationType = StationType::Spectrum;

    fn validate(&self) -> Result<(), ConfigError> {
        require("sn", &self.sn)?;
        require("apikey", &self.apikey)
    }
}

pub struct SpectrumStation {
    config: StationConfig<SpectrumConfig>,
    client: HttpClient,
    base_url: String,
}

impl SpectrumStation {
    pub fn new(config: StationConfig<SpectrumConfig>) -> Self {
        Self {
            config,
            client: HttpClient::new(),
            base_url: SPECTRUM_URL.to_string(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(Self::new(StationConfig::from_value(value)?))
    }

    pub fn config(&self) -> &StationConfig<SpectrumConfig> {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn sensor_value(record: &Value, index: usize) -> Result<Option<f64>, ParseError> {
    optional_f64(
        record
            .get("SensorData")
            .and_then(|data| data.get(index))
            .and_then(|sensor| sensor.get("DecimalValue")),
    )
}

#[async_trait]
impl WeatherStation for SpectrumStation {
    fn base(&self) -> &BaseConfig {
        &self.config.base
    }

    fn station_type(&self) -> StationType {
        StationType::Spectrum
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        let vendor = &self.config.vendor;
        let tz = self.timezone();
        let request = self.client.get(self.base_url.as_str()).query(&[
            ("customerApiKey", vendor.apikey.clone()),
            ("serialNumber", vendor.sn.clone()),
            ("startDate", format_local(interval.start(), tz, LOCAL_TIME_FORMAT)),
            ("endDate", format_local(interval.end(), tz, LOCAL_TIME_FORMAT)),
        ]);
        let response = self.client.send(request).await?;
        ensure_success(&response)?;
        Ok(vec![response])
    }

    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError> {
        let body = parse_body(text)?;
        let Some(records) = body.get("EquipmentRecords") else {
            return Ok(Vec::new());
        };
        let records = records
            .as_array()
            .ok_or_else(|| ParseError::unexpected("'EquipmentRecords' is not an array"))?;

        let tz = self.timezone();
        records
            .iter()
            .map(|record| {
                let timestamp = record
                    .get("TimeStamp")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ParseError::missing_field("TimeStamp"))?;
                let mut reading = SensorReading::at(dt_utc_from_str(timestamp, tz)?);
                reading.pcpn = sensor_value(record, PRECIP_INDEX)?.map(inches_to_mm);
                reading.atemp = sensor_value(record, TEMP_INDEX)?.map(fahrenheit_to_celsius);
                reading.relh = sensor_value(record, HUMIDITY_INDEX)?.map(round2);
                Ok(reading)
            })
            .collect()
    }
}
