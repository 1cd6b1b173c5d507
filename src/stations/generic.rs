//! Placeholder station used for development and dry runs; never calls out.

use crate::error::{ConfigError, ParseError, StationError};
use crate::model::{SensorReading, StationType, WeatherAPIResponse};
use crate::stations::config::{BaseConfig, StationConfig, VendorFields};
use crate::stations::station::WeatherStation;
use crate::time_intervals::UtcInterval;
use async_trait::async_trait;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned in place of a vendor response.
const EMPTY_BODY: &str = "{}";

/// Free-form fields kept as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericConfig {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VendorFields for GenericConfig {
    const STATION_TYPE: StationType = StationType::Generic;
}

pub struct GenericStation {
    config: StationConfig<GenericConfig>,
}

impl GenericStation {
    pub fn new(config: StationConfig<GenericConfig>) -> Self {
        Self { config }
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(Self::new(StationConfig::from_value(value)?))
    }

    pub fn config(&self) -> &StationConfig<GenericConfig> {
        &self.config
    }
}

#[async_trait]
impl WeatherStation for GenericStation {
    fn base(&self) -> &BaseConfig {
        &self.config.base
    }

    fn station_type(&self) -> StationType {
        StationType::Generic
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        tracing::info!(
            station_id = %self.id(),
            interval = %interval,
            "generic station, returning empty response"
        );
        Ok(vec![WeatherAPIResponse::synthetic(
            format!("generic://{}", self.id()),
            EMPTY_BODY,
        )])
    }

    fn parse_response(&self, _text: &str) -> Result<Vec<SensorReading>, ParseError> {
        Ok(Vec::new())
    }
}
