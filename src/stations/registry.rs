//! Builds adapters from a station type and its configuration.

use crate::error::ConfigError;
use crate::model::StationType;
use crate::stations::config::{StationConfig, StationRecord, VendorConfig};
use crate::stations::davis::DavisStation;
use crate::stations::generic::GenericStation;
use crate::stations::locomos::LocomosStation;
use crate::stations::onset::OnsetStation;
use crate::stations::rainwise::RainwiseStation;
use crate::stations::spectrum::SpectrumStation;
use crate::stations::station::WeatherStation;
use crate::stations::zentra::ZentraStation;
use serde_json::Value;

/// Retries allowed on a throttled Zentra request unless configured otherwise.
pub const DEFAULT_ZENTRA_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct StationFactory {
    zentra_max_retries: u32,
}

impl Default for StationFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StationFactory {
    pub fn new() -> Self {
        Self {
            zentra_max_retries: DEFAULT_ZENTRA_MAX_RETRIES,
        }
    }

    pub fn with_zentra_max_retries(mut self, retries: u32) -> Self {
        self.zentra_max_retries = retries;
        self
    }

    pub fn zentra_max_retries(&self) -> u32 {
        self.zentra_max_retries
    }

    /// Validates `config` against the schema of `station_type` and builds its adapter.
    pub fn create(
        &self,
        station_type: StationType,
        config: Value,
    ) -> Result<Box<dyn WeatherStation>, ConfigError> {
        let station: Box<dyn WeatherStation> = match station_type {
            StationType::Zentra => {
                Box::new(ZentraStation::from_value(config, self.zentra_max_retries)?)
            }
            StationType::Onset => Box::new(OnsetStation::from_value(config)?),
            StationType::Davis => Box::new(DavisStation::from_value(config)?),
            StationType::Rainwise => Box::new(RainwiseStation::from_value(config)?),
            StationType::Spectrum => Box::new(SpectrumStation::from_value(config)?),
            StationType::Locomos => Box::new(LocomosStation::from_value(config)?),
            StationType::Generic => Box::new(GenericStation::from_value(config)?),
        };
        tracing::debug!(station_id = %station.id(), station_type = %station_type, "station created");
        Ok(station)
    }

    /// Same as [`StationFactory::create`] with the type given by name.
    pub fn create_from_str(
        &self,
        station_type: &str,
        config: Value,
    ) -> Result<Box<dyn WeatherStation>, ConfigError> {
        self.create(station_type.parse()?, config)
    }

    /// Builds the adapter for an already typed record.
    pub fn from_record(&self, record: StationRecord) -> Result<Box<dyn WeatherStation>, ConfigError> {
        let base = record.base;
        let station: Box<dyn WeatherStation> = match record.vendor {
            VendorConfig::Zentra(v) => Box::new(ZentraStation::new(
                StationConfig::new(base, v)?,
                self.zentra_max_retries,
            )),
            VendorConfig::Onset(v) => Box::new(OnsetStation::new(StationConfig::new(base, v)?)),
            VendorConfig::Davis(v) => Box::new(DavisStation::new(StationConfig::new(base, v)?)),
            VendorConfig::Rainwise(v) => {
                Box::new(RainwiseStation::new(StationConfig::new(base, v)?))
            }
            VendorConfig::Spectrum(v) => {
                Box::new(SpectrumStation::new(StationConfig::new(base, v)?))
            }
            VendorConfig::Locomos(v) => {
                Box::new(LocomosStation::new(StationConfig::new(base, v)?))
            }
            VendorConfig::Generic(v) => Box::new(GenericStation::new(StationConfig::new(base, v)?)),
        };
        Ok(station)
    }
}
