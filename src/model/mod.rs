//! Model definitions for station types, raw vendor responses and canonical readings.

pub mod api_data;
pub mod reading;
pub mod types;

pub use api_data::{WeatherAPIData, WeatherAPIRecord, WeatherAPIResponse, PACKAGE_VERSION};
pub use reading::{
    ReadingRow, READING_FIELDS, SensorReading, WeatherStationReading, WeatherStationReadings,
};
pub use types::{StationType, TimezoneCode};
