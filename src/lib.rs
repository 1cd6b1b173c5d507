//! Personal weather station collector.
//!
//! Pulls observations from vendor cloud APIs (Davis WeatherLink, Onset
//! HOBOlink, Rainwise, Spectrum SpecConnect, Zentra Cloud and Locomos
//! stations on Ubidots), normalizes them into one reading schema and
//! archives both the raw responses and the readings.

pub mod collector;
pub mod config;
pub mod error;
pub mod model;
pub mod station_file;
pub mod stations;
pub mod store;
pub mod time_intervals;

#[cfg(test)]
mod test_utils;

pub use collector::{CollectionReport, WeatherCollector};
pub use error::{Error, Result};
pub use stations::{StationFactory, WeatherStation};
pub use store::{FileStore, ReadingStore};
pub use time_intervals::UtcInterval;
