//! Vendor adapters and the pieces they share.

pub mod client;
pub mod config;
pub mod davis;
pub mod generic;
pub mod helpers;
pub mod locomos;
pub mod onset;
pub mod rainwise;
pub mod registry;
pub mod spectrum;
pub mod station;
pub mod zentra;

pub use client::HttpClient;
pub use config::{BaseConfig, StationConfig, StationRecord, VendorConfig, VendorFields};
pub use davis::{DavisConfig, DavisStation};
pub use generic::{GenericConfig, GenericStation};
pub use locomos::{LocomosConfig, LocomosStation};
pub use onset::{OnsetConfig, OnsetStation};
pub use rainwise::{RainwiseConfig, RainwiseStation};
pub use registry::{StationFactory, DEFAULT_ZENTRA_MAX_RETRIES};
pub use spectrum::{SpectrumConfig, SpectrumStation};
pub use station::WeatherStation;
pub use zentra::{ZentraConfig, ZentraStation};
