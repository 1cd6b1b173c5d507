//! PWS collector
//!
//! Collects one window of observations from every station listed in the
//! station file and writes raw archives and reading CSVs under the output
//! directory.
//!
//! # Environment
//!
//! - `LOG_LEVEL`: tracing level, default `info`
//! - `PWS_STATIONS_FILE`: station table (required)
//! - `PWS_OUTPUT_DIR`: output root, default `../weatherdata`
//! - `PWS_ZENTRA_MAX_RETRIES`: throttle retries for Zentra, default 3
//! - `PWS_START` / `PWS_END`: RFC 3339 window bounds; each station's previous
//!   period is used when both are absent

use pws_collector::config::{self, CollectorConfig};
use pws_collector::{CollectionReport, FileStore, WeatherCollector};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let app_config = config::load_app_config().expect("Failed to load AppConfig");
    tracing_subscriber::fmt()
        .with_max_level(app_config.log_level())
        .init();

    let collector_config =
        config::load_collector_config().expect("Failed to load CollectorConfig");

    let report = run(&collector_config).await;
    log_report(&report);
}

/// Loads the stations and collects one window; station failures stay in the report.
async fn run(config: &CollectorConfig) -> CollectionReport {
    let store = Arc::new(FileStore::new(&config.output_dir));
    let collector = match WeatherCollector::from_station_file(
        &config.stations_file,
        &config.station_factory(),
        store,
    ) {
        Ok(collector) => collector,
        Err(e) => {
            tracing::error!("Failed to load stations: {}", e);
            return CollectionReport::default();
        }
    };
    tracing::info!(
        "Collecting {} stations into {}",
        collector.stations().len(),
        config.output_dir.display()
    );
    collector
        .collect_all_stations_between(config.start, config.end)
        .await
}

fn log_report(report: &CollectionReport) {
    tracing::info!(
        "Saved {} stations ({} readings), {} failed",
        report.saved.len(),
        report.reading_count(),
        report.failures.len()
    );
    for failure in &report.failures {
        match &failure.raw_path {
            Some(path) => tracing::warn!(
                "Station {} failed: {} (responses kept at {})",
                failure.station_id,
                failure.error,
                path.display()
            ),
            None => tracing::warn!("Station {} failed: {}", failure.station_id, failure.error),
        }
    }
}
