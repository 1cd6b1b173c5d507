//! Drives every configured station through fetch, transform and save.

use crate::error::{CollectorError, IngestError, StorageError};
use crate::model::{ReadingRow, WeatherAPIData, WeatherAPIRecord, WeatherStationReadings};
use crate::station_file::stations_from_file;
use crate::stations::{StationFactory, WeatherStation};
use crate::store::ReadingStore;
use crate::time_intervals::UtcInterval;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where one station's outputs were written.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedOutput {
    pub station_id: String,
    pub raw_path: PathBuf,
    /// `None` when the window held no readings.
    pub readings_path: Option<PathBuf>,
    pub reading_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationFailure {
    pub station_id: String,
    pub error: String,
    /// Archive of the responses a rejected fetch still captured.
    pub raw_path: Option<PathBuf>,
}

impl StationFailure {
    fn new(station_id: &str, error: &CollectorError) -> Self {
        tracing::error!(station_id = %station_id, error = %error, "station collection failed");
        Self {
            station_id: station_id.to_string(),
            error: error.to_string(),
            raw_path: None,
        }
    }

    fn with_raw_path(mut self, raw_path: Option<PathBuf>) -> Self {
        self.raw_path = raw_path;
        self
    }
}

/// Outcome of a batch run; failed stations never abort the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionReport {
    pub saved: Vec<SavedOutput>,
    pub failures: Vec<StationFailure>,
}

impl CollectionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn reading_count(&self) -> usize {
        self.saved.iter().map(|s| s.reading_count).sum()
    }
}

/// Batch results kept in memory instead of written to a store.
#[derive(Debug, Clone, Default)]
pub struct CollectedReadings {
    pub records: Vec<WeatherAPIRecord>,
    pub rows: Vec<ReadingRow>,
    pub failures: Vec<StationFailure>,
}

/// Fetches and transforms one station's window.
pub async fn collect(
    station: &dyn WeatherStation,
    interval: &UtcInterval,
) -> Result<(WeatherAPIData, WeatherStationReadings), CollectorError> {
    let station_id = station.id().to_string();
    let api_data = station
        .get_readings_for(interval)
        .await
        .map_err(|source| CollectorError::Station {
            station_id: station_id.clone(),
            source,
        })?;
    let readings = station
        .transform(&api_data)
        .map_err(|source| CollectorError::Transform { station_id, source })?;
    Ok((api_data, readings))
}

pub struct WeatherCollector {
    stations: Vec<Box<dyn WeatherStation>>,
    store: Arc<dyn ReadingStore>,
}

impl WeatherCollector {
    pub fn new(stations: Vec<Box<dyn WeatherStation>>, store: Arc<dyn ReadingStore>) -> Self {
        Self { stations, store }
    }

    /// Loads stations from a station file; unusable rows are skipped.
    pub fn from_station_file(
        path: impl AsRef<Path>,
        factory: &StationFactory,
        store: Arc<dyn ReadingStore>,
    ) -> Result<Self, IngestError> {
        Ok(Self::new(stations_from_file(path, factory)?, store))
    }

    pub fn stations(&self) -> &[Box<dyn WeatherStation>] {
        &self.stations
    }

    /// Collects one station and persists the raw event, then its readings.
    pub async fn collect_and_save(
        &self,
        station: &dyn WeatherStation,
        interval: &UtcInterval,
    ) -> Result<SavedOutput, CollectorError> {
        let (api_data, readings) = collect(station, interval).await?;
        let storage_error = |source: StorageError| CollectorError::Storage {
            station_id: station.id().to_string(),
            source,
        };
        let raw_path = self.store.save_raw(&api_data).await.map_err(storage_error)?;
        let readings_path = self
            .store
            .save_readings(&readings)
            .await
            .map_err(storage_error)?;
        tracing::info!(
            station_id = %station.id(),
            readings = readings.len(),
            "collected station"
        );
        Ok(SavedOutput {
            station_id: station.id().to_string(),
            raw_path,
            readings_path,
            reading_count: readings.len(),
        })
    }

    /// Archives the responses a failed fetch still captured.
    async fn archive_rejected(
        &self,
        station: &dyn WeatherStation,
        interval: &UtcInterval,
        err: &CollectorError,
    ) -> Option<PathBuf> {
        let CollectorError::Station { source, .. } = err else {
            return None;
        };
        if source.responses().is_empty() {
            return None;
        }
        let api_data = WeatherAPIData::new(
            station.id(),
            station.station_type(),
            Utc::now(),
            *interval,
            source.responses().to_vec(),
        );
        match self.store.save_raw(&api_data).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(station_id = %station.id(), error = %e, "failed to archive rejected responses");
                None
            }
        }
    }

    async fn collect_into(
        &self,
        station: &dyn WeatherStation,
        interval: &UtcInterval,
        report: &mut CollectionReport,
    ) {
        match self.collect_and_save(station, interval).await {
            Ok(saved) => report.saved.push(saved),
            Err(err) => {
                let raw_path = self.archive_rejected(station, interval, &err).await;
                report
                    .failures
                    .push(StationFailure::new(station.id(), &err).with_raw_path(raw_path));
            }
        }
    }

    /// Runs every station over the same window, one at a time.
    pub async fn collect_all_stations(&self, interval: &UtcInterval) -> CollectionReport {
        let mut report = CollectionReport::default();
        for station in &self.stations {
            self.collect_into(station.as_ref(), interval, &mut report).await;
        }
        report
    }

    /// Runs every station over its own window resolved from optional bounds.
    ///
    /// With no bounds each station uses the previous period of its cadence.
    pub async fn collect_all_stations_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> CollectionReport {
        let mut report = CollectionReport::default();
        for station in &self.stations {
            match station.resolve_interval(start, end) {
                Ok(interval) => self.collect_into(station.as_ref(), &interval, &mut report).await,
                Err(err) => {
                    let err = CollectorError::Station {
                        station_id: station.id().to_string(),
                        source: err.into(),
                    };
                    report.failures.push(StationFailure::new(station.id(), &err));
                }
            }
        }
        report
    }

    /// Same isolation as [`WeatherCollector::collect_all_stations`], results kept in memory.
    pub async fn collect_readings(&self, interval: &UtcInterval) -> CollectedReadings {
        let mut collected = CollectedReadings::default();
        for station in &self.stations {
            let result = collect(station.as_ref(), interval).await.and_then(|(data, readings)| {
                let record = data.to_record().map_err(|e| CollectorError::Storage {
                    station_id: station.id().to_string(),
                    source: StorageError::serialize("raw api record", e),
                })?;
                Ok((record, readings.to_rows()))
            });
            match result {
                Ok((record, rows)) => {
                    collected.records.push(record);
                    collected.rows.extend(rows);
                }
                Err(err) => collected
                    .failures
                    .push(StationFailure::new(station.id(), &err)),
            }
        }
        collected
    }
}
