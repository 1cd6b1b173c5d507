//! Persistence for raw request events and normalized readings.

use crate::error::StorageError;
use crate::model::{WeatherAPIData, WeatherStationReadings};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const RAW_DIR: &str = "raw";
pub const DATA_DIR: &str = "data";

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Archives a request event; returns where it was written.
    async fn save_raw(&self, api_data: &WeatherAPIData) -> Result<PathBuf, StorageError>;

    /// Writes reading rows; an empty set writes nothing and returns `None`.
    async fn save_readings(
        &self,
        readings: &WeatherStationReadings,
    ) -> Result<Option<PathBuf>, StorageError>;
}

/// Stores JSON archives and CSV exports under one base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn raw_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(RAW_DIR).join(format!("{key}.json"))
    }

    pub fn readings_path(&self, key: &str) -> PathBuf {
        self.base_dir
            .join(DATA_DIR)
            .join(format!("weather_data_{key}.csv"))
    }
}

async fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(dir) => fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::io(dir, e)),
        None => Ok(()),
    }
}

/// Serializes rows into an in-memory CSV document with a header line.
fn readings_csv(readings: &WeatherStationReadings) -> Result<Vec<u8>, StorageError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in readings.to_rows() {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| StorageError::serialize("reading rows", e.into_error()))
}

#[async_trait]
impl ReadingStore for FileStore {
    async fn save_raw(&self, api_data: &WeatherAPIData) -> Result<PathBuf, StorageError> {
        let path = self.raw_path(&api_data.key());
        ensure_parent(&path).await?;
        let json = serde_json::to_string(api_data)
            .map_err(|e| StorageError::serialize("raw api data", e))?;
        fs::write(&path, json)
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!(station_id = %api_data.station_id, path = %path.display(), "saved raw response");
        Ok(path)
    }

    async fn save_readings(
        &self,
        readings: &WeatherStationReadings,
    ) -> Result<Option<PathBuf>, StorageError> {
        let Some(key) = readings.key() else {
            return Ok(None);
        };
        let path = self.readings_path(&key);
        let bytes = readings_csv(readings)?;
        ensure_parent(&path).await?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!(rows = readings.len(), path = %path.display(), "saved readings");
        Ok(Some(path))
    }
}
