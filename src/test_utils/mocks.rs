//! Mock station and in-memory store.

use crate::error::{ConfigError, ParseError, StationError, StorageError};
use crate::model::{
    SensorReading, StationType, TimezoneCode, WeatherAPIData, WeatherAPIResponse,
    WeatherStationReadings,
};
use crate::stations::helpers::{optional_f64, parse_body, utc_from_unix_seconds};
use crate::stations::{BaseConfig, WeatherStation};
use crate::store::ReadingStore;
use crate::time_intervals::{UtcInterval, DEFAULT_WINDOW_MINUTES};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A station that answers from memory, succeeding or failing with a status.
pub struct MockStation {
    base: BaseConfig,
    failure_status: Option<u16>,
    capture_rejected: bool,
    window_minutes: i64,
    call_count: Arc<AtomicUsize>,
}

impl MockStation {
    fn new(station_id: &str, failure_status: Option<u16>) -> Self {
        Self {
            base: BaseConfig {
                station_id: station_id.to_string(),
                install_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap_or_default(),
                tz: TimezoneCode::Eastern,
            },
            failure_status,
            capture_rejected: false,
            window_minutes: DEFAULT_WINDOW_MINUTES,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a station returning one reading per request.
    pub fn new_success(station_id: &str) -> Self {
        Self::new(station_id, None)
    }

    /// Creates a station whose requests fail with `status`.
    pub fn new_failure(station_id: &str, status: u16) -> Self {
        Self::new(station_id, Some(status))
    }

    /// Like `new_failure`, but the error carries the rejected response.
    pub fn new_rejected(station_id: &str, status: u16) -> Self {
        Self {
            capture_rejected: true,
            ..Self::new(station_id, Some(status))
        }
    }

    pub fn with_window_minutes(mut self, minutes: i64) -> Self {
        self.window_minutes = minutes;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherStation for MockStation {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn station_type(&self) -> StationType {
        StationType::Generic
    }

    fn window_minutes(&self) -> i64 {
        self.window_minutes
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.base.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let url = format!("mock://{}", self.base.station_id);
        if let Some(status) = self.failure_status {
            let err = StationError::status(status, url.as_str(), "mock failure");
            if !self.capture_rejected {
                return Err(err);
            }
            let mut response = WeatherAPIResponse::synthetic(url, "mock failure");
            response.status_code = status;
            response.reason = "Rejected".to_string();
            return Err(err.with_responses(vec![response]));
        }
        let body = json!({
            "readings": [
                {"ts": interval.start().timestamp(), "atemp": 20.5, "relh": 48.0}
            ]
        });
        Ok(vec![WeatherAPIResponse::synthetic(url, body.to_string())])
    }

    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError> {
        let body = parse_body(text)?;
        let Some(readings) = body.get("readings").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };
        readings
            .iter()
            .map(|r| {
                let ts = r
                    .get("ts")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| ParseError::missing_field("ts"))?;
                let mut reading = SensorReading::at(utc_from_unix_seconds(ts)?);
                reading.atemp = optional_f64(r.get("atemp"))?;
                reading.relh = optional_f64(r.get("relh"))?;
                Ok(reading)
            })
            .collect()
    }
}

/// Keeps everything saved in memory; `failing()` rejects every write.
#[derive(Default)]
pub struct MemoryStore {
    raw: Mutex<Vec<WeatherAPIData>>,
    readings: Mutex<Vec<WeatherStationReadings>>,
    fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn raw(&self) -> Vec<WeatherAPIData> {
        self.raw.lock().unwrap().clone()
    }

    pub fn raw_count(&self) -> usize {
        self.raw.lock().unwrap().len()
    }

    pub fn row_count(&self) -> usize {
        self.readings.lock().unwrap().iter().map(|r| r.len()).sum()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn save_raw(&self, api_data: &WeatherAPIData) -> Result<PathBuf, StorageError> {
        if self.fail {
            return Err(StorageError::io(
                "memory",
                std::io::Error::new(std::io::ErrorKind::Other, "store unavailable"),
            ));
        }
        self.raw.lock().unwrap().push(api_data.clone());
        Ok(PathBuf::from(format!("memory/raw/{}.json", api_data.key())))
    }

    async fn save_readings(
        &self,
        readings: &WeatherStationReadings,
    ) -> Result<Option<PathBuf>, StorageError> {
        let Some(key) = readings.key() else {
            return Ok(None);
        };
        self.readings.lock().unwrap().push(readings.clone());
        Ok(Some(PathBuf::from(format!("memory/data/{key}.csv"))))
    }
}
