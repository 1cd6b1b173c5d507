use crate::error::{ConfigError, IntervalError, ParseError, StationError};
use crate::model::{
    SensorReading, StationType, WeatherAPIData, WeatherAPIResponse, WeatherStationReadings,
};
use crate::stations::config::BaseConfig;
use crate::time_intervals::{UtcInterval, DEFAULT_WINDOW_MINUTES};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Contract shared by every vendor adapter.
///
/// Implementors supply the vendor-specific pieces (`fetch_raw` and
/// `parse_response`); window resolution, request event packaging and
/// transformation into canonical readings are provided here.
#[async_trait]
pub trait WeatherStation: Send + Sync {
    fn base(&self) -> &BaseConfig;

    fn station_type(&self) -> StationType;

    fn id(&self) -> &str {
        &self.base().station_id
    }

    fn timezone(&self) -> Tz {
        self.base().timezone()
    }

    /// Default cadence used when the caller omits a window bound.
    fn window_minutes(&self) -> i64 {
        DEFAULT_WINDOW_MINUTES
    }

    fn check_config(&self) -> Result<(), ConfigError>;

    /// Issues the vendor HTTP request(s) covering `interval`.
    async fn fetch_raw(&self, interval: &UtcInterval)
        -> Result<Vec<WeatherAPIResponse>, StationError>;

    /// Extracts sensor readings from one response body.
    ///
    /// A well-formed body without the vendor's data key yields an empty list.
    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError>;

    /// Resolves optional bounds into a concrete window.
    ///
    /// One bound plus the default span, or the previous default-cadence
    /// period when both are absent.
    fn resolve_interval(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<UtcInterval, IntervalError> {
        let minutes = self.window_minutes();
        match (start, end) {
            (Some(start), Some(end)) => UtcInterval::new(start, end),
            (None, Some(end)) => Ok(UtcInterval::ending_at(end, minutes)),
            (Some(start), None) => Ok(UtcInterval::starting_at(start, minutes)),
            (None, None) => Ok(UtcInterval::previous_interval(Utc::now(), minutes)),
        }
    }

    async fn get_readings(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<WeatherAPIData, StationError> {
        let interval = self.resolve_interval(start, end)?;
        self.get_readings_for(&interval).await
    }

    async fn get_readings_for(&self, interval: &UtcInterval) -> Result<WeatherAPIData, StationError> {
        let request_datetime = Utc::now();
        tracing::debug!(
            station_id = %self.id(),
            station_type = %self.station_type(),
            interval = %interval,
            "requesting readings"
        );
        let responses = match self.fetch_raw(interval).await {
            Ok(responses) => responses,
            Err(err) => {
                tracing::error!(
                    station_id = %self.id(),
                    error = %err,
                    "error getting readings from station"
                );
                return Err(err);
            }
        };
        Ok(WeatherAPIData::new(
            self.id(),
            self.station_type(),
            request_datetime,
            *interval,
            responses,
        ))
    }

    /// Converts every successful response of a request event into readings.
    fn transform(&self, api_data: &WeatherAPIData) -> Result<WeatherStationReadings, ParseError> {
        let mut sensor_readings = Vec::new();
        for response in &api_data.responses {
            if !response.is_success() {
                tracing::warn!(
                    station_id = %api_data.station_id,
                    status = response.status_code,
                    url = %response.url,
                    "skipping unsuccessful response"
                );
                continue;
            }
            sensor_readings.extend(self.parse_response(&response.text)?);
        }
        WeatherStationReadings::from_sensor_readings(sensor_readings, api_data)
    }

    /// Probes the vendor with the default window; never fails.
    async fn get_test_reading(&self) -> bool {
        match self.get_readings(None, None).await {
            Ok(data) if !data.responses.is_empty() => true,
            Ok(_) => {
                tracing::warn!(station_id = %self.id(), "empty response when testing station api");
                false
            }
            Err(err) => {
                tracing::warn!(
                    station_id = %self.id(),
                    error = %err,
                    "error when testing station api"
                );
                false
            }
        }
    }
}
