//! Canonical readings produced by every station adapter.

use crate::error::ParseError;
use crate::model::api_data::WeatherAPIData;
use crate::model::types::StationType;
use crate::time_intervals::UtcInterval;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_derive::{Deserialize, Serialize};

/// Sensor values for one timestamp as parsed out of a vendor payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorReading {
    pub data_datetime: DateTime<Utc>,
    /// Air temperature, Celsius.
    pub atemp: Option<f64>,
    /// Precipitation, millimetres.
    pub pcpn: Option<f64>,
    /// Relative humidity, percent.
    pub relh: Option<f64>,
    /// Leaf wetness, 0 or 1.
    pub lws0: Option<f64>,
}

impl SensorReading {
    pub fn at(data_datetime: DateTime<Utc>) -> Self {
        Self {
            data_datetime,
            ..Default::default()
        }
    }

    /// Sets a canonical field by name; returns false for unknown names.
    pub fn set_field(&mut self, field: &str, value: Option<f64>) -> bool {
        match field {
            "atemp" => self.atemp = value,
            "pcpn" => self.pcpn = value,
            "relh" => self.relh = value,
            "lws0" => self.lws0 = value,
            _ => return false,
        }
        true
    }
}

/// Names of the canonical sensor fields.
pub const READING_FIELDS: [&str; 4] = ["atemp", "pcpn", "relh", "lws0"];

/// One normalized observation with the metadata of the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherStationReading {
    pub station_id: String,
    pub station_type: StationType,
    pub request_id: String,
    #[serde(with = "strict_utc")]
    pub request_datetime: DateTime<Utc>,
    pub time_interval: UtcInterval,
    #[serde(with = "strict_utc")]
    pub data_datetime: DateTime<Utc>,
    pub atemp: Option<f64>,
    pub pcpn: Option<f64>,
    pub relh: Option<f64>,
    pub lws0: Option<f64>,
}

impl WeatherStationReading {
    /// Attaches request metadata to parsed sensor values.
    pub fn from_sensor_reading(
        reading: SensorReading,
        api_data: &WeatherAPIData,
    ) -> Result<Self, ParseError> {
        let reading = Self {
            station_id: api_data.station_id.clone(),
            station_type: api_data.station_type,
            request_id: api_data.request_id.clone(),
            request_datetime: api_data.request_datetime,
            time_interval: api_data.time_interval,
            data_datetime: reading.data_datetime,
            atemp: reading.atemp,
            pcpn: reading.pcpn,
            relh: reading.relh,
            lws0: reading.lws0,
        };
        reading.validate()?;
        Ok(reading)
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        for (name, value) in [
            ("atemp", self.atemp),
            ("pcpn", self.pcpn),
            ("relh", self.relh),
            ("lws0", self.lws0),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ParseError::Validation(format!("{name} is not a finite number")));
                }
            }
        }
        if let Some(pcpn) = self.pcpn {
            if pcpn < 0.0 {
                return Err(ParseError::Validation(format!(
                    "pcpn must not be negative, got {pcpn}"
                )));
            }
        }
        Ok(())
    }
}

/// Readings for one request event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherStationReadings {
    pub readings: Vec<WeatherStationReading>,
}

/// Tabular export row handed to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRow {
    pub station_id: String,
    pub station_type: String,
    pub request_id: String,
    pub request_datetime: String,
    pub data_datetime: String,
    pub atemp: Option<f64>,
    pub pcpn: Option<f64>,
    pub relh: Option<f64>,
    pub lws0: Option<f64>,
}

impl WeatherStationReadings {
    pub fn from_sensor_readings(
        readings: Vec<SensorReading>,
        api_data: &WeatherAPIData,
    ) -> Result<Self, ParseError> {
        let readings = readings
            .into_iter()
            .map(|r| WeatherStationReading::from_sensor_reading(r, api_data))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { readings })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Key derived from the first reading; `None` for an empty set.
    pub fn key(&self) -> Option<String> {
        self.readings.first().map(|r| {
            format!(
                "{}_{}_{}",
                r.station_id,
                r.time_interval.start().timestamp(),
                r.request_id
            )
        })
    }

    pub fn to_rows(&self) -> Vec<ReadingRow> {
        self.readings
            .iter()
            .map(|r| ReadingRow {
                station_id: r.station_id.clone(),
                station_type: r.station_type.to_string(),
                request_id: r.request_id.clone(),
                request_datetime: r.request_datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
                data_datetime: r.data_datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
                atemp: r.atemp,
                pcpn: r.pcpn,
                relh: r.relh,
                lws0: r.lws0,
            })
            .collect()
    }
}

/// Datetimes that must carry an explicit zero UTC offset.
mod strict_utc {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let parsed = DateTime::parse_from_rfc3339(&text).map_err(|_| {
            serde::de::Error::custom(format!(
                "datetime '{text}' must have a timezone and must be UTC"
            ))
        })?;
        if parsed.offset().local_minus_utc() != 0 {
            return Err(serde::de::Error::custom(format!(
                "datetime '{text}' must be UTC"
            )));
        }
        Ok(parsed.with_timezone(&Utc))
    }
}
