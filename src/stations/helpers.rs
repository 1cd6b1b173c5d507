//! Unit conversions and timestamp handling shared by the vendor adapters.

use crate::error::ParseError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn fahrenheit_to_celsius(value: f64) -> f64 {
    round2((value - 32.0) * 5.0 / 9.0)
}

pub fn inches_to_mm(value: f64) -> f64 {
    round2(value * 25.4)
}

/// Reads a JSON number, or a string holding one.
pub fn value_as_f64(value: &Value) -> Result<f64, ParseError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ParseError::number_parse(n.to_string(), "not representable as f64")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| ParseError::number_parse(s.as_str(), e)),
        other => Err(ParseError::number_parse(other.to_string(), "not a number")),
    }
}

/// Like [`value_as_f64`] but maps JSON `null` to `None`.
pub fn optional_f64(value: Option<&Value>) -> Result<Option<f64>, ParseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => value_as_f64(v).map(Some),
    }
}

/// Parses a vendor timestamp into UTC.
///
/// Timestamps carrying an offset are converted as-is. Naive timestamps are
/// taken to be station-local time in `tz`.
pub fn dt_utc_from_str(text: &str, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| ParseError::datetime_parse(text, "unrecognized timestamp format"))?;
    local_to_utc(naive, tz)
        .ok_or_else(|| ParseError::datetime_parse(text, format!("does not exist in {}", tz.name())))
}

/// Resolves a station-local wall clock time, taking the earlier instant when
/// a DST fold makes it ambiguous.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn utc_from_unix_seconds(seconds: i64) -> Result<DateTime<Utc>, ParseError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| ParseError::datetime_parse(seconds.to_string(), "timestamp out of range"))
}

pub fn utc_from_unix_millis(millis: i64) -> Result<DateTime<Utc>, ParseError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| ParseError::datetime_parse(millis.to_string(), "timestamp out of range"))
}

/// Formats a UTC instant as wall clock time in the station zone.
pub fn format_local(dt: DateTime<Utc>, tz: Tz, fmt: &str) -> String {
    dt.with_timezone(&tz).format(fmt).to_string()
}

/// Parses a response body as a JSON object, treating an empty body as `{}`.
pub fn parse_body(text: &str) -> Result<Value, ParseError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(text)?)
}
