//! Station table ingestion.
//!
//! Rows hold `station_id, station_type, install_date, tz, station_config`,
//! optionally preceded by an `id` column. `station_config` is a JSON object,
//! quoted with `'` when it contains commas. The header row is optional.

use crate::error::IngestError;
use crate::model::StationType;
use crate::stations::{StationFactory, StationRecord, WeatherStation};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const STATION_COLUMNS: [&str; 5] = [
    "station_id",
    "station_type",
    "install_date",
    "tz",
    "station_config",
];

/// Layout decided from the first line of the file.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    has_header: bool,
    has_id: bool,
}

fn sniff_layout(first_line: &str, first_row: &[&str]) -> Layout {
    if first_line.contains('{') {
        // data row; an id column shifts the JSON object one place right
        let config_index = first_row
            .iter()
            .position(|field| field.trim_start().starts_with('{'));
        return Layout {
            has_header: false,
            has_id: config_index == Some(STATION_COLUMNS.len()),
        };
    }
    let lower = first_line.trim_start().to_lowercase();
    Layout {
        has_header: true,
        has_id: lower.starts_with("id,"),
    }
}

/// Reads every row of a station file into typed records.
///
/// An empty file yields no records. Malformed JSON in `station_config`
/// names the offending row; a file that is not a station table at all is
/// reported as [`IngestError::NotCsv`].
pub fn read_station_records(path: impl AsRef<Path>) -> Result<Vec<StationRecord>, IngestError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| IngestError::io(path, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| IngestError::NotCsv(format!("{} is not UTF-8 text", path.display())))?;

    let Some(first_line) = text.lines().find(|line| !line.trim().is_empty()) else {
        tracing::warn!(path = %path.display(), "station file is empty");
        return Ok(Vec::new());
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .quote(b'\'')
        .flexible(true)
        .from_reader(text.as_bytes());

    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| IngestError::NotCsv(format!("{}: {e}", path.display())))?;
    let rows: Vec<csv::StringRecord> = rows
        .into_iter()
        .filter(|row| row.iter().any(|field| !field.trim().is_empty()))
        .collect();

    let first_row: Vec<&str> = rows.first().map(|r| r.iter().collect()).unwrap_or_default();
    let layout = sniff_layout(first_line, &first_row);
    let offset = usize::from(layout.has_id);
    let skip = usize::from(layout.has_header);

    let mut records = Vec::with_capacity(rows.len().saturating_sub(skip));
    for (index, row) in rows.iter().enumerate().skip(skip) {
        let line = index + 1;
        let fields: Vec<&str> = row.iter().collect();
        if fields.len() < offset + STATION_COLUMNS.len() {
            return Err(IngestError::NotCsv(format!(
                "{} row {line}: expected columns {}, found {} fields",
                path.display(),
                STATION_COLUMNS.join(","),
                fields.len()
            )));
        }
        let columns: Vec<&str> = fields[offset..offset + 4].iter().map(|f| f.trim()).collect();
        // an unquoted JSON object is split on its commas; rejoin the untrimmed tail
        let station_config = fields[offset + 4..].join(",");
        let config: Value =
            serde_json::from_str(station_config.trim()).map_err(|e| IngestError::InvalidJson {
                row: line,
                message: e.to_string(),
            })?;
        let record =
            StationRecord::from_columns(columns[0], columns[1], columns[2], columns[3], config)
                .map_err(|source| IngestError::Config { row: line, source })?;
        records.push(record);
    }
    tracing::debug!(path = %path.display(), count = records.len(), "read station file");
    Ok(records)
}

/// Builds adapters for every usable row; rows that fail are logged and skipped.
pub fn stations_from_file(
    path: impl AsRef<Path>,
    factory: &StationFactory,
) -> Result<Vec<Box<dyn WeatherStation>>, IngestError> {
    let mut stations = Vec::new();
    for record in read_station_records(path)? {
        let station_id = record.station_id().to_string();
        match factory.from_record(record) {
            Ok(station) => stations.push(station),
            Err(err) => {
                tracing::error!(station_id = %station_id, error = %err, "skipping station");
            }
        }
    }
    Ok(stations)
}

pub fn stations_of_type(
    stations: Vec<Box<dyn WeatherStation>>,
    station_type: StationType,
) -> Vec<Box<dyn WeatherStation>> {
    stations
        .into_iter()
        .filter(|s| s.station_type() == station_type)
        .collect()
}

pub fn records_of_type(records: &[StationRecord], station_type: StationType) -> Vec<&StationRecord> {
    records
        .iter()
        .filter(|r| r.station_type() == station_type)
        .collect()
}
