//! Locomos stations published through Ubidots.

use crate::error::{ConfigError, ParseError, StationError};
use crate::model::{SensorReading, StationType, WeatherAPIResponse};
use crate::stations::client::{ensure_success, HttpClient};
use crate::stations::config::{require, BaseConfig, StationConfig, VendorFields};
use crate::stations::helpers::{optional_f64, parse_body, utc_from_unix_millis};
use crate::stations::station::WeatherStation;
use crate::time_intervals::UtcInterval;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_derive::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{LazyLock, Mutex};

pub const UBIDOTS_URL: &str = "https://industrial.api.ubidots.com/api";

/// Ubidots variable labels and the reading field each one feeds.
pub const LABEL_MAP: [(&str, &str); 3] = [("rh", "relh"), ("temp", "atemp"), ("prep", "pcpn")];

const SERIES_COLUMNS: [&str; 6] = [
    "timestamp",
    "device.name",
    "device.label",
    "variable.id",
    "variable.name",
    "value.value",
];

/// Column names carrying a variable id prefix, e.g. `649ded97c607.value.value`.
static ID_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-z]+\.[a-z\.]+$").expect("column pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomosConfig {
    /// Device token.
    pub token: String,
    /// Ubidots device id.
    pub id: String,
}

impl VendorFields for LocomosConfig {
    const STATION_TYPE: StationType = StationType::Locomos;

    fn validate(&self) -> Result<(), ConfigError> {
        require("token", &self.token)?;
        require("id", &self.id)
    }
}

fn field_for_label(label: &str) -> Option<&'static str> {
    LABEL_MAP
        .iter()
        .find(|(vendor, _)| *vendor == label)
        .map(|(_, field)| *field)
}

pub struct LocomosStation {
    config: StationConfig<LocomosConfig>,
    client: HttpClient,
    base_url: String,
    /// Variable id to label, loaded once per instance.
    variables: Mutex<BTreeMap<String, String>>,
}

impl LocomosStation {
    pub fn new(config: StationConfig<LocomosConfig>) -> Self {
        Self {
            config,
            client: HttpClient::new(),
            base_url: UBIDOTS_URL.to_string(),
            variables: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(Self::new(StationConfig::from_value(value)?))
    }

    /// Seeds the variable cache, e.g. when re-transforming stored responses.
    pub fn with_variables(self, variables: BTreeMap<String, String>) -> Self {
        *self
            .variables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = variables;
        self
    }

    pub fn config(&self) -> &StationConfig<LocomosConfig> {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn variables(&self) -> BTreeMap<String, String> {
        self.variables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Loads the device's variable list unless it is already cached.
    pub async fn get_variables(&self) -> Result<BTreeMap<String, String>, StationError> {
        let cached = self.variables();
        if !cached.is_empty() {
            return Ok(cached);
        }

        let vendor = &self.config.vendor;
        let request = self
            .client
            .get(format!("{}/v2.0/devices/{}/variables/", self.base_url, vendor.id))
            .header("X-Auth-Token", vendor.token.as_str())
            .query(&[("page_size", "ALL")]);
        let response = self.client.send(request).await?;
        ensure_success(&response)?;

        let body: Value = serde_json::from_str(&response.text).map_err(ParseError::from)?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ParseError::missing_field("results"))?;
        let variables: BTreeMap<String, String> = results
            .iter()
            .filter_map(|result| {
                let id = result.get("id")?.as_str()?;
                let label = result.get("label")?.as_str()?;
                Some((id.to_string(), label.to_string()))
            })
            .collect();
        if variables.is_empty() {
            return Err(StationError::MissingVariables {
                device_id: vendor.id.clone(),
            });
        }
        tracing::debug!(station_id = %self.id(), count = variables.len(), "loaded Ubidots variables");

        *self
            .variables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = variables.clone();
        Ok(variables)
    }
}

/// Finds the variable id embedded in a block's column names.
fn variable_id_from_columns(pattern: &Regex, columns: &[&str]) -> Option<String> {
    columns.iter().find_map(|column| {
        if !pattern.is_match(column) {
            return None;
        }
        let prefix = column.split('.').next()?;
        match prefix {
            "device" | "variable" | "value" => None,
            id => Some(id.to_string()),
        }
    })
}

fn strip_id<'a>(column: &'a str, var_id: &str) -> &'a str {
    column
        .strip_prefix(var_id)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(column)
}

#[async_trait]
impl WeatherStation for LocomosStation {
    fn base(&self) -> &BaseConfig {
        &self.config.base
    }

    fn station_type(&self) -> StationType {
        StationType::Locomos
    }

    fn check_config(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    async fn fetch_raw(
        &self,
        interval: &UtcInterval,
    ) -> Result<Vec<WeatherAPIResponse>, StationError> {
        let variables = self.get_variables().await?;
        let body = json!({
            "variables": variables.keys().collect::<Vec<_>>(),
            "columns": SERIES_COLUMNS,
            "join_dataframes": false,
            "start": interval.start().timestamp_millis(),
            "end": interval.end().timestamp_millis(),
        });
        let request = self
            .client
            .post(format!("{}/v1.6/data/raw/series", self.base_url))
            .header("X-Auth-Token", self.config.vendor.token.as_str())
            .json(&body);
        let response = self.client.send(request).await?;
        ensure_success(&response)?;
        Ok(vec![response])
    }

    fn parse_response(&self, text: &str) -> Result<Vec<SensorReading>, ParseError> {
        let body = parse_body(text)?;
        let Some(results) = body.get("results") else {
            return Ok(Vec::new());
        };
        let results = results
            .as_array()
            .ok_or_else(|| ParseError::unexpected("'results' is not an array"))?;
        let columns = body
            .get("columns")
            .and_then(Value::as_array)
            .ok_or_else(|| ParseError::missing_field("columns"))?;

        let variables = self.variables();
        if variables.is_empty() {
            return Err(ParseError::unexpected(
                "Ubidots variable list not loaded for this station",
            ));
        }
        let field_by_id: HashMap<&str, &str> = variables
            .iter()
            .filter_map(|(id, label)| field_for_label(label).map(|field| (id.as_str(), field)))
            .collect();

        let mut by_time: BTreeMap<DateTime<Utc>, SensorReading> = BTreeMap::new();
        for (block, rows) in results.iter().enumerate() {
            let Some(rows) = rows.as_array().filter(|rows| !rows.is_empty()) else {
                continue;
            };
            let names: Vec<&str> = columns
                .get(block)
                .and_then(Value::as_array)
                .ok_or_else(|| ParseError::unexpected(format!("no columns for result block {block}")))?
                .iter()
                .filter_map(Value::as_str)
                .collect();
            let Some(var_id) = variable_id_from_columns(&ID_COLUMN, &names) else {
                continue;
            };
            let Some(field) = field_by_id.get(var_id.as_str()) else {
                continue;
            };
            let names: Vec<&str> = names.iter().map(|c| strip_id(c, &var_id)).collect();

            for row in rows {
                let row = row
                    .as_array()
                    .ok_or_else(|| ParseError::unexpected("result row is not an array"))?;
                let cell = |name: &str| {
                    names
                        .iter()
                        .position(|column| *column == name)
                        .and_then(|i| row.get(i))
                };
                if let Some(row_id) = cell("variable.id").and_then(Value::as_str) {
                    if row_id != var_id {
                        return Err(ParseError::unexpected(format!(
                            "row variable '{row_id}' in block for '{var_id}'"
                        )));
                    }
                }
                let millis = cell("timestamp")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| ParseError::missing_field("timestamp"))?;
                let data_datetime = utc_from_unix_millis(millis)?;
                let value = optional_f64(cell("value.value"))?;
                by_time
                    .entry(data_datetime)
                    .or_insert_with(|| SensorReading::at(data_datetime))
                    .set_field(field, value);
            }
        }
        Ok(by_time.into_values().collect())
    }
}
