//! Station configuration: common fields plus one typed payload per vendor.

use crate::error::ConfigError;
use crate::model::{StationType, TimezoneCode};
use crate::stations::davis::DavisConfig;
use crate::stations::generic::GenericConfig;
use crate::stations::locomos::LocomosConfig;
use crate::stations::onset::OnsetConfig;
use crate::stations::rainwise::RainwiseConfig;
use crate::stations::spectrum::SpectrumConfig;
use crate::stations::zentra::ZentraConfig;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Fields every station carries regardless of vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseConfig {
    pub station_id: String,
    #[serde(with = "install_date")]
    pub install_date: NaiveDate,
    #[serde(default)]
    pub tz: TimezoneCode,
}

impl BaseConfig {
    pub fn timezone(&self) -> Tz {
        self.tz.tz()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.station_id.trim().is_empty() {
            return Err(ConfigError::invalid("station_id", "must not be empty"));
        }
        Ok(())
    }
}

/// Vendor-specific half of a station config.
pub trait VendorFields:
    serde::Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
    const STATION_TYPE: StationType;

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Fails when a required string field is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(())
}

/// A complete, validated config for one vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig<V> {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(flatten)]
    pub vendor: V,
}

impl<V: VendorFields> StationConfig<V> {
    pub fn new(base: BaseConfig, vendor: V) -> Result<Self, ConfigError> {
        let config = Self { base, vendor };
        config.validate()?;
        Ok(config)
    }

    /// Validates a raw mapping against this vendor's schema.
    ///
    /// The mapping may carry a `station_type` key, which must name this
    /// vendor, and a `station_config` key holding vendor fields either as an
    /// object or as a JSON string.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let station_type = V::STATION_TYPE;
        let Value::Object(mut fields) = value else {
            return Err(ConfigError::validation(
                station_type,
                "<unknown>",
                "config must be a JSON object",
            ));
        };
        let station_id = fields
            .get("station_id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();

        if let Some(found) = fields.remove("station_type") {
            let found: StationType = found.as_str().unwrap_or_default().parse()?;
            if found != station_type {
                return Err(ConfigError::StationTypeMismatch {
                    station_id,
                    expected: station_type.to_string(),
                    found: found.to_string(),
                });
            }
        }

        if let Some(nested) = fields.remove("station_config") {
            let nested = match nested {
                Value::String(text) => serde_json::from_str::<Value>(&text)
                    .map_err(|e| ConfigError::validation(station_type, &station_id, e))?,
                other => other,
            };
            match nested {
                Value::Object(vendor_fields) => {
                    for (key, value) in vendor_fields {
                        fields.entry(key).or_insert(value);
                    }
                }
                Value::Null => {}
                _ => {
                    return Err(ConfigError::validation(
                        station_type,
                        &station_id,
                        "station_config must be a JSON object",
                    ))
                }
            }
        }

        let config: Self = serde_json::from_value(Value::Object(fields))
            .map_err(|e| ConfigError::validation(station_type, &station_id, e))?;
        config
            .validate()
            .map_err(|e| ConfigError::validation(station_type, &station_id, e))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base.validate()?;
        self.vendor.validate()
    }

    pub fn station_id(&self) -> &str {
        &self.base.station_id
    }

    pub fn station_type(&self) -> StationType {
        V::STATION_TYPE
    }
}

/// Storage envelope for a station: shared columns plus a tagged vendor payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub base: BaseConfig,
    pub vendor: VendorConfig,
}

/// Vendor payload tagged by station type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "station_type", content = "station_config", rename_all = "UPPERCASE")]
pub enum VendorConfig {
    Zentra(ZentraConfig),
    Onset(OnsetConfig),
    Davis(DavisConfig),
    Rainwise(RainwiseConfig),
    Spectrum(SpectrumConfig),
    Locomos(LocomosConfig),
    Generic(GenericConfig),
}

fn typed<V: VendorFields>(value: Value) -> Result<V, ConfigError> {
    let vendor: V = serde_json::from_value(value)
        .map_err(|e| ConfigError::invalid("station_config", e.to_string()))?;
    vendor.validate()?;
    Ok(vendor)
}

impl VendorConfig {
    /// Builds the typed payload for `station_type` from its JSON fields.
    pub fn from_value(station_type: StationType, value: Value) -> Result<Self, ConfigError> {
        Ok(match station_type {
            StationType::Zentra => Self::Zentra(typed(value)?),
            StationType::Onset => Self::Onset(typed(value)?),
            StationType::Davis => Self::Davis(typed(value)?),
            StationType::Rainwise => Self::Rainwise(typed(value)?),
            StationType::Spectrum => Self::Spectrum(typed(value)?),
            StationType::Locomos => Self::Locomos(typed(value)?),
            StationType::Generic => Self::Generic(typed(value)?),
        })
    }

    pub fn station_type(&self) -> StationType {
        match self {
            Self::Zentra(_) => StationType::Zentra,
            Self::Onset(_) => StationType::Onset,
            Self::Davis(_) => StationType::Davis,
            Self::Rainwise(_) => StationType::Rainwise,
            Self::Spectrum(_) => StationType::Spectrum,
            Self::Locomos(_) => StationType::Locomos,
            Self::Generic(_) => StationType::Generic,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Zentra(c) => serde_json::to_value(c),
            Self::Onset(c) => serde_json::to_value(c),
            Self::Davis(c) => serde_json::to_value(c),
            Self::Rainwise(c) => serde_json::to_value(c),
            Self::Spectrum(c) => serde_json::to_value(c),
            Self::Locomos(c) => serde_json::to_value(c),
            Self::Generic(c) => serde_json::to_value(c),
        }
    }
}

impl StationRecord {
    /// Builds a record from the flat table columns.
    ///
    /// `station_config` must already be parsed; malformed JSON is reported
    /// by the caller that owns the row number.
    pub fn from_columns(
        station_id: &str,
        station_type: &str,
        install_date: &str,
        tz: &str,
        station_config: Value,
    ) -> Result<Self, ConfigError> {
        let station_type: StationType = station_type.parse()?;
        let tz = if tz.trim().is_empty() {
            TimezoneCode::default()
        } else {
            tz.parse()?
        };
        let base = BaseConfig {
            station_id: station_id.trim().to_string(),
            install_date: install_date::parse(install_date)
                .map_err(|e| ConfigError::invalid("install_date", e))?,
            tz,
        };
        base.validate()?;
        let vendor = VendorConfig::from_value(station_type, station_config)
            .map_err(|e| ConfigError::validation(station_type, &base.station_id, e))?;
        Ok(Self { base, vendor })
    }

    pub fn station_id(&self) -> &str {
        &self.base.station_id
    }

    pub fn station_type(&self) -> StationType {
        self.vendor.station_type()
    }

    /// `station_config` column contents.
    pub fn station_config_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.vendor.to_value()?)
    }

    /// Flat mapping of common and vendor fields.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut fields = Map::new();
        if let Value::Object(base) = serde_json::to_value(&self.base)? {
            fields.extend(base);
        }
        fields.insert(
            "station_type".to_string(),
            Value::String(self.station_type().to_string()),
        );
        if let Value::Object(vendor) = self.vendor.to_value()? {
            fields.extend(vendor);
        }
        Ok(Value::Object(fields))
    }
}

/// Accepts `YYYY-MM-DD` or an ISO 8601 date-time; writes `YYYY-MM-DD`.
pub(crate) mod install_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(text: &str) -> Result<NaiveDate, String> {
        let text = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(date);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(dt.date_naive());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|dt| dt.date())
            .ok_or_else(|| format!("'{text}' is not an ISO 8601 date"))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn davis_value() -> Value {
        json!({
            "station_id": "d1",
            "install_date": "2023-05-01",
            "tz": "CT",
            "sn": "12345",
            "apikey": "key",
            "apisec": "secret"
        })
    }

    mod succeeds {
        use super::*;

        #[test]
        fn test_from_value() {
            let config = StationConfig::<DavisConfig>::from_value(davis_value()).unwrap();
            assert_eq!(config.station_id(), "d1");
            assert_eq!(config.base.tz, TimezoneCode::Central);
            assert_eq!(config.vendor.sn, "12345");
            assert_eq!(config.station_type(), StationType::Davis);
        }

        #[test]
        fn test_tz_defaults_to_eastern() {
            let mut value = davis_value();
            value.as_object_mut().unwrap().remove("tz");
            let config = StationConfig::<DavisConfig>::from_value(value).unwrap();
            assert_eq!(config.base.tz, TimezoneCode::Eastern);
        }

        #[test]
        fn test_install_date_accepts_datetime() {
            let mut value = davis_value();
            value["install_date"] = json!("2023-05-01T12:30:00");
            let config = StationConfig::<DavisConfig>::from_value(value).unwrap();
            assert_eq!(
                config.base.install_date,
                NaiveDate::from_ymd_opt(2023, 5, 1).unwrap()
            );
        }

        #[test]
        fn test_matching_station_type_accepted() {
            let mut value = davis_value();
            value["station_type"] = json!("DAVIS");
            assert!(StationConfig::<DavisConfig>::from_value(value).is_ok());
        }

        #[test]
        fn test_nested_station_config_string_is_merged() {
            let value = json!({
                "station_id": "d1",
                "install_date": "2023-05-01",
                "station_type": "DAVIS",
                "station_config": "{\"sn\":\"9\",\"apikey\":\"k\",\"apisec\":\"s\"}"
            });
            let config = StationConfig::<DavisConfig>::from_value(value).unwrap();
            assert_eq!(config.vendor.sn, "9");
        }

        #[test]
        fn test_vendor_config_tagged_serialization() {
            let vendor = VendorConfig::Zentra(ZentraConfig {
                sn: "z-1".to_string(),
                token: "t".to_string(),
            });
            let value = serde_json::to_value(&vendor).unwrap();
            assert_eq!(
                value,
                json!({"station_type": "ZENTRA", "station_config": {"sn": "z-1", "token": "t"}})
            );
            let back: VendorConfig = serde_json::from_value(value).unwrap();
            assert_eq!(back, vendor);
        }

        #[test]
        fn test_record_from_columns() {
            let record = StationRecord::from_columns(
                "z1",
                "ZENTRA",
                "2023-05-01",
                "MT",
                json!({"sn": "z-1", "token": "t"}),
            )
            .unwrap();
            assert_eq!(record.station_type(), StationType::Zentra);
            assert_eq!(record.base.tz, TimezoneCode::Mountain);
            assert_eq!(
                record.station_config_json().unwrap(),
                r#"{"sn":"z-1","token":"t"}"#
            );
            let flat = record.to_value().unwrap();
            assert_eq!(flat["station_id"], "z1");
            assert_eq!(flat["station_type"], "ZENTRA");
            assert_eq!(flat["token"], "t");
        }
    }

    mod fails {
        use super::*;

        #[test]
        fn test_missing_vendor_field_is_named() {
            let mut value = davis_value();
            value.as_object_mut().unwrap().remove("apisec");
            let err = StationConfig::<DavisConfig>::from_value(value).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }));
            assert!(err.to_string().contains("apisec"));
            assert!(err.to_string().contains("d1"));
        }

        #[test]
        fn test_empty_station_id() {
            let mut value = davis_value();
            value["station_id"] = json!("  ");
            let err = StationConfig::<DavisConfig>::from_value(value).unwrap_err();
            assert!(err.to_string().contains("station_id"));
        }

        #[test]
        fn test_unknown_timezone_code() {
            let mut value = davis_value();
            value["tz"] = json!("GMT");
            assert!(StationConfig::<DavisConfig>::from_value(value).is_err());
        }

        #[test]
        fn test_station_type_mismatch() {
            let mut value = davis_value();
            value["station_type"] = json!("ZENTRA");
            let err = StationConfig::<DavisConfig>::from_value(value).unwrap_err();
            assert!(matches!(err, ConfigError::StationTypeMismatch { .. }));
        }

        #[test]
        fn test_not_an_object() {
            assert!(StationConfig::<DavisConfig>::from_value(json!(["d1"])).is_err());
        }

        #[test]
        fn test_record_with_unknown_type() {
            let err = StationRecord::from_columns("x", "ACME", "2023-05-01", "ET", json!({}))
                .unwrap_err();
            assert!(matches!(err, ConfigError::UnknownStationType(_)));
        }

        #[test]
        fn test_record_with_bad_install_date() {
            let err = StationRecord::from_columns(
                "z1",
                "ZENTRA",
                "May first",
                "ET",
                json!({"sn": "z-1", "token": "t"}),
            )
            .unwrap_err();
            assert!(err.to_string().contains("install_date"));
        }
    }
}
