use crate::error::ConfigError;
use chrono_tz::Tz;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vendor family of a weather station.
///
/// Serialized in upper case (`"DAVIS"`, `"ZENTRA"`, ...) to match the
/// station table and the `station_type` column of exported readings.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StationType {
    Zentra,
    Onset,
    Davis,
    Rainwise,
    Spectrum,
    Locomos,
    /// Placeholder station used for development; never calls a vendor.
    Generic,
}

impl StationType {
    pub const ALL: [StationType; 7] = [
        StationType::Zentra,
        StationType::Onset,
        StationType::Davis,
        StationType::Rainwise,
        StationType::Spectrum,
        StationType::Locomos,
        StationType::Generic,
    ];

    /// Station types backed by a real vendor API.
    pub fn vendors() -> impl Iterator<Item = StationType> {
        Self::ALL.into_iter().filter(|t| *t != StationType::Generic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StationType::Zentra => "ZENTRA",
            StationType::Onset => "ONSET",
            StationType::Davis => "DAVIS",
            StationType::Rainwise => "RAINWISE",
            StationType::Spectrum => "SPECTRUM",
            StationType::Locomos => "LOCOMOS",
            StationType::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for StationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StationType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownStationType(s.to_string()))
    }
}

/// Two-letter US time zone code carried in station configs.
///
/// Each code resolves to one IANA zone so local vendor timestamps follow
/// daylight saving transitions.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub enum TimezoneCode {
    #[serde(rename = "HT")]
    Hawaii,
    #[serde(rename = "AT")]
    Alaska,
    #[serde(rename = "PT")]
    Pacific,
    #[serde(rename = "MT")]
    Mountain,
    #[serde(rename = "CT")]
    Central,
    #[default]
    #[serde(rename = "ET")]
    Eastern,
}

impl TimezoneCode {
    pub const ALL: [TimezoneCode; 6] = [
        TimezoneCode::Hawaii,
        TimezoneCode::Alaska,
        TimezoneCode::Pacific,
        TimezoneCode::Mountain,
        TimezoneCode::Central,
        TimezoneCode::Eastern,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TimezoneCode::Hawaii => "HT",
            TimezoneCode::Alaska => "AT",
            TimezoneCode::Pacific => "PT",
            TimezoneCode::Mountain => "MT",
            TimezoneCode::Central => "CT",
            TimezoneCode::Eastern => "ET",
        }
    }

    pub fn tz(&self) -> Tz {
        match self {
            TimezoneCode::Hawaii => chrono_tz::Pacific::Honolulu,
            TimezoneCode::Alaska => chrono_tz::America::Anchorage,
            TimezoneCode::Pacific => chrono_tz::America::Los_Angeles,
            TimezoneCode::Mountain => chrono_tz::America::Denver,
            TimezoneCode::Central => chrono_tz::America::Chicago,
            TimezoneCode::Eastern => chrono_tz::America::New_York,
        }
    }

    pub fn iana_name(&self) -> &'static str {
        self.tz().name()
    }
}

impl fmt::Display for TimezoneCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TimezoneCode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::invalid("tz", format!("unrecognized time zone code '{s}'")))
    }
}
