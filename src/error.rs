//! Error types for the weather station collector.
//!
//! Each concern gets its own enum so callers can tell configuration faults,
//! vendor faults, malformed payloads and storage failures apart.

use crate::model::WeatherAPIResponse;
use thiserror::Error;

/// Result type alias using our custom error types.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type that encompasses all application errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request window errors
    #[error("interval error: {0}")]
    Interval(#[from] IntervalError),

    /// Vendor communication errors
    #[error("station error: {0}")]
    Station(#[from] StationError),

    /// Vendor payload errors
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Collection errors
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Persistence errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Station file errors
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Generic errors that don't fit other categories
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable parsing failed
    #[error("failed to parse environment variables: {0}")]
    EnvParse(String),

    /// Required configuration value is missing
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// Configuration value is invalid
    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },

    /// A station config mapping did not match its schema
    #[error("invalid {station_type} config for station '{station_id}': {message}")]
    Validation {
        station_type: String,
        station_id: String,
        message: String,
    },

    /// Station type discriminator is not recognized
    #[error("unknown station type '{0}'")]
    UnknownStationType(String),

    /// A config was handed to an adapter for a different vendor
    #[error("station '{station_id}' is configured as {found}, expected {expected}")]
    StationTypeMismatch {
        station_id: String,
        expected: String,
        found: String,
    },
}

/// Request window errors.
#[derive(Error, Debug, PartialEq)]
pub enum IntervalError {
    #[error("interval end {end} is before start {start}")]
    EndBeforeStart { start: String, end: String },
}

/// Vendor communication errors.
#[derive(Error, Debug)]
pub enum StationError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Vendor returned a non-success status
    #[error("unexpected status {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
        /// Responses of the request event captured up to the failure, oldest first.
        responses: Vec<WeatherAPIResponse>,
    },

    /// Token exchange failed
    #[error("authentication failed for station '{station_id}': {message}")]
    Auth { station_id: String, message: String },

    /// Throttle retries are used up
    #[error("station '{station_id}' still throttled after {retries} retries")]
    RetriesExhausted { station_id: String, retries: u32 },

    /// Ubidots device exposes no variables
    #[error("no variables found for device '{device_id}'")]
    MissingVariables { device_id: String },

    /// Requested window is invalid
    #[error(transparent)]
    Interval(#[from] IntervalError),

    /// Auxiliary vendor payload (token, variable list) is malformed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Vendor payload parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Body is not valid JSON
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is absent
    #[error("missing field '{0}'")]
    MissingField(String),

    /// Payload is JSON but not in the expected shape
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),

    /// Failed to parse numeric value
    #[error("failed to parse number from '{text}': {message}")]
    NumberParse { text: String, message: String },

    /// Failed to parse date/time
    #[error("failed to parse date/time from '{text}': {message}")]
    DateTimeParse { text: String, message: String },

    /// Reading failed validation
    #[error("invalid reading: {0}")]
    Validation(String),
}

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {message}")]
    Serialize { what: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Per-station collection errors.
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Fetching from the vendor failed
    #[error("station '{station_id}' failed to fetch readings: {source}")]
    Station {
        station_id: String,
        #[source]
        source: StationError,
    },

    /// Transforming the vendor payload failed
    #[error("station '{station_id}' failed to transform readings: {source}")]
    Transform {
        station_id: String,
        #[source]
        source: ParseError,
    },

    /// Persisting the outputs failed
    #[error("station '{station_id}' failed to save readings: {source}")]
    Storage {
        station_id: String,
        #[source]
        source: StorageError,
    },
}

/// Station file ingestion errors.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read station file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// station_config column holds malformed JSON
    #[error("invalid station_config JSON on row {row}: {message}")]
    InvalidJson { row: usize, message: String },

    /// Input is not a station table
    #[error("not a station CSV file: {0}")]
    NotCsv(String),

    /// Row JSON parsed but does not describe a valid station
    #[error("invalid station on row {row}: {source}")]
    Config {
        row: usize,
        #[source]
        source: ConfigError,
    },
}

impl ConfigError {
    /// Creates a new environment parse error.
    pub fn env_parse(err: impl std::fmt::Display) -> Self {
        Self::EnvParse(err.to_string())
    }

    /// Creates a new missing configuration error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }

    /// Creates a new invalid configuration error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a schema validation error for one station.
    pub fn validation(
        station_type: impl std::fmt::Display,
        station_id: impl Into<String>,
        err: impl std::fmt::Display,
    ) -> Self {
        Self::Validation {
            station_type: station_type.to_string(),
            station_id: station_id.into(),
            message: err.to_string(),
        }
    }
}

impl StationError {
    /// Creates a status error from an HTTP status and response body.
    pub fn status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
            body: body.into(),
            responses: Vec::new(),
        }
    }

    /// Prepends responses captured earlier in the same request event.
    pub fn with_responses(mut self, mut earlier: Vec<WeatherAPIResponse>) -> Self {
        if let Self::Status { responses, .. } = &mut self {
            earlier.append(responses);
            *responses = earlier;
        }
        self
    }

    /// Raw responses worth archiving despite the failure.
    pub fn responses(&self) -> &[WeatherAPIResponse] {
        match self {
            Self::Status { responses, .. } => responses,
            _ => &[],
        }
    }

    /// Creates an authentication error.
    pub fn auth(station_id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Auth {
            station_id: station_id.into(),
            message: message.to_string(),
        }
    }
}

impl ParseError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Creates an unexpected shape error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedShape(message.into())
    }

    /// Creates a number parse error.
    pub fn number_parse(text: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::NumberParse {
            text: text.into(),
            message: err.to_string(),
        }
    }

    /// Creates a datetime parse error.
    pub fn datetime_parse(text: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::DateTimeParse {
            text: text.into(),
            message: err.to_string(),
        }
    }
}

impl StorageError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn serialize(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Serialize {
            what: what.into(),
            message: err.to_string(),
        }
    }
}

impl IngestError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
