/// Core data types for the station feed pipeline.
///
/// This module defines the shared domain model imported by all other modules:
/// the parsed record, its measurement, and the error taxonomy. It contains no
/// I/O, only types.

use std::fmt;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// The measurement carried by a record. Which variant appears depends on the
/// extraction profile that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Measurement {
    /// Integer count read from a bike-station JSON feed.
    AvailableBikes(i64),
    /// Text cells scraped from the weather observation table. Values are kept
    /// as published (e.g. "21.3"), since the page mixes numbers and dashes.
    Weather {
        temperature: String,
        humidity: Option<String>,
    },
}

impl Measurement {
    /// The measurement as display cells, in column order.
    pub fn cells(&self) -> Vec<String> {
        match self {
            Measurement::AvailableBikes(n) => vec![n.to_string()],
            Measurement::Weather { temperature, humidity: None } => vec![temperature.clone()],
            Measurement::Weather {
                temperature,
                humidity: Some(rh),
            } => vec![temperature.clone(), rh.clone()],
        }
    }
}

/// One parsed station or observation entity.
///
/// Records never change after construction; the list model replaces a record
/// wholesale when it is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRecord {
    pub name: String,
    pub measurement: Measurement,
}

impl StationRecord {
    pub fn bikes(name: impl Into<String>, available: i64) -> Self {
        Self {
            name: name.into(),
            measurement: Measurement::AvailableBikes(available),
        }
    }

    pub fn weather(
        name: impl Into<String>,
        temperature: impl Into<String>,
        humidity: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            measurement: Measurement::Weather {
                temperature: temperature.into(),
                humidity,
            },
        }
    }

    /// Returns a copy of this record under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            measurement: self.measurement.clone(),
        }
    }

    /// Bike count, if this record came from a bike feed.
    pub fn available_bikes(&self) -> Option<i64> {
        match self.measurement {
            Measurement::AvailableBikes(n) => Some(n),
            Measurement::Weather { .. } => None,
        }
    }

    /// Name followed by the measurement cells.
    pub fn cells(&self) -> Vec<String> {
        let mut row = vec![self.name.clone()];
        row.extend(self.measurement.cells());
        row
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Network or transport failure while retrieving a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    Transport(String),
    /// Non-2xx HTTP response.
    HttpStatus(u16),
    /// The response arrived but its body could not be read as text.
    Body(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            FetchError::Body(msg) => write!(f, "Body error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// The body was retrieved but does not have the expected structure.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The body is not valid JSON.
    Json(String),
    /// The body is valid JSON but not an array.
    NotAnArray,
    /// The HTML document contains no table rows at all.
    NoTableRows,
    /// A profile carries a CSS selector the HTML parser rejects.
    InvalidSelector(String),
    /// An element lacked a required field and the profile is strict.
    MissingField { index: usize, field: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Json(msg) => write!(f, "Parse error: invalid JSON: {}", msg),
            ParseError::NotAnArray => write!(f, "Parse error: expected a JSON array"),
            ParseError::NoTableRows => write!(f, "Parse error: document has no table rows"),
            ParseError::InvalidSelector(sel) => write!(f, "Parse error: invalid selector '{}'", sel),
            ParseError::MissingField { index, field } => {
                write!(f, "Parse error: element {} is missing '{}'", index, field)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Missing or malformed configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Malformed { path: String, message: String },
    /// A JSON profile was selected but no API key was supplied.
    MissingApiKey(String),
    UnknownProfile(String),
    /// The database sink was requested without connection parameters.
    MissingDatabase,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Config error: cannot read {}: {}", path, message)
            }
            ConfigError::Malformed { path, message } => {
                write!(f, "Config error: malformed {}: {}", path, message)
            }
            ConfigError::MissingApiKey(profile) => write!(
                f,
                "Config error: profile '{}' needs an API key (set JCDECAUX_API_KEY)",
                profile
            ),
            ConfigError::UnknownProfile(name) => write!(
                f,
                "Config error: unknown extraction profile '{}' (known: {})",
                name,
                crate::profiles::profile_names().join(", ")
            ),
            ConfigError::MissingDatabase => {
                write!(f, "Config error: no database connection parameters found")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Anything that can stop a pipeline run before records are produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Fetch(FetchError),
    Parse(ParseError),
    Config(ConfigError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Fetch(e) => e.fmt(f),
            PipelineError::Parse(e) => e.fmt(f),
            PipelineError::Config(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Fetch(e) => Some(e),
            PipelineError::Parse(e) => Some(e),
            PipelineError::Config(e) => Some(e),
        }
    }
}

impl From<FetchError> for PipelineError {
    fn from(e: FetchError) -> Self {
        PipelineError::Fetch(e)
    }
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        PipelineError::Parse(e)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
