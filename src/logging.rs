/// Structured logging for the station feed.
///
/// Every entry is tagged with the feed or subsystem it concerns and, where
/// relevant, the extraction profile. Console output goes to stdout/stderr by
/// severity; an optional log file receives timestamped copies of every entry.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{FetchError, ParseError, PipelineError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Scraped HTML observation tables.
    Html,
    /// JSON station feeds.
    Json,
    Database,
    Render,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Html => write!(f, "HTML"),
            DataSource::Json => write!(f, "JSON"),
            DataSource::Database => write!(f, "DB"),
            DataSource::Render => write!(f, "RENDER"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// The feed answered but had nothing usable (empty table, empty array).
    Expected,
    /// Transport failure, server error or a body we cannot read at all.
    Unexpected,
    /// Cannot tell from the error alone.
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify a pipeline failure for logging severity.
pub fn classify_failure(err: &PipelineError) -> FailureType {
    match err {
        PipelineError::Fetch(FetchError::Transport(_)) => FailureType::Unexpected,
        PipelineError::Fetch(FetchError::HttpStatus(code)) if *code >= 500 => {
            FailureType::Unexpected
        }
        // 4xx usually means a bad or expired API key
        PipelineError::Fetch(FetchError::HttpStatus(_)) => FailureType::Unknown,
        PipelineError::Fetch(FetchError::Body(_)) => FailureType::Unexpected,
        PipelineError::Parse(ParseError::NoTableRows) => FailureType::Expected,
        PipelineError::Parse(_) => FailureType::Unexpected,
        PipelineError::Config(_) => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    min_level: LogLevel,
    log_file: Option<String>,
    /// Whether console lines carry the full timestamped prefix.
    console_timestamps: bool,
}

impl Logger {
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: DataSource, profile: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let profile_part = profile.map(|p| format!(" [{}]", p)).unwrap_or_default();
        let log_entry = format_entry(level, source, profile, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, profile_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, profile_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// `2026-10-17 09:30:00 UTC INFO JSON [jcdecaux-bikes]: message`
fn format_entry(level: LogLevel, source: DataSource, profile: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let profile_part = profile.map(|p| format!(" [{}]", p)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, source, profile_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, source: DataSource, profile: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, source, profile, message);
        }
    }
}

pub fn info(source: DataSource, profile: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, source, profile, message);
}

pub fn warn(source: DataSource, profile: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, source, profile, message);
}

pub fn error(source: DataSource, profile: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, source, profile, message);
}

pub fn debug(source: DataSource, profile: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, source, profile, message);
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a pipeline failure at a severity derived from its classification.
pub fn log_pipeline_failure(source: DataSource, profile: &str, err: &PipelineError) {
    let failure_type = classify_failure(err);
    let message = format!("fetch failed [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, Some(profile), &message),
        FailureType::Unexpected => error(source, Some(profile), &message),
        FailureType::Unknown => warn(source, Some(profile), &message),
    }
}

/// Log how many elements a run kept and dropped.
pub fn log_extraction_summary(source: DataSource, profile: &str, kept: usize, skipped: usize) {
    let message = format!("Extracted {} records ({} skipped)", kept, skipped);

    if kept == 0 && skipped > 0 {
        warn(source, Some(profile), &message);
    } else {
        info(source, Some(profile), &message);
    }
}
