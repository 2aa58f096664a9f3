/// Run configuration.
///
/// Settings come from `station_feed.toml` (or the file named by
/// `STATION_FEED_CONFIG`) and from the environment, which `main` seeds from
/// `.env`. Environment values win over the file. A missing file is not an
/// error: every setting has a default except the JCDecaux API key, which is
/// only required when a JSON profile is selected.
///
/// ```toml
/// profile = "jcdecaux-bikes"
/// missing_fields = "fail"
/// timeout_secs = 20
///
/// [output]
/// path = "output.html"
/// open_browser = true
///
/// [logging]
/// level = "debug"
/// file = "station_feed.log"
/// ```
///
/// Environment lookups go through a caller-supplied function so tests never
/// touch the process environment.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::ingest::http::with_api_key;
use crate::logging::LogLevel;
use crate::model::ConfigError;
use crate::profiles::{DEFAULT_PROFILE, ExtractionProfile, MissingFieldPolicy, find_profile};

pub const CONFIG_PATH: &str = "station_feed.toml";
pub const CONFIG_PATH_ENV: &str = "STATION_FEED_CONFIG";
pub const PROFILE_ENV: &str = "STATION_FEED_PROFILE";
pub const API_KEY_ENV: &str = "JCDECAUX_API_KEY";
pub const DEFAULT_OUTPUT_PATH: &str = "output.html";

// ============================================================================
// File layout
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    profile: Option<String>,
    endpoint: Option<String>,
    api_key: Option<String>,
    missing_fields: Option<MissingFieldPolicy>,
    timeout_secs: Option<u64>,
    #[serde(default)]
    write_database: bool,
    #[serde(default)]
    output: OutputConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: String,
    pub open_browser: bool,
    /// Also print the console table.
    pub print_table: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_PATH.to_string(),
            open_browser: false,
            print_table: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            timestamps: false,
        }
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Everything the pipeline needs for one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub profile: &'static ExtractionProfile,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub missing_fields: MissingFieldPolicy,
    /// `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl FeedConfig {
    /// Defaults for a registered profile: its endpoint and policy, no key.
    pub fn for_profile(name: &str) -> Result<Self, ConfigError> {
        let profile =
            find_profile(name).ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        Ok(Self {
            profile,
            endpoint: profile.endpoint.to_string(),
            api_key: None,
            missing_fields: profile.missing_fields,
            timeout: None,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_missing_fields(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_fields = policy;
        self
    }

    /// The URL actually requested, with the API key attached when the
    /// profile needs one.
    pub fn request_url(&self) -> Result<String, ConfigError> {
        if !self.profile.needs_api_key {
            return Ok(self.endpoint.clone());
        }
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => with_api_key(&self.endpoint, key.trim()),
            _ => Err(ConfigError::MissingApiKey(self.profile.name.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub write_database: bool,
}

impl AppConfig {
    /// Resolves configuration from TOML text plus environment lookups.
    pub fn from_toml_str<F>(text: &str, origin: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = toml::from_str(text).map_err(|e| ConfigError::Malformed {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        Self::resolve(file, env)
    }

    /// Reads `path` if it exists; a missing file means "all defaults".
    pub fn load<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !path.exists() {
            return Self::resolve(FileConfig::default(), env);
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text, &path.display().to_string(), env)
    }

    /// Loads from the conventional location using the process environment.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load(Path::new(&path), |key| std::env::var(key).ok())
    }

    fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile_name = env(PROFILE_ENV)
            .or(file.profile)
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let mut feed = FeedConfig::for_profile(&profile_name)?;
        if let Some(endpoint) = file.endpoint {
            feed = feed.with_endpoint(endpoint);
        }
        if let Some(policy) = file.missing_fields {
            feed = feed.with_missing_fields(policy);
        }
        feed.api_key = env(API_KEY_ENV).or(file.api_key);
        feed.timeout = file.timeout_secs.map(Duration::from_secs);

        Ok(Self {
            feed,
            output: file.output,
            logging: file.logging,
            write_database: file.write_database,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
