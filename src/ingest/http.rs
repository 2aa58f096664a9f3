/// HTTP text retrieval.
///
/// The pipeline only needs "give me the body at this URL as text", so that is
/// all `TextSource` exposes. `HttpSource` is the live implementation on top of
/// the blocking reqwest client; `CannedSource` serves fixed bodies for tests
/// and offline runs.

use std::collections::HashMap;
use std::time::Duration;

use crate::model::{ConfigError, FetchError};

/// Anything that can turn a URL into a response body.
pub trait TextSource: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

// ============================================================================
// Live HTTP
// ============================================================================

pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Builds a client. With `timeout: None` the transport default applies.
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("station_feed/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl TextSource for HttpSource {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        response.text().map_err(|e| FetchError::Body(e.to_string()))
    }
}

// ============================================================================
// Canned bodies
// ============================================================================

/// Serves pre-loaded bodies keyed by URL. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct CannedSource {
    bodies: HashMap<String, Result<String, FetchError>>,
}

impl CannedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_error(mut self, url: impl Into<String>, err: FetchError) -> Self {
        self.bodies.insert(url.into(), Err(err));
        self
    }
}

impl TextSource for CannedSource {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.bodies
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::HttpStatus(404)))
    }
}

// ============================================================================
// URL construction
// ============================================================================

/// Appends `apiKey=<key>` to an endpoint, keeping its existing query.
pub fn with_api_key(endpoint: &str, api_key: &str) -> Result<String, ConfigError> {
    let mut url = reqwest::Url::parse(endpoint).map_err(|e| ConfigError::Malformed {
        path: endpoint.to_string(),
        message: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("apiKey", api_key);
    Ok(url.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_appended_after_existing_query() {
        let url = with_api_key("https://api.jcdecaux.com/vls/v3/stations?contract=maribor", "k123")
            .expect("valid endpoint");
        assert_eq!(
            url,
            "https://api.jcdecaux.com/vls/v3/stations?contract=maribor&apiKey=k123"
        );
    }

    #[test]
    fn test_api_key_is_percent_encoded() {
        let url = with_api_key("https://example.org/stations", "a b&c").expect("valid endpoint");
        assert!(url.ends_with("?apiKey=a+b%26c"), "got {}", url);
    }

    #[test]
    fn test_malformed_endpoint_is_a_config_error() {
        let result = with_api_key("not a url", "k");
        assert!(matches!(result, Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn test_canned_source_serves_bodies_and_errors() {
        let source = CannedSource::new()
            .with_body("http://a/", "[]")
            .with_error("http://b/", FetchError::HttpStatus(500));
        assert_eq!(source.fetch_text("http://a/"), Ok("[]".to_string()));
        assert_eq!(source.fetch_text("http://b/"), Err(FetchError::HttpStatus(500)));
        assert_eq!(source.fetch_text("http://c/"), Err(FetchError::HttpStatus(404)));
    }
}
