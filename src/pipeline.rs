/// Fetch → parse → records.
///
/// One parametrized pipeline serves every profile: `FeedConfig` picks the
/// profile, endpoint, key and missing-field policy, and `run` does the rest.
/// `spawn_fetch` runs the same thing on a worker thread and hands the single
/// result back over a channel.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use crate::config::FeedConfig;
use crate::ingest::{self, Extraction, http::TextSource};
use crate::logging::{self, DataSource};
use crate::model::{PipelineError, StationRecord};

/// What a background fetch delivers.
pub type FetchOutcome = Result<Vec<StationRecord>, PipelineError>;

pub fn log_source(config: &FeedConfig) -> DataSource {
    if config.profile.is_json() {
        DataSource::Json
    } else {
        DataSource::Html
    }
}

/// Fetches and parses one feed, keeping the skip count.
pub fn fetch_extraction(
    config: &FeedConfig,
    source: &dyn TextSource,
) -> Result<Extraction, PipelineError> {
    let url = config.request_url()?;
    let profile = config.profile.name;
    let log_as = log_source(config);

    // The URL may carry the API key; only the configured endpoint is logged.
    logging::debug(log_as, Some(profile), &format!("GET {}", config.endpoint));

    let body = source.fetch_text(&url)?;
    logging::debug(log_as, Some(profile), &format!("Received {} bytes", body.len()));

    let extraction = ingest::extract(config.profile, config.missing_fields, &body)?;
    logging::log_extraction_summary(log_as, profile, extraction.records.len(), extraction.skipped);
    Ok(extraction)
}

/// Runs the pipeline once, returning records in feed order.
pub fn run(config: &FeedConfig, source: &dyn TextSource) -> FetchOutcome {
    match fetch_extraction(config, source) {
        Ok(extraction) => Ok(extraction.records),
        Err(e) => {
            logging::log_pipeline_failure(log_source(config), config.profile.name, &e);
            Err(e)
        }
    }
}

/// Runs the pipeline on a worker thread. The receiver yields exactly one
/// outcome, or disconnects if the worker died.
pub fn spawn_fetch(config: FeedConfig, source: Arc<dyn TextSource>) -> Receiver<FetchOutcome> {
    let (tx, rx) = mpsc::channel::<FetchOutcome>();

    thread::spawn(move || {
        let outcome = run(&config, source.as_ref());
        // The requester may have gone away; nothing to do then.
        let _ = tx.send(outcome);
    });

    rx
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
