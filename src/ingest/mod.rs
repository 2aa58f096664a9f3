/// Feed retrieval and normalization.
///
/// Submodules:
/// - `http` — the `TextSource` capability (live reqwest client, canned bodies).
/// - `html` — ARSO observation table scraping.
/// - `json` — JCDecaux station array extraction.

pub mod html;
pub mod http;
pub mod json;

use crate::model::{ParseError, StationRecord};
use crate::profiles::{ExtractionProfile, MissingFieldPolicy, SourceKind};

/// Records kept from one body, plus how many elements were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<StationRecord>,
    pub skipped: usize,
}

/// Interprets `body` according to `profile`.
pub fn extract(
    profile: &ExtractionProfile,
    policy: MissingFieldPolicy,
    body: &str,
) -> Result<Extraction, ParseError> {
    match &profile.source {
        SourceKind::Html(markers) => html::parse_observation_table(body, markers, policy),
        SourceKind::Json { count_path } => json::parse_station_array(body, count_path, policy),
    }
}
