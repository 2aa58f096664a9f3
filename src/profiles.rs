/// Extraction profile registry.
///
/// A profile names one way of interpreting a feed: which kind of document the
/// endpoint serves, where it lives, and which markers or field path locate the
/// values. This is the single source of truth for endpoints and paths; other
/// modules look profiles up here rather than hardcoding selectors.
///
/// The two bike profiles read different leaves of the same JCDecaux object
/// (`...stands` vs `...bikes`). They may reflect an API schema change rather
/// than two intended views, so they are kept apart and never substituted for
/// one another.

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// ARSO latest automatic station observations (HTML table).
pub const ARSO_OBSERVATIONS_URL: &str =
    "https://meteo.arso.gov.si/uploads/probase/www/observ/surface/text/sl/observationAms_si_latest.html";

/// JCDecaux station list for the Maribor contract. The `apiKey` query
/// parameter is appended at run time from configuration.
pub const JCDECAUX_STATIONS_URL: &str = "https://api.jcdecaux.com/vls/v3/stations?contract=maribor";

// ---------------------------------------------------------------------------
// Profile types
// ---------------------------------------------------------------------------

/// What to do with an element that lacks a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Drop the element and carry on.
    Skip,
    /// Fail the whole run on the first incomplete element.
    Fail,
}

/// CSS markers for one HTML table layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlMarkers {
    pub name: &'static str,
    pub temperature: &'static str,
    /// Scraped when present; never a reason to drop a row.
    pub humidity: Option<&'static str>,
}

/// How the body of a profile's endpoint is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Html(HtmlMarkers),
    /// JSON array of objects; `count_path` is the dotted path to the integer.
    Json { count_path: &'static [&'static str] },
}

/// A named extraction profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub endpoint: &'static str,
    pub source: SourceKind,
    /// Column titles for rendered tables, name column first.
    pub columns: &'static [&'static str],
    pub missing_fields: MissingFieldPolicy,
    /// Whether requests must carry an `apiKey` query parameter.
    pub needs_api_key: bool,
}

impl ExtractionProfile {
    pub fn is_json(&self) -> bool {
        matches!(self.source, SourceKind::Json { .. })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub static PROFILE_REGISTRY: &[ExtractionProfile] = &[
    ExtractionProfile {
        name: "arso-temperature",
        description: "Current air temperature per ARSO automatic station.",
        endpoint: ARSO_OBSERVATIONS_URL,
        source: SourceKind::Html(HtmlMarkers {
            name: "td.meteoSI-th",
            temperature: "td.t",
            humidity: None,
        }),
        columns: &["MESTO", "TEMPERATURA"],
        missing_fields: MissingFieldPolicy::Skip,
        needs_api_key: false,
    },
    ExtractionProfile {
        name: "arso-observation",
        description: "Air temperature and relative humidity per ARSO automatic station.",
        endpoint: ARSO_OBSERVATIONS_URL,
        source: SourceKind::Html(HtmlMarkers {
            name: "td.meteoSI-th",
            temperature: "td.t",
            humidity: Some("td.rh"),
        }),
        columns: &["MESTO", "TEMPERATURA", "Vlaznost"],
        missing_fields: MissingFieldPolicy::Skip,
        needs_api_key: false,
    },
    ExtractionProfile {
        name: "jcdecaux-stands",
        description: "Free stands per Maribor bike station (availabilities.stands).",
        endpoint: JCDECAUX_STATIONS_URL,
        source: SourceKind::Json {
            count_path: &["totalStands", "availabilities", "stands"],
        },
        columns: &["Station Name", "Available Bikes"],
        missing_fields: MissingFieldPolicy::Skip,
        needs_api_key: true,
    },
    ExtractionProfile {
        name: "jcdecaux-bikes",
        description: "Available bikes per Maribor bike station (availabilities.bikes).",
        endpoint: JCDECAUX_STATIONS_URL,
        source: SourceKind::Json {
            count_path: &["totalStands", "availabilities", "bikes"],
        },
        columns: &["Station Name", "Available Bikes"],
        missing_fields: MissingFieldPolicy::Skip,
        needs_api_key: true,
    },
];

/// Profile used when configuration does not name one.
pub const DEFAULT_PROFILE: &str = "jcdecaux-stands";

/// Looks up a profile by name. Returns `None` if not found.
pub fn find_profile(name: &str) -> Option<&'static ExtractionProfile> {
    PROFILE_REGISTRY.iter().find(|p| p.name == name)
}

/// Names of all registered profiles, in registry order.
pub fn profile_names() -> Vec<&'static str> {
    PROFILE_REGISTRY.iter().map(|p| p.name).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
