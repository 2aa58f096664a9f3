/// Offline end-to-end scenarios.
///
/// Each test drives the public API the way the binary or a list view would:
/// canned body → pipeline → list model → edits → rendered document. No
/// network or database is needed.
///
/// Run with: cargo test --test pipeline_scenarios

use std::sync::Arc;

use station_feed::config::FeedConfig;
use station_feed::ingest::http::CannedSource;
use station_feed::list_model::{ListChange, StationList};
use station_feed::model::{FetchError, ParseError, PipelineError, StationRecord};
use station_feed::pipeline;
use station_feed::profiles::{ARSO_OBSERVATIONS_URL, MissingFieldPolicy, find_profile};
use station_feed::render;
use station_feed::session::{LoadState, Session};

const KEY: &str = "integration-key";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn keyed_url() -> String {
    format!(
        "https://api.jcdecaux.com/vls/v3/stations?contract=maribor&apiKey={}",
        KEY
    )
}

fn bikes_feed(profile: &str) -> FeedConfig {
    FeedConfig::for_profile(profile)
        .expect("profile is registered")
        .with_api_key(KEY)
}

/// Trimmed-down JCDecaux v3 payload: three complete stations and one whose
/// `totalStands` block has no availabilities.
const MARIBOR_JSON: &str = r#"[
  {"number": 1, "contractName": "maribor", "name": "EUROPARK",
   "totalStands": {"availabilities": {"bikes": 4, "stands": 11}, "capacity": 15}},
  {"number": 2, "contractName": "maribor", "name": "GLAVNI TRG",
   "totalStands": {"availabilities": {"bikes": 0, "stands": 20}, "capacity": 20}},
  {"number": 3, "contractName": "maribor", "name": "TABOR",
   "totalStands": {"capacity": 10}},
  {"number": 4, "contractName": "maribor", "name": "STUDENCI",
   "totalStands": {"availabilities": {"bikes": 7, "stands": 3}, "capacity": 10}}
]"#;

/// Shape of the ARSO observation page: a header row, three stations, one of
/// which is missing the temperature class, and a footer table.
const ARSO_HTML: &str = r#"<!DOCTYPE html>
<html><head><meta charset="UTF-8"><title>Opazovanja</title></head>
<body>
<table class="meteoSI-table">
  <thead><tr><th>Postaja</th><th>T [°C]</th><th>RH [%]</th></tr></thead>
  <tbody>
    <tr><td class="meteoSI-th">Ljubljana</td><td class="t">19.8</td><td class="rh">55</td></tr>
    <tr><td class="meteoSI-th">Maribor</td><td>21.3</td><td class="rh">48</td></tr>
    <tr><td class="meteoSI-th"> Novo  mesto </td><td class="t">20.1</td><td class="rh">60</td></tr>
  </tbody>
</table>
<table><tr><td>Vir: ARSO</td></tr></table>
</body></html>"#;

// ---------------------------------------------------------------------------
// JSON feed
// ---------------------------------------------------------------------------

#[test]
fn test_single_station_scenario_renders_expected_row() {
    let source = CannedSource::new().with_body(
        keyed_url(),
        r#"[{"name":"A","totalStands":{"availabilities":{"stands":3}}}]"#,
    );
    let records = pipeline::run(&bikes_feed("jcdecaux-stands"), &source).expect("feed parses");
    assert_eq!(records, vec![StationRecord::bikes("A", 3)]);

    let profile = find_profile("jcdecaux-stands").expect("registered");
    let html = render::render_document(profile, &records).expect("template renders");
    assert!(html.contains("<tr><td>A</td><td>3</td></tr>"));
}

#[test]
fn test_stands_and_bikes_profiles_disagree_on_the_same_feed() {
    let source = CannedSource::new().with_body(keyed_url(), MARIBOR_JSON);
    let stands = pipeline::run(&bikes_feed("jcdecaux-stands"), &source).expect("parses");
    let bikes = pipeline::run(&bikes_feed("jcdecaux-bikes"), &source).expect("parses");

    fn counts(records: &[StationRecord]) -> Vec<i64> {
        records.iter().filter_map(StationRecord::available_bikes).collect()
    }
    assert_eq!(counts(&stands), vec![11, 20, 3]);
    assert_eq!(counts(&bikes), vec![4, 0, 7]);
}

#[test]
fn test_incomplete_station_is_skipped_or_fatal_by_policy() {
    let source = CannedSource::new().with_body(keyed_url(), MARIBOR_JSON);

    let lenient = pipeline::run(&bikes_feed("jcdecaux-bikes"), &source).expect("skip policy");
    let names: Vec<&str> = lenient.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["EUROPARK", "GLAVNI TRG", "STUDENCI"]);

    let strict = bikes_feed("jcdecaux-bikes").with_missing_fields(MissingFieldPolicy::Fail);
    assert_eq!(
        pipeline::run(&strict, &source),
        Err(PipelineError::Parse(ParseError::MissingField {
            index: 2,
            field: "totalStands.availabilities.bikes".to_string(),
        }))
    );
}

#[test]
fn test_unauthorized_response_stops_the_run() {
    let source = CannedSource::new().with_error(keyed_url(), FetchError::HttpStatus(403));
    let result = pipeline::run(&bikes_feed("jcdecaux-bikes"), &source);
    assert_eq!(result, Err(PipelineError::Fetch(FetchError::HttpStatus(403))));
}

// ---------------------------------------------------------------------------
// HTML feed
// ---------------------------------------------------------------------------

#[test]
fn test_observation_page_keeps_marked_rows_in_order() {
    let source = CannedSource::new().with_body(ARSO_OBSERVATIONS_URL, ARSO_HTML);
    let config = FeedConfig::for_profile("arso-observation").expect("registered");
    let records = pipeline::run(&config, &source).expect("page parses");

    assert_eq!(
        records,
        vec![
            StationRecord::weather("Ljubljana", "19.8", Some("55".to_string())),
            StationRecord::weather("Novo mesto", "20.1", Some("60".to_string())),
        ]
    );
}

#[test]
fn test_temperature_profile_ignores_humidity_column() {
    let source = CannedSource::new().with_body(ARSO_OBSERVATIONS_URL, ARSO_HTML);
    let config = FeedConfig::for_profile("arso-temperature").expect("registered");
    let records = pipeline::run(&config, &source).expect("page parses");
    assert!(records.iter().all(|r| r.cells().len() == 2));
}

// ---------------------------------------------------------------------------
// List model + render
// ---------------------------------------------------------------------------

#[test]
fn test_edits_flow_through_to_rendered_document() {
    let source = CannedSource::new().with_body(keyed_url(), MARIBOR_JSON);
    let mut list = StationList::from_records(
        pipeline::run(&bikes_feed("jcdecaux-bikes"), &source).expect("parses"),
    );
    let changes = list.subscribe();

    let europark = list.id_at(0).expect("first row");
    let glavni = list.id_at(1).expect("second row");
    let renamed = list
        .get(europark)
        .expect("first row")
        .renamed("EUROPARK <north>");
    list.edit(europark, renamed).expect("known id");
    list.remove(glavni).expect("known id");

    let profile = find_profile("jcdecaux-bikes").expect("registered");
    let html = render::render_document(profile, &list.records()).expect("template renders");
    assert_eq!(
        render::read_table(&html),
        vec![
            vec!["EUROPARK <north>".to_string(), "4".to_string()],
            vec!["STUDENCI".to_string(), "7".to_string()],
        ]
    );
    assert!(html.contains("EUROPARK &lt;north&gt;"));
    assert!(!html.contains("GLAVNI TRG"));

    let seen: Vec<ListChange> = changes.try_iter().collect();
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_script_name_from_feed_is_escaped_in_output() {
    let source = CannedSource::new().with_body(
        keyed_url(),
        r#"[{"name":"<script>alert('x')</script>","totalStands":{"availabilities":{"bikes":1}}}]"#,
    );
    let records = pipeline::run(&bikes_feed("jcdecaux-bikes"), &source).expect("parses");
    let profile = find_profile("jcdecaux-bikes").expect("registered");
    let html = render::render_document(profile, &records).expect("template renders");

    assert!(!html.contains("<script>"));
    assert_eq!(
        render::read_table(&html)[0][0],
        "<script>alert('x')</script>",
        "escaped text must decode back to the original name"
    );
}

// ---------------------------------------------------------------------------
// Background load
// ---------------------------------------------------------------------------

#[test]
fn test_background_load_then_edit_in_session() {
    let source = CannedSource::new().with_body(keyed_url(), MARIBOR_JSON);
    let mut session = Session::new();
    assert!(session.request_load(bikes_feed("jcdecaux-bikes"), Arc::new(source)));
    session.wait();
    assert_eq!(session.state(), &LoadState::Loaded { count: 3 });

    let last = session.list().id_at(2).expect("three rows");
    session
        .list_mut()
        .edit(last, StationRecord::bikes("STUDENCI", 8))
        .expect("known id");
    assert_eq!(
        session.list().get(last).and_then(StationRecord::available_bikes),
        Some(8)
    );
}

#[test]
fn test_background_failure_is_reported_not_swallowed() {
    let source = CannedSource::new();
    let mut session = Session::new();
    session.request_load(bikes_feed("jcdecaux-bikes"), Arc::new(source));
    session.wait();
    assert_eq!(
        session.state(),
        &LoadState::Failed(FetchError::HttpStatus(404).to_string())
    );
}
