//! Station feed: fetch a bike-station or weather-observation feed, normalize
//! it into ordered records, keep them in an editable list, and render them.
//!
//! Modules, leaf first:
//! - `model` — records and the error taxonomy.
//! - `profiles` — named extraction profiles (endpoint, markers, JSON path).
//! - `ingest` — HTTP retrieval and HTML/JSON extraction.
//! - `pipeline` — one-shot and background fetch.
//! - `list_model` — the editable list with stable record ids.
//! - `session` — applies background results to an owned list.
//! - `render` — HTML document, console table, browser launch.
//! - `db` — optional batch insert into `stations`.
//! - `config`, `logging` — ambient concerns.

pub mod config;
pub mod db;
pub mod ingest;
pub mod list_model;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod profiles;
pub mod render;
pub mod session;
