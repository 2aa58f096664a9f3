/// Output surfaces for a finished record list: a static HTML document, the
/// console table, and a best-effort "open it in the browser".
///
/// The document is an askama template, so every interpolated value is
/// HTML-escaped; station names come from a third-party feed and are not
/// trusted.

use askama::Template;
use scraper::{Html, Selector};
use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

use crate::logging::{self, DataSource};
use crate::model::StationRecord;
use crate::profiles::ExtractionProfile;

// ---------------------------------------------------------------------------
// HTML document
// ---------------------------------------------------------------------------

/// `templates/output.html`. Every interpolated value is HTML-escaped.
#[derive(Template)]
#[template(path = "output.html")]
struct DocumentTemplate<'a> {
    title: &'a str,
    columns: &'a [&'a str],
    rows: Vec<Vec<String>>,
}

mod filters {
    /// Writes carriage returns as `&#13;`; HTML parsers fold a literal CR
    /// into LF.
    pub fn keep_cr<T: std::fmt::Display>(s: T) -> askama::Result<String> {
        Ok(s.to_string().replace('\r', "&#13;"))
    }
}

/// Pads record cells to the profile's column count so every row has the
/// same shape (a weather record without humidity still gets its cell).
fn row_cells(profile: &ExtractionProfile, record: &StationRecord) -> Vec<String> {
    let mut cells = record.cells();
    cells.resize(profile.columns.len().max(cells.len()), String::new());
    cells
}

pub fn render_document(
    profile: &ExtractionProfile,
    records: &[StationRecord],
) -> Result<String, askama::Error> {
    DocumentTemplate {
        title: profile.description,
        columns: profile.columns,
        rows: records.iter().map(|r| row_cells(profile, r)).collect(),
    }
    .render()
}

/// Writes the document as UTF-8, creating parent directories as needed.
pub fn write_document(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    logging::info(
        DataSource::Render,
        None,
        &format!("Data written to {}", path.display()),
    );
    Ok(())
}

/// Reads back the body rows of a rendered document as cell text.
pub fn read_table(html: &str) -> Vec<Vec<String>> {
    let document = Html::parse_document(html);
    let (Ok(row_sel), Ok(cell_sel)) = (Selector::parse("tbody tr"), Selector::parse("td")) else {
        return Vec::new();
    };

    document
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| cell.text().collect::<String>())
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Console table
// ---------------------------------------------------------------------------

const RULE: &str = "----------------------------------------";

/// Fixed-width console table: 25-column name, then the value columns.
pub fn render_text_table(profile: &ExtractionProfile, records: &[StationRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", profile.description);
    let _ = writeln!(out, "{}", RULE);

    let (name_col, value_cols) = profile.columns.split_first().unwrap_or((&"", &[]));
    let _ = writeln!(out, "{:<25}{}", name_col, value_cols.join("  "));
    let _ = writeln!(out, "{}", RULE);

    for record in records {
        let cells = row_cells(profile, record);
        let (name, values) = cells.split_first().map_or(("", &[][..]), |(n, v)| (n.as_str(), v));
        let _ = writeln!(out, "{:<25}{}", name, values.join("  "));
    }
    let _ = writeln!(out, "{}", RULE);
    out
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

/// Asks the desktop to open `path`. Fire-and-forget: a failure to launch is
/// logged and otherwise ignored.
pub fn open_in_browser(path: &Path) {
    let target = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    let spawned = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", ""]).arg(&target).spawn()
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(&target).spawn()
    } else {
        Command::new("xdg-open").arg(&target).spawn()
    };

    if let Err(e) = spawned {
        logging::warn(
            DataSource::Render,
            None,
            &format!("Could not open {} in a browser: {}", target.display(), e),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
