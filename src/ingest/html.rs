/// Observation table scraping.
///
/// Walks every `tr` of the document and keeps the rows that carry both the
/// name marker and the temperature marker. Everything else on the page
/// (headers, spacer rows, legend tables) simply does not match.

use scraper::{ElementRef, Html, Selector};

use crate::ingest::Extraction;
use crate::model::{ParseError, StationRecord};
use crate::profiles::{HtmlMarkers, MissingFieldPolicy};

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::InvalidSelector(css.to_string()))
}

/// Text of the first element under `row` matching `sel`, whitespace
/// collapsed and trimmed.
fn cell_text(row: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    row.select(sel).next().map(|cell| {
        let raw: String = cell.text().collect();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    })
}

/// Parses an observation page into weather records in document order.
///
/// Under `Skip`, any row missing a required marker is dropped. Under `Fail`,
/// a row that has exactly one of the two required markers is an error; rows
/// with neither are layout rows and are still ignored.
pub fn parse_observation_table(
    body: &str,
    markers: &HtmlMarkers,
    policy: MissingFieldPolicy,
) -> Result<Extraction, ParseError> {
    let document = Html::parse_document(body);
    let row_sel = selector("tr")?;
    let name_sel = selector(markers.name)?;
    let temp_sel = selector(markers.temperature)?;
    let humidity_sel = markers.humidity.map(selector).transpose()?;

    let mut extraction = Extraction::default();
    let mut saw_row = false;

    for (index, row) in document.select(&row_sel).enumerate() {
        saw_row = true;
        let name = cell_text(&row, &name_sel);
        let temperature = cell_text(&row, &temp_sel);

        match (name, temperature) {
            (Some(name), Some(temperature)) => {
                let humidity = humidity_sel.as_ref().and_then(|sel| cell_text(&row, sel));
                extraction
                    .records
                    .push(StationRecord::weather(name, temperature, humidity));
            }
            (None, None) => extraction.skipped += 1,
            (Some(_), None) if policy == MissingFieldPolicy::Fail => {
                return Err(ParseError::MissingField {
                    index,
                    field: markers.temperature.to_string(),
                });
            }
            (None, Some(_)) if policy == MissingFieldPolicy::Fail => {
                return Err(ParseError::MissingField {
                    index,
                    field: markers.name.to_string(),
                });
            }
            _ => extraction.skipped += 1,
        }
    }

    if !saw_row {
        return Err(ParseError::NoTableRows);
    }
    Ok(extraction)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MARKERS: HtmlMarkers = HtmlMarkers {
        name: "td.meteoSI-th",
        temperature: "td.t",
        humidity: Some("td.rh"),
    };

    const TEMP_ONLY: HtmlMarkers = HtmlMarkers {
        name: "td.meteoSI-th",
        temperature: "td.t",
        humidity: None,
    };

    fn page(rows: &str) -> String {
        format!(
            "<html><body><table><tr><th>Postaja</th><th>T</th></tr>{}</table></body></html>",
            rows
        )
    }

    #[test]
    fn test_well_formed_rows_are_returned_in_document_order() {
        let body = page(
            "<tr><td class=\"meteoSI-th\">Ljubljana</td><td class=\"t\">19.8</td><td class=\"rh\">55</td></tr>\
             <tr><td class=\"meteoSI-th\">Maribor</td><td class=\"t\">21.3</td><td class=\"rh\">48</td></tr>",
        );
        let out = parse_observation_table(&body, &MARKERS, MissingFieldPolicy::Skip)
            .expect("page should parse");
        assert_eq!(
            out.records,
            vec![
                StationRecord::weather("Ljubljana", "19.8", Some("55".to_string())),
                StationRecord::weather("Maribor", "21.3", Some("48".to_string())),
            ]
        );
    }

    #[test]
    fn test_n_good_rows_and_m_malformed_rows_yield_n_records() {
        let good = "<tr><td class=\"meteoSI-th\">Postaja</td><td class=\"t\">10.0</td></tr>";
        let bad = "<tr><td class=\"meteoSI-th\">Brez</td><td>10.0</td></tr>";
        for (n, m) in [(0, 3), (1, 0), (3, 2), (5, 5)] {
            let rows = format!("{}{}", good.repeat(n), bad.repeat(m));
            let out = parse_observation_table(&page(&rows), &TEMP_ONLY, MissingFieldPolicy::Skip)
                .expect("page should parse");
            assert_eq!(out.records.len(), n, "n={} m={}", n, m);
        }
    }

    #[test]
    fn test_value_cell_without_class_marker_excludes_the_row() {
        let body = page("<tr><td class=\"meteoSI-th\">Maribor</td><td>21.3</td></tr>");
        let out = parse_observation_table(&body, &TEMP_ONLY, MissingFieldPolicy::Skip)
            .expect("page should parse");
        assert!(out.records.is_empty());
    }

    #[test]
    fn test_cell_text_is_trimmed_and_whitespace_collapsed() {
        let body = page(
            "<tr><td class=\"meteoSI-th\">\n   Murska   Sobota \n</td><td class=\"t\">  17.2 </td></tr>",
        );
        let out = parse_observation_table(&body, &TEMP_ONLY, MissingFieldPolicy::Skip)
            .expect("page should parse");
        assert_eq!(out.records[0].name, "Murska Sobota");
        assert_eq!(out.records[0].cells()[1], "17.2");
    }

    #[test]
    fn test_missing_humidity_is_tolerated() {
        let body = page("<tr><td class=\"meteoSI-th\">Kredarica</td><td class=\"t\">-2.1</td></tr>");
        let out = parse_observation_table(&body, &MARKERS, MissingFieldPolicy::Skip)
            .expect("page should parse");
        assert_eq!(out.records, vec![StationRecord::weather("Kredarica", "-2.1", None)]);
    }

    #[test]
    fn test_nested_markup_in_cells_contributes_text() {
        let body = page(
            "<tr><td class=\"meteoSI-th\"><a href=\"#\">Nova <b>Gorica</b></a></td><td class=\"t\">23.0</td></tr>",
        );
        let out = parse_observation_table(&body, &TEMP_ONLY, MissingFieldPolicy::Skip)
            .expect("page should parse");
        assert_eq!(out.records[0].name, "Nova Gorica");
    }

    #[test]
    fn test_strict_policy_rejects_half_marked_rows() {
        let body = page("<tr><td class=\"meteoSI-th\">Maribor</td><td>21.3</td></tr>");
        let result = parse_observation_table(&body, &TEMP_ONLY, MissingFieldPolicy::Fail);
        assert_eq!(
            result,
            Err(ParseError::MissingField {
                index: 1,
                field: "td.t".to_string(),
            })
        );
    }

    #[test]
    fn test_strict_policy_still_ignores_layout_rows() {
        let body = page("<tr><td class=\"meteoSI-th\">Bled</td><td class=\"t\">15.5</td></tr>");
        let out = parse_observation_table(&body, &TEMP_ONLY, MissingFieldPolicy::Fail)
            .expect("header row has neither marker");
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn test_document_without_rows_is_a_parse_error() {
        let result = parse_observation_table(
            "<html><body><p>Vzdrževanje</p></body></html>",
            &TEMP_ONLY,
            MissingFieldPolicy::Skip,
        );
        assert_eq!(result, Err(ParseError::NoTableRows));
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let broken = HtmlMarkers {
            name: "td..",
            temperature: "td.t",
            humidity: None,
        };
        let result = parse_observation_table(&page(""), &broken, MissingFieldPolicy::Skip);
        assert_eq!(result, Err(ParseError::InvalidSelector("td..".to_string())));
    }
}
