/// Bike-station JSON extraction.
///
/// The JCDecaux v3 station list is an array of objects. Each kept element
/// contributes its `name` and one integer reached through the profile's
/// fixed path, e.g.:
///
/// ```json
/// [{"name": "A", "totalStands": {"availabilities": {"bikes": 4, "stands": 3}}}]
/// ```

use serde_json::Value;

use crate::ingest::Extraction;
use crate::model::{ParseError, StationRecord};
use crate::profiles::MissingFieldPolicy;

/// Reads a count the way lenient JSON consumers do: integers, whole-valued
/// floats (`3.0`) and numeric strings (`"4"`, `" 4 "`, `"4.0"`).
fn as_count(leaf: &Value) -> Option<i64> {
    match leaf {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
}

fn whole_number(x: f64) -> Option<i64> {
    let in_range = x >= i64::MIN as f64 && x < i64::MAX as f64;
    (x.is_finite() && x.fract() == 0.0 && in_range).then_some(x as i64)
}

/// Follows `path` through nested objects and reads the leaf as a count.
fn integer_at(element: &Value, path: &[&str]) -> Option<i64> {
    path.iter()
        .try_fold(element, |node, key| node.get(*key))
        .and_then(as_count)
}

pub fn parse_station_array(
    body: &str,
    count_path: &[&str],
    policy: MissingFieldPolicy,
) -> Result<Extraction, ParseError> {
    let json: Value = serde_json::from_str(body).map_err(|e| ParseError::Json(e.to_string()))?;
    let elements = json.as_array().ok_or(ParseError::NotAnArray)?;

    let mut extraction = Extraction::default();

    for (index, element) in elements.iter().enumerate() {
        let name = element.get("name").and_then(Value::as_str);
        let count = integer_at(element, count_path);

        match (name, count) {
            (Some(name), Some(count)) => {
                // NUL has no representation in an HTML document.
                let name = name.replace('\0', "");
                extraction.records.push(StationRecord::bikes(name, count));
            }
            (name, _) => {
                if policy == MissingFieldPolicy::Fail {
                    let field = if name.is_none() {
                        "name".to_string()
                    } else {
                        count_path.join(".")
                    };
                    return Err(ParseError::MissingField { index, field });
                }
                extraction.skipped += 1;
            }
        }
    }

    Ok(extraction)
}

// ============================================================================
// Tests
// ============================================================================
