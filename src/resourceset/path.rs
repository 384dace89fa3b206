//! Dotted-path extraction over raw resource property documents.
//!
//! Synthesis rules address the API body with fixed paths such as
//! `properties.storageProfile.dataDisks.#.managedDisk.id`. A `#` segment
//! projects the remainder of the path across every element of an array;
//! a numeric segment indexes into an array. A missing path yields no
//! values, never an error.

use serde_json::Value;

/// Collect the string values reachable at `path` within `doc`.
/// Non-string leaves are ignored.
pub fn extract_strings(doc: &Value, path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    collect(doc, &segments, &mut out);
    out
}

fn collect(value: &Value, segments: &[&str], out: &mut Vec<String>) {
    let Some((head, rest)) = segments.split_first() else {
        if let Value::String(s) = value {
            out.push(s.clone());
        }
        return;
    };

    match *head {
        "#" => {
            if let Value::Array(items) = value {
                for item in items {
                    collect(item, rest, out);
                }
            }
        }
        segment => {
            let next = match value {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => {
                    segment.parse::<usize>().ok().and_then(|index| items.get(index))
                }
                _ => None,
            };
            if let Some(next) = next {
                collect(next, rest, out);
            }
        }
    }
}
