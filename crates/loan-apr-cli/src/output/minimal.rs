use serde_json::Value;

use super::{display_value, report_sections, ERROR_KEY};

/// Print just the key answer value from the output.
///
/// The APR for loan reports and envelopes, the rate for a bare solve, the
/// message for an error, otherwise the first field.
pub fn print_minimal(value: &Value) {
    if let Some((summary, _)) = report_sections(value) {
        if let Some(apr) = summary.get("APR") {
            println!("{}", display_value(apr));
            return;
        }
    }

    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [ERROR_KEY, "apr", "rate"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", display_value(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, display_value(val));
            return;
        }
    }

    println!("{}", display_value(result_obj));
}
