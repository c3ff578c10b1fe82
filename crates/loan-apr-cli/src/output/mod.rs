pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Key of the single-entry mapping a failed loan computation renders as.
pub const ERROR_KEY: &str = "Error";

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The summary and detail mappings of a loan report, if `value` is one.
pub fn report_sections(value: &Value) -> Option<(&Map<String, Value>, &Map<String, Value>)> {
    let map = value.as_object()?;
    match (map.get("summary"), map.get("detail")) {
        (Some(Value::Object(summary)), Some(Value::Object(detail))) => Some((summary, detail)),
        _ => None,
    }
}

/// Render a scalar for display; nested values fall back to compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
