use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{display_value, report_sections};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some((summary, detail)) = report_sections(value) {
        print_report(summary, detail);
        return;
    }

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_envelope(result, map),
            _ => print_fields(map),
        },
        _ => println!("{}", display_value(value)),
    }
}

/// Headline figures side by side, then the breakdown one per row.
fn print_report(summary: &Map<String, Value>, detail: &Map<String, Value>) {
    println!("Results");
    let mut builder = Builder::default();
    builder.push_record(summary.keys().cloned());
    builder.push_record(summary.values().map(display_value));
    println!("{}", Table::from(builder));

    println!("\nDetailed Breakdown");
    print_fields(detail);
}

fn print_envelope(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    print_fields(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.clone(), display_value(val)]);
    }
    println!("{}", Table::from(builder));
}
