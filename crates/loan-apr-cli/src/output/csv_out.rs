use serde_json::{Map, Value};
use std::io;

use super::{display_value, report_sections};

/// Write output as CSV to stdout.
///
/// Loan reports become `section,field,value` rows; anything else is a
/// two-column `field,value` listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some((summary, detail)) = report_sections(value) {
        let _ = wtr.write_record(["section", "field", "value"]);
        write_section(&mut wtr, "summary", summary);
        write_section(&mut wtr, "detail", detail);
    } else if let Value::Object(map) = value {
        let fields = match map.get("result") {
            Some(Value::Object(result)) => result,
            _ => map,
        };
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in fields {
            let _ = wtr.write_record([key.as_str(), &display_value(val)]);
        }
    } else {
        let _ = wtr.write_record([&display_value(value)]);
    }

    let _ = wtr.flush();
}

fn write_section<W: io::Write>(wtr: &mut csv::Writer<W>, section: &str, fields: &Map<String, Value>) {
    for (key, val) in fields {
        let _ = wtr.write_record([section, key.as_str(), &display_value(val)]);
    }
}
