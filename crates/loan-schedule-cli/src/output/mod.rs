pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Column order for payment schedule rows.
pub const SCHEDULE_COLUMNS: [&str; 6] = [
    "month",
    "date",
    "payment",
    "interest",
    "principal",
    "remaining_balance",
];

/// Render `value` on stdout in the requested format.
pub fn format_output(format: &OutputFormat, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => json::print_json(value)?,
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value)?,
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    Ok(())
}

/// The `result` object of a computation envelope, or the value itself when
/// it carries no envelope.
pub fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    match map.get("result") {
        Some(Value::Object(result)) => Some(result),
        _ => Some(map),
    }
}

/// The payment schedule inside a result object, if there is one.
pub fn schedule_rows(result: &Map<String, Value>) -> Option<&Vec<Value>> {
    match result.get("schedule") {
        Some(Value::Array(rows)) => Some(rows),
        _ => None,
    }
}

/// One schedule row as cells in [`SCHEDULE_COLUMNS`] order. Extra payments
/// have no month and get an empty first cell.
pub fn schedule_cells(row: &Value) -> Vec<String> {
    SCHEDULE_COLUMNS
        .iter()
        .map(|column| row.get(*column).map(cell).unwrap_or_default())
        .collect()
}

/// Column headers for an array of objects, in first-seen order.
pub fn collect_headers(arr: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for item in arr {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

/// Plain-text rendering of a JSON value for a table or CSV cell.
pub fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
