use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, collect_headers, result_object, schedule_cells, schedule_rows, SCHEDULE_COLUMNS};

/// Print a result as tables: the payment schedule first, then headline
/// fields, then one table per nested section.
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", cell(value));
        return;
    };

    if let Some(rows) = schedule_rows(result) {
        println!("{}\n", schedule_table(rows));
    }

    let scalars: Vec<(&String, &Value)> = result
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .collect();
    if !scalars.is_empty() {
        println!("{}", field_table(scalars));
    }

    for (section, val) in result {
        match val {
            Value::Object(fields) => {
                println!("\n{}:", section.bold());
                println!("{}", field_table(fields.iter().collect()));
            }
            Value::Array(items) if section != "schedule" => {
                println!("\n{}:", section.bold());
                println!("{}", rows_table(items));
            }
            _ => {}
        }
    }

    if let Some(envelope) = value.as_object() {
        print_notes(envelope);
    }
}

fn schedule_table(rows: &[Value]) -> Table {
    let mut builder = Builder::default();
    builder.push_record(SCHEDULE_COLUMNS);
    for row in rows {
        builder.push_record(schedule_cells(row));
    }
    builder.build()
}

fn field_table(fields: Vec<(&String, &Value)>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.clone(), cell(val)]);
    }
    builder.build()
}

/// Arrays of objects (such as a session's updates) get one column per key.
fn rows_table(items: &[Value]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    let headers = collect_headers(items);
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in items {
        builder.push_record(
            headers
                .iter()
                .map(|h| item.get(h.as_str()).map(cell).unwrap_or_default()),
        );
    }
    builder.build().to_string()
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}
