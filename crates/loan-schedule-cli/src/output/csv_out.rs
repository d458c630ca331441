use serde_json::Value;
use std::io::{self, Write};

use super::{cell, result_object, schedule_cells, schedule_rows, SCHEDULE_COLUMNS};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) -> csv::Result<()> {
    write_csv(io::stdout().lock(), value)
}

/// Schedules become one row per payment record; anything else is written
/// as `field,value` pairs of its top-level scalars.
pub fn write_csv<W: Write>(writer: W, value: &Value) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    match result_object(value) {
        Some(result) => {
            if let Some(rows) = schedule_rows(result) {
                wtr.write_record(SCHEDULE_COLUMNS)?;
                for row in rows {
                    wtr.write_record(schedule_cells(row))?;
                }
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in result.iter().filter(|(_, v)| !v.is_object()) {
                    wtr.write_record([key.as_str(), &cell(val)])?;
                }
            }
        }
        None => wtr.write_record([cell(value)])?,
    }

    wtr.flush()?;
    Ok(())
}
