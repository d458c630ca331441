use serde_json::Value;

use super::{cell, result_object};

/// Fields that answer a command on their own, most specific first.
const HEADLINE_FIELDS: [&str; 3] = ["monthly_payment", "cleared", "id"];

/// Print the single value that answers the command.
///
/// A schedule with updates applied answers with its payoff date; otherwise
/// the first headline field present is printed.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let Some(result) = result_object(value) else {
        return cell(value);
    };

    if result.get("savings").is_some_and(|s| !s.is_null()) {
        if let Some(date) = result
            .get("summary")
            .and_then(|s| s.get("payoff_date"))
            .and_then(Value::as_str)
        {
            return date.to_string();
        }
    }

    HEADLINE_FIELDS
        .iter()
        .filter_map(|key| result.get(*key))
        .find(|v| !v.is_null())
        .map(cell)
        .or_else(|| result.iter().next().map(|(k, v)| format!("{}: {}", k, cell(v))))
        .unwrap_or_default()
}
