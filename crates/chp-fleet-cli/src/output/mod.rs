pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Array fields rendered as their own table, in lookup order.
pub(crate) const ROW_FIELDS: [&str; 3] = ["years", "rows", "matrix"];

/// The first array-of-objects field in `map` listed in [`ROW_FIELDS`].
pub(crate) fn primary_rows(map: &serde_json::Map<String, Value>) -> Option<(&str, &Vec<Value>)> {
    ROW_FIELDS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(arr)) if arr.iter().all(Value::is_object) && !arr.is_empty() => {
            Some((*key, arr))
        }
        _ => None,
    })
}
