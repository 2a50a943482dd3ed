use serde_json::Value;
use std::io;

use super::primary_rows;

/// Write output as CSV to stdout.
///
/// A result carrying per-year or per-parameter rows is written as one CSV
/// row per record; anything else as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    write_csv(&mut wtr, value);
    let _ = wtr.flush();
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) {
    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            if let Some((_, rows)) = primary_rows(body) {
                write_array_csv(wtr, rows);
            } else if let Some(Value::Array(matrix)) = body.get("matrix") {
                write_matrix_csv(wtr, body, matrix);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in body {
                    let formatted = format_csv_value(val);
                    let _ = wtr.write_record([key.as_str(), formatted.as_str()]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([format_csv_value(value)]);
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([format_csv_value(item)]);
        }
    }
}

/// Long format: one (variable_1, variable_2, npv) row per grid cell.
fn write_matrix_csv<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    body: &serde_json::Map<String, Value>,
    matrix: &[Value],
) {
    let empty = Vec::new();
    let v1 = body
        .get("variable_1_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let v2 = body
        .get("variable_2_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let _ = wtr.write_record(["variable_1", "variable_2", "npv"]);
    for (x, row) in v1.iter().zip(matrix) {
        let cells = row.as_array().unwrap_or(&empty);
        for (y, npv) in v2.iter().zip(cells) {
            let _ = wtr.write_record([
                format_csv_value(x),
                format_csv_value(y),
                format_csv_value(npv),
            ]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
