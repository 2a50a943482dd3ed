use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::primary_rows;

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go in a Field/Value table. The per-year or
/// per-parameter rows get a table of their own, and an NPV grid is drawn
/// as a matrix.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map, &[]);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        let rows = primary_rows(res_map);
        let grid = grid_table(res_map);

        let mut skip: Vec<&str> = Vec::new();
        if let Some((key, _)) = rows {
            skip.push(key);
        }
        if grid.is_some() {
            skip.extend(["matrix", "variable_1_values", "variable_2_values"]);
        }
        print_flat_object(res_map, &skip);

        if let Some((key, arr)) = rows {
            println!("\n{}:", key);
            print_array_table(arr);
        }
        if let Some(table) = grid {
            println!("\nNPV grid:");
            println!("{}", table);
        }
    } else {
        print_flat_object(envelope, &[]);
    }

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

fn print_flat_object(map: &Map<String, Value>, skip: &[&str]) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if skip.contains(&key.as_str()) {
            continue;
        }
        let formatted = format_value(val);
        builder.push_record([key.as_str(), formatted.as_str()]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Matrix view of an NPV grid: variable_1 down the side, variable_2 across.
fn grid_table(res_map: &Map<String, Value>) -> Option<Table> {
    let matrix = res_map.get("matrix")?.as_array()?;
    let v1 = res_map.get("variable_1_values")?.as_array()?;
    let v2 = res_map.get("variable_2_values")?.as_array()?;

    let corner = format!(
        "{} \\ {}",
        res_map.get("variable_1").map(format_value).unwrap_or_default(),
        res_map.get("variable_2").map(format_value).unwrap_or_default()
    );

    let mut builder = Builder::default();
    builder.push_record(std::iter::once(corner).chain(v2.iter().map(format_value)));
    for (label, row) in v1.iter().zip(matrix) {
        let cells = row.as_array()?;
        builder.push_record(std::iter::once(format_value(label)).chain(cells.iter().map(format_value)));
    }
    Some(Table::from(builder))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
