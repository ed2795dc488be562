use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, flatten, primary};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match primary(value) {
        Value::Object(map) => print_fields(map),
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", cell(other)),
    }

    let Some(envelope) = value.as_object() else {
        return;
    };
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
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
    for (key, val) in flatten(map) {
        builder.push_record([key, cell(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            println!("{}", cell(item));
        }
        return;
    };

    let headers: Vec<String> = flatten(first).into_iter().map(|(k, _)| k).collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in rows {
        if let Value::Object(map) = item {
            let flat = flatten(map);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    flat.iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| cell(v))
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}
