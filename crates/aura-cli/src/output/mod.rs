pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The object a tabular formatter should lay out: the `result` of a
/// computation envelope, otherwise the value itself.
pub(crate) fn primary(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Flatten nested objects into dotted keys, e.g. `assessment.score`.
/// Arrays stay as single cells.
pub(crate) fn flatten(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut rows = Vec::new();
    flatten_into("", map, &mut rows);
    rows
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&name, inner, rows),
            other => rows.push((name, other.clone())),
        }
    }
}

/// Single-cell rendering shared by the table and CSV writers.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(cell).collect::<Vec<_>>().join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
