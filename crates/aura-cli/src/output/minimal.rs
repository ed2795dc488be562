use serde_json::{Map, Value};

/// Fields that best answer "what happened", in priority order.
const PRIORITY_KEYS: [&str; 9] = [
    "level",
    "score",
    "document_id",
    "status",
    "approval_rate",
    "dscr",
    "display",
    "total",
    "filename",
];

/// Print just the key answer value from the output.
///
/// Looks for a priority field at the top of the result, then one level down
/// in nested objects, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal(value));
}

pub(crate) fn minimal(value: &Value) -> String {
    let result_obj = super::primary(value);

    match result_obj {
        Value::Object(map) => {
            if let Some(val) = find_priority(map) {
                return format_minimal(val);
            }
            match map.iter().next() {
                Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
                None => String::new(),
            }
        }
        Value::Array(arr) => arr.len().to_string(),
        other => format_minimal(other),
    }
}

fn find_priority(map: &Map<String, Value>) -> Option<&Value> {
    direct_priority(map).or_else(|| {
        map.values()
            .filter_map(Value::as_object)
            .find_map(direct_priority)
    })
}

fn direct_priority(map: &Map<String, Value>) -> Option<&Value> {
    PRIORITY_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null() && !v.is_object())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
