use serde_json::Value;
use std::io;

use super::{cell, flatten, primary};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let _ = write_csv(&mut wtr, primary(value));
    let _ = wtr.flush();
}

pub(crate) fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match value {
        Value::Object(map) => {
            // Two-column CSV: field, value
            wtr.write_record(["field", "value"])?;
            for (key, val) in flatten(map) {
                wtr.write_record([key, cell(&val)])?;
            }
        }
        Value::Array(rows) => write_rows(wtr, rows)?,
        other => wtr.write_record([cell(other)])?,
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([cell(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<String> = flatten(first).into_iter().map(|(k, _)| k).collect();
    wtr.write_record(&headers)?;
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
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}
