use serde_json::Value;
use std::io::{self, Write};

/// Pretty JSON on stdout, newline-terminated so output can be piped to `jq`.
pub fn print_json(value: &Value) {
    if let Err(e) = write_json(&mut io::stdout().lock(), value) {
        eprintln!("JSON output error: {}", e);
    }
}

pub(crate) fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trailing_newline() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"status": "Pending"})).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\n  \"status\": \"Pending\"\n}\n");
    }
}
