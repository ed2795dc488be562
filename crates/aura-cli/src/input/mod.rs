pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a typed command input: `--input` file first, then piped stdin,
/// then whatever the individual flags build.
pub fn resolve<T: DeserializeOwned>(
    path: Option<&str>,
    from_flags: impl FnOnce() -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json(path);
    }
    if let Some(value) = stdin::read_stdin()? {
        return Ok(value);
    }
    from_flags()
}
