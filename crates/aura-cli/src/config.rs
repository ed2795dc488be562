use std::fs;
use std::path::{Path, PathBuf};

use aura_core::explain::openai::OpenAiSettings;
use aura_core::identity::UserAccount;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "aura.yaml";

/// Contents of `aura.yaml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub users: Vec<UserAccount>,
}

impl Config {
    /// Load from an explicit path, or from `./aura.yaml` if it exists.
    /// An explicit path that does not exist is an error; a missing default
    /// file gives the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG), false),
        };
        if !path.exists() {
            if explicit {
                return Err(format!("Config file not found: {}", path.display()).into());
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        Self::from_yaml(&contents).map_err(|e| format!("Failed to parse '{}': {}", path.display(), e).into())
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl LoggingConfig {
    /// Install the global subscriber. Logs go to stderr so stdout carries
    /// only command output. `RUST_LOG` overrides the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "pretty".into(),
        }
    }
}

/// Assisted explanations. Off unless enabled; the key comes from
/// `OPENAI_API_KEY`, never from this file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub settings: OpenAiSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub audit_log: PathBuf,
    pub approvals: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audit_log: PathBuf::from("data/audit_log.json"),
            approvals: PathBuf::from("data/approvals.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.storage.audit_log, PathBuf::from("data/audit_log.json"));
        assert!(!config.llm.enabled);
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_full_file() {
        let yaml = r#"
logging:
  level: debug
  format: json
llm:
  enabled: true
  model: gpt-4o
  max_tokens: 800
storage:
  audit_log: /var/lib/aura/audit.json
users:
  - username: manager
    password: manager123
    role: Manager
    full_name: Morgan Manager
    email: manager@bank.example
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.logging.format, "json");
        assert!(config.llm.enabled);
        assert_eq!(config.llm.settings.model, "gpt-4o");
        assert_eq!(config.llm.settings.max_tokens, 800);
        assert_eq!(config.llm.settings.timeout_secs, 30);
        assert_eq!(config.storage.audit_log, PathBuf::from("/var/lib/aura/audit.json"));
        assert_eq!(config.storage.approvals, PathBuf::from("data/approvals.json"));
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].display_name, "Morgan Manager");
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aura.yaml");
        fs::write(&path, "logging:\n  level: info\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }
}
