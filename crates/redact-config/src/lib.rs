use redact_core::{CommitPolicy, ExportFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for redact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// `optimistic` or `staged`
    #[serde(default)]
    pub commit_policy: CommitPolicy,

    #[serde(default = "default_mask_char")]
    pub mask_char: char,

    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// `docx` or `pdf`
    #[serde(default)]
    pub format: ExportFormat,

    /// Where exported files are written (current directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            backend: BackendConfig::default(),
            session: SessionConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            commit_policy: CommitPolicy::default(),
            mask_char: default_mask_char(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            output_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("redact/{}", env!("CARGO_PKG_VERSION"))
}

fn default_mask_char() -> char {
    '█'
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["docx".to_string()]
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it does not exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "redact", "redact") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.redact/config.toml")
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend.timeout_secs must be greater than zero");
        }
        if self.session.allowed_extensions.is_empty() {
            anyhow::bail!("session.allowed_extensions must name at least one extension");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.session.mask_char, '█');
        assert_eq!(config.session.commit_policy, CommitPolicy::Optimistic);
        assert_eq!(config.session.allowed_extensions, vec!["docx".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend.base_url, config.backend.base_url);
        assert_eq!(parsed.session.mask_char, config.session.mask_char);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
[backend]
base_url = "https://redact.example.com/api"

[session]
commit_policy = "staged"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.base_url, "https://redact.example.com/api");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.session.commit_policy, CommitPolicy::Staged);
        assert_eq!(config.export.format, ExportFormat::Docx);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_unknown_policy_or_format_fails_to_parse() {
        assert!(toml::from_str::<Config>("[session]\ncommit_policy = \"eventually\"\n").is_err());
        assert!(toml::from_str::<Config>("[export]\nformat = \"odt\"\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.allowed_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.export.format, ExportFormat::Docx);

        std::fs::write(&path, "[export]\nformat = \"pdf\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.export.format, ExportFormat::Pdf);
    }
}
