//! Tool runner configuration
//!
//! Sources, lowest to highest priority: built-in defaults, a TOML file
//! (`--config` or `~/.toolrunner/config.toml` when present), environment
//! variables, and finally CLI flags applied by the binary.

use crate::errors::ToolError;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default read and execution deadline
pub const DEFAULT_DEADLINE_MS: u64 = 15_000;

/// Default bounded write chunk (64 KiB)
pub const DEFAULT_WRITE_CHUNK_SIZE: usize = 64 * 1024;

pub const ENV_READ_TIMEOUT_MS: &str = "TOOLRUNNER_READ_TIMEOUT_MS";
pub const ENV_EXEC_TIMEOUT_MS: &str = "TOOLRUNNER_EXEC_TIMEOUT_MS";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// Deadlines and output framing for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub read_timeout_ms: u64,
    pub exec_timeout_ms: u64,
    pub write_chunk_size: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_DEADLINE_MS,
            exec_timeout_ms: DEFAULT_DEADLINE_MS,
            write_chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
        }
    }
}

impl RunnerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_millis(self.exec_timeout_ms)
    }

    /// Set read deadline
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set execution deadline
    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout_ms = timeout.as_millis() as u64;
        self
    }
}

/// HTTP client and connection pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    pub pool_idle_timeout_ms: u64,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("toolrunner/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_ms: 5_000,
            pool_idle_timeout_ms: 1_000,
            max_body_bytes: 20 * 1024 * 1024, // 20MB
        }
    }
}

/// Chat-completions endpoint used by the summarize and translate tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or from the default
    /// location when it exists, then apply environment overrides.
    ///
    /// Tool processes never create the default file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Ok(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Config::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".toolrunner").join("config.toml"))
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_READ_TIMEOUT_MS) {
            self.runner.read_timeout_ms = parse_millis(ENV_READ_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EXEC_TIMEOUT_MS) {
            self.runner.exec_timeout_ms = parse_millis(ENV_EXEC_TIMEOUT_MS, &raw)?;
        }
        if let Some(url) = lookup(ENV_OPENAI_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.openai.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup(ENV_OPENAI_MODEL).filter(|v| !v.trim().is_empty()) {
            self.openai.model = model.trim().to_string();
        }
        Ok(())
    }

    /// Reject settings that would make an invocation unable to finish
    pub fn validate(&self) -> Result<()> {
        if self.runner.read_timeout_ms == 0 {
            bail!("runner.read_timeout_ms must be greater than zero");
        }
        if self.runner.exec_timeout_ms == 0 {
            bail!("runner.exec_timeout_ms must be greater than zero");
        }
        if self.runner.write_chunk_size == 0 {
            bail!("runner.write_chunk_size must be greater than zero");
        }
        if self.http.max_body_bytes == 0 {
            bail!("http.max_body_bytes must be greater than zero");
        }
        Ok(())
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of milliseconds, got {:?}", key, raw))
}

/// Third-party credentials, captured once at process start
#[derive(Clone, Default)]
pub struct Credentials {
    openai_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var(ENV_OPENAI_API_KEY)
                .ok()
                .filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// The OpenAI key, or an `INPUT_INVALID` error naming the missing variable
    pub fn openai_api_key(&self) -> std::result::Result<&str, ToolError> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            ToolError::input_invalid(format!("{} is not set", ENV_OPENAI_API_KEY))
                .with_details(serde_json::json!({ "env": ENV_OPENAI_API_KEY }))
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.runner.read_timeout(), Duration::from_secs(15));
        assert_eq!(config.runner.exec_timeout(), Duration::from_secs(15));
        assert_eq!(config.runner.write_chunk_size, 65_536);
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [runner]
            exec_timeout_ms = 2500

            [openai]
            model = "gpt-4o"
            "#,
        )
        .unwrap();

        assert_eq!(config.runner.exec_timeout_ms, 2500);
        assert_eq!(config.runner.read_timeout_ms, DEFAULT_DEADLINE_MS);
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner]\nread_timeout_ms = 100\nwrite_chunk_size = 16").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.runner.read_timeout_ms, 100);
        assert_eq!(config.runner.write_chunk_size, 16);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_READ_TIMEOUT_MS, "250"),
            (ENV_EXEC_TIMEOUT_MS, " 750 "),
            (ENV_OPENAI_BASE_URL, "http://127.0.0.1:9999/v1/"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.runner.read_timeout_ms, 250);
        assert_eq!(config.runner.exec_timeout_ms, 750);
        assert_eq!(config.openai.base_url, "http://127.0.0.1:9999/v1");
        assert_eq!(config.openai.model, "gpt-4o-mini");
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = Config::default();
        let result = config.apply_env(|key| {
            (key == ENV_EXEC_TIMEOUT_MS).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let mut config = Config::default();
        config.runner.exec_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_key_is_input_invalid() {
        let creds = Credentials::default();
        let err = creds.openai_api_key().unwrap_err();

        assert_eq!(err.code, ErrorCode::InputInvalid);
        assert_eq!(err.details.unwrap()["env"], ENV_OPENAI_API_KEY);

        let creds = Credentials::default().with_openai_api_key("sk-test");
        assert_eq!(creds.openai_api_key().unwrap(), "sk-test");
        assert!(!format!("{:?}", creds).contains("sk-test"));
    }
}
