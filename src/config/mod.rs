//! Configuration management for cmdctl
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values
//!
//! The same file holds the named contexts, clusters and users that dynamic
//! completion lists through `config view -o template`.

pub mod template;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Environment variable overriding `completion.timeout_ms`
pub const ENV_COMPLETION_TIMEOUT: &str = "CMDCTL_COMPLETION_TIMEOUT_MS";

/// Environment variable overriding `logging.level`
pub const ENV_LOG_LEVEL: &str = "CMDCTL_LOG_LEVEL";

/// Upper bound accepted for `completion.timeout_ms`
pub const MAX_TIMEOUT_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the context commands run against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,

    /// Completion configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named contexts
    #[serde(default)]
    pub contexts: Vec<ContextEntry>,

    /// Named clusters
    #[serde(default)]
    pub clusters: Vec<ClusterEntry>,

    /// Named users
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// Completion-related configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Timeout for one dynamic completion lookup, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// File whose contents replace the license header of generated scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boilerplate_file: Option<PathBuf>,

    /// Program re-invoked to list resources (defaults to the running binary)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default)]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// A named combination of cluster, user and namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub name: String,
}

// Default value functions
fn default_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            boilerplate_file: None,
            executable: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file that was named explicitly is an error.
    ///
    /// # Arguments
    /// * `path` - Explicit configuration file, or `None` for [`Config::default_path`]
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Apply environment variable overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment variable overrides read through `lookup`
    ///
    /// Recognised variables are [`ENV_COMPLETION_TIMEOUT`] and [`ENV_LOG_LEVEL`].
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_COMPLETION_TIMEOUT) {
            self.completion.timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: ENV_COMPLETION_TIMEOUT.to_string(),
                        value: raw.clone(),
                    })?;
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = raw.parse()?;
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - `~/.cmdctl/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cmdctl")
            .join("config.toml")
    }

    /// Save configuration to a file, creating parent directories
    ///
    /// # Arguments
    /// * `path` - Path where to save the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// The configuration as a JSON value, the data model of output templates
    pub fn to_template_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_TIMEOUT_MS).contains(&self.completion.timeout_ms) {
            return Err(ConfigError::InvalidValue {
                field: "completion.timeout_ms".to_string(),
                value: self.completion.timeout_ms.to_string(),
            }
            .into());
        }

        check_unique("contexts", self.contexts.iter().map(|c| c.name.as_str()))?;
        check_unique("clusters", self.clusters.iter().map(|c| c.name.as_str()))?;
        check_unique("users", self.users.iter().map(|u| u.name.as_str()))?;

        if let Some(current) = &self.current_context {
            if self.context(current).is_none() {
                return Err(ConfigError::UnknownEntry {
                    section: "contexts".to_string(),
                    name: current.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Get the completion timeout as Duration
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion.timeout_ms)
    }

    pub fn context(&self, name: &str) -> Option<&ContextEntry> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Names of all contexts in file order
    pub fn context_names(&self) -> Vec<&str> {
        self.contexts.iter().map(|c| c.name.as_str()).collect()
    }

    /// Make `name` the current context
    ///
    /// # Arguments
    /// * `name` - Name of an existing context
    ///
    /// # Returns
    /// * `Result<()>` - Ok, or an error if no such context exists
    pub fn use_context(&mut self, name: &str) -> Result<()> {
        if self.context(name).is_none() {
            return Err(ConfigError::UnknownEntry {
                section: "contexts".to_string(),
                name: name.to_string(),
            }
            .into());
        }
        self.current_context = Some(name.to_string());
        Ok(())
    }
}

fn check_unique<'a>(section: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::InvalidValue {
                field: section.to_string(),
                value: format!("duplicate name '{name}'"),
            }
            .into());
        }
    }
    Ok(())
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CmdctlError;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
current_context = "dev"

[completion]
timeout_ms = 500

[logging]
level = "debug"

[[contexts]]
name = "dev"
cluster = "local"
user = "admin"
namespace = "default"

[[contexts]]
name = "prod"
cluster = "east"

[[clusters]]
name = "local"
server = "https://127.0.0.1:6443"

[[clusters]]
name = "east"

[[users]]
name = "admin"
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.completion.timeout_ms, 2000);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(!config.logging.timestamps);
        assert!(config.contexts.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.current_context.as_deref(), Some("dev"));
        assert_eq!(config.completion_timeout(), Duration::from_millis(500));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.context_names(), vec!["dev", "prod"]);
        assert_eq!(config.clusters[0].server.as_deref(), Some("https://127.0.0.1:6443"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml("[logging]\ntimestamps = true\n").unwrap();
        assert!(config.logging.timestamps);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.completion.timeout_ms, 2000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml("[completion\n"),
            Err(CmdctlError::Config(ConfigError::InvalidFormat(_)))
        ));
    }

    #[test]
    fn test_validate_timeout_range() {
        let mut config = Config::default();
        config.completion.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.completion.timeout_ms = MAX_TIMEOUT_MS + 1;
        assert!(config.validate().is_err());
        config.completion.timeout_ms = MAX_TIMEOUT_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_duplicates_and_current_context() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.users.push(UserEntry {
            name: "admin".to_string(),
        });
        assert!(config.validate().is_err());

        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.current_context = Some("staging".to_string());
        assert!(matches!(
            config.validate(),
            Err(CmdctlError::Config(ConfigError::UnknownEntry { .. }))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_COMPLETION_TIMEOUT, "750"), (ENV_LOG_LEVEL, "TRACE")]);
        let mut config = Config::default();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.completion.timeout_ms, 750);
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_env_from(|key| (key == ENV_COMPLETION_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_COMPLETION_TIMEOUT));
    }

    #[test]
    fn test_use_context() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.use_context("prod").unwrap();
        assert_eq!(config.current_context.as_deref(), Some("prod"));
        assert!(config.use_context("nope").is_err());
        assert_eq!(config.current_context.as_deref(), Some("prod"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.use_context("prod").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(Some(path.as_path())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Config::load_from_file(Some(path.as_path())),
            Err(CmdctlError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_template_value() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let value = config.to_template_value().unwrap();
        let out = template::render("{{ range .contexts }}{{ .name }} {{ end }}", &value).unwrap();
        assert_eq!(out, "dev prod ");
        let out = template::render("{{ range .users }}{{ .name }} {{ end }}", &value).unwrap();
        assert_eq!(out, "admin ");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
