//! Configuration system for the Manolito server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (port, model endpoint, database, logging)
//! 2. .env file - secrets (database password, model credential)
//!
//! Environment variables always override config.yaml values.

use manolito_mysql::ConnectionSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Language model endpoint (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,

    /// Local deployments ignore it, the client library still wants one
    pub api_key: String,

    /// Sampling temperature for the final answer
    pub answer_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.0.30:1234/v1".to_string(),
            model: "openai/gpt-oss-20b".to_string(),
            api_key: "dummy".to_string(),
            answer_temperature: 0.2,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub database: ConnectionSettings,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file means built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            return Self::load(path);
        }

        tracing::debug!(path = %path.as_ref().display(), "Config file not found, using defaults");
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("MANOLITO_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("MANOLITO_SERVER_PORT") {
            if let Ok(port_num) = port.parse() {
                self.server.port = port_num;
            }
        }

        if let Ok(url) = std::env::var("MANOLITO_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("MANOLITO_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(key) = std::env::var("MANOLITO_LLM_API_KEY") {
            self.llm.api_key = key;
        }

        if let Ok(host) = std::env::var("MANOLITO_DB_HOST") {
            self.database.host = host;
        }
        if let Ok(port) = std::env::var("MANOLITO_DB_PORT") {
            if let Ok(port_num) = port.parse() {
                self.database.port = port_num;
            }
        }
        if let Ok(user) = std::env::var("MANOLITO_DB_USER") {
            self.database.user = user;
        }
        if let Ok(password) = std::env::var("MANOLITO_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Ok(name) = std::env::var("MANOLITO_DB_NAME") {
            self.database.database = name;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.model, "openai/gpt-oss-20b");
        assert_eq!(config.llm.base_url, "http://192.168.0.30:1234/v1");
        assert_eq!(config.llm.api_key, "dummy");
        assert_eq!(config.database.database, "RDP_DAILY");
        assert!(config.database.read_only);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.output, "stdout");
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("MANOLITO_SERVER_PORT", "9090");
        std::env::set_var("MANOLITO_LLM_MODEL", "qwen2.5-coder");

        let config_yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
llm:
  base_url: "http://localhost:1234/v1"
  model: "openai/gpt-oss-20b"
  api_key: "dummy"
  answer_temperature: 0.3
database:
  host: "db.internal"
  port: 3306
  user: "reader"
  password: "reader"
  database: "RDP_DAILY"
"#;
        let temp_file = std::env::temp_dir().join("manolito_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.server.port, 9090); // Overridden
        assert_eq!(config.llm.model, "qwen2.5-coder"); // Overridden
        assert_eq!(config.llm.answer_temperature, 0.3);
        assert_eq!(config.database.host, "db.internal");
        assert!(config.database.read_only); // Omitted, defaults on

        std::env::remove_var("MANOLITO_SERVER_PORT");
        std::env::remove_var("MANOLITO_LLM_MODEL");
        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("manolito_does_not_exist.yaml");
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.database.database, "RDP_DAILY");
        assert_eq!(config.llm.api_key, "dummy");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp_file = std::env::temp_dir().join("manolito_bad_config.yaml");
        std::fs::write(&temp_file, "server: [not, a, map").unwrap();

        let err = Config::load(&temp_file).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));

        std::fs::remove_file(temp_file).ok();
    }
}
