//! Configuration management for Poliqa
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{PoliqaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Poliqa
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Answering service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Conversation storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Answering service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the answering service
    #[serde(default = "default_service_url")]
    pub url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_service_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Conversation storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the chat database path; defaults to the user's data dir
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file with env and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged, so a fresh install works without any setup.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            service: ServiceConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PoliqaError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| PoliqaError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("POLIQA_SERVICE_URL") {
            self.service.url = url;
        }

        if let Ok(timeout) = std::env::var("POLIQA_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.service.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid POLIQA_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(db_path) = std::env::var("POLIQA_CHAT_DB") {
            self.storage.db_path = Some(db_path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.service_url {
            self.service.url = url.clone();
        }
        if let Some(path) = &cli.storage_path {
            self.storage.db_path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.service.url.is_empty() {
            return Err(PoliqaError::Config("service.url cannot be empty".to_string()).into());
        }

        if !self.service.url.starts_with("http://") && !self.service.url.starts_with("https://") {
            return Err(PoliqaError::Config(format!(
                "service.url must be an http(s) URL, got: {}",
                self.service.url
            ))
            .into());
        }

        if self.service.timeout_seconds == 0 {
            return Err(
                PoliqaError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}
