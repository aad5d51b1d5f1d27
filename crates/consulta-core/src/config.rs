//! Configuration management for Consulta.
//!
//! Settings come from `config.toml` in the per-user config directory, then
//! `CONSULTA_*` environment variables, then whatever the caller sets on top.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/consulta/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External lookup service settings
    pub lookup: LookupConfig,
    /// Bulk run settings
    pub bulk: BulkConfig,
}

impl AppConfig {
    /// Read `config.toml` from the per-user config directory, or use defaults
    /// when it has not been created yet.
    ///
    /// # Errors
    /// Returns error if:
    /// - The platform has no per-user config directory
    /// - The file exists but cannot be read or parsed
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file. The file must exist.
    pub fn load_from_path(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CONSULTA_API_URL`: Override the lookup service base URL
    /// - `CONSULTA_API_TOKEN`: Bearer token for the lookup service
    /// - `CONSULTA_BATCH_SIZE`: Override the wave width
    /// - `CONSULTA_MAX_IDENTIFIERS`: Override the unique identifier cap
    /// - `CONSULTA_TIMEOUT_SECS`: Override the per-call timeout
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable source.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("CONSULTA_API_URL") {
            tracing::debug!("Override lookup.base_url from env: {}", url);
            self.lookup.base_url = url;
        }

        if let Some(token) = var("CONSULTA_API_TOKEN") {
            tracing::debug!("Override lookup.api_token from env");
            self.lookup.api_token = Some(token);
        }

        if let Some(val) = var("CONSULTA_BATCH_SIZE") {
            match val.parse() {
                Ok(size) => {
                    self.bulk.batch_size = size;
                    tracing::debug!("Override bulk.batch_size from env: {}", size);
                }
                Err(_) => tracing::warn!("Ignoring invalid CONSULTA_BATCH_SIZE '{}'", val),
            }
        }

        if let Some(val) = var("CONSULTA_MAX_IDENTIFIERS") {
            match val.parse() {
                Ok(max) => {
                    self.bulk.max_unique_identifiers = max;
                    tracing::debug!("Override bulk.max_unique_identifiers from env: {}", max);
                }
                Err(_) => tracing::warn!("Ignoring invalid CONSULTA_MAX_IDENTIFIERS '{}'", val),
            }
        }

        if let Some(val) = var("CONSULTA_TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => {
                    self.lookup.timeout_secs = secs;
                    tracing::debug!("Override lookup.timeout_secs from env: {}", secs);
                }
                Err(_) => tracing::warn!("Ignoring invalid CONSULTA_TIMEOUT_SECS '{}'", val),
            }
        }
    }

    /// Check that all values are usable for a run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bulk.batch_size == 0 {
            return Err(invalid("bulk.batch_size", "must be at least 1"));
        }
        if self.bulk.max_unique_identifiers == 0 {
            return Err(invalid("bulk.max_unique_identifiers", "must be at least 1"));
        }
        if self.lookup.timeout_secs == 0 {
            return Err(invalid("lookup.timeout_secs", "must be at least 1"));
        }
        if self.lookup.base_url.trim().is_empty() {
            return Err(invalid("lookup.base_url", "must not be empty"));
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/consulta/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("br", "consulta", "consulta").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// External lookup service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Base URL of the lookup API; the identifier kind is appended as a path segment
    pub base_url: String,
    /// Bearer token (read from the environment, never written to disk)
    #[serde(skip)]
    pub api_token: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.consulta.example/v1".to_string(),
            api_token: None,
            timeout_secs: 30,
            user_agent: "Consulta/0.1.0 (+https://github.com/consulta-portal/consulta)"
                .to_string(),
        }
    }
}

/// Bulk run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    /// Number of lookups dispatched together in one wave
    pub batch_size: usize,
    /// Hard cap on unique valid identifiers per run
    pub max_unique_identifiers: usize,
    /// Reject CPFs whose check digits do not match
    pub verify_cpf_check_digits: bool,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_unique_identifiers: 250,
            verify_cpf_check_digits: false,
        }
    }
}
