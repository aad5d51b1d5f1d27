//! Core error types for the Consulta application.
//!
//! [`ConsultaError`] reports identifier values and kind names that do not
//! parse. [`ConfigError`] covers loading, parsing and validating `config.toml`.

use thiserror::Error;

/// Failures shared across Consulta crates.
#[derive(Error, Debug)]
pub enum ConsultaError {
    /// A value is not a well-formed identifier or identifier kind
    #[error("validation error: {0}")]
    Validation(String),
}

/// Failures while reading or checking `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The platform has no per-user config directory
    #[error("no per-user config directory available on this platform")]
    NoConfigDir,

    /// An explicitly requested config file does not exist
    #[error("no config file at {path}")]
    NotFound {
        /// Requested location
        path: String,
    },

    /// The file is not valid TOML or has wrongly typed values
    #[error("malformed config.toml: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Reading the file failed
    #[error("config file access failed: {0}")]
    Io(#[from] std::io::Error),

    /// A setting is outside its accepted range
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted setting name, e.g. `bulk.batch_size`
        field: String,
        /// What the setting must satisfy
        reason: String,
    },
}

/// Result alias over [`ConsultaError`].
pub type Result<T> = std::result::Result<T, ConsultaError>;

/// Result alias over [`ConfigError`].
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConsultaError::Validation("unknown identifier kind 'rg'".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: unknown identifier kind 'rg'"
        );

        let err = ConfigError::InvalidValue {
            field: "bulk.batch_size".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for bulk.batch_size: must be at least 1"
        );

        let err = ConfigError::NotFound {
            path: "/tmp/consulta.toml".to_string(),
        };
        assert_eq!(err.to_string(), "no config file at /tmp/consulta.toml");
    }

    #[test]
    fn test_io_error_converts() {
        let err: ConfigError = std::io::Error::other("permission denied").into();
        assert!(matches!(err, ConfigError::Io(_)));
        assert_eq!(
            err.to_string(),
            "config file access failed: permission denied"
        );
    }
}
