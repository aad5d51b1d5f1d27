//! Consulta Core - Foundation crate for the Consulta bulk lookup engine.
//!
//! This crate provides shared types, error handling, configuration management,
//! and the check-digit algorithms that all other Consulta crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Identifier kinds and the normalized identifier newtype
//! - [`checksum`] - Pure CPF/CNPJ check-digit functions
//!
//! # Example
//!
//! ```rust
//! use consulta_core::{checksum, AppConfig, IdentifierKind, NormalizedIdentifier};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.bulk.batch_size, 5);
//!
//! let cnpj = NormalizedIdentifier::new(IdentifierKind::Cnpj, "11222333000181")?;
//! assert!(checksum::is_valid_cnpj(cnpj.as_str()));
//! assert_eq!(cnpj.formatted(), "11.222.333/0001-81");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod checksum;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BulkConfig, LookupConfig};
pub use error::{ConfigError, ConfigResult, ConsultaError, Result};
pub use types::{IdentifierKind, NormalizedIdentifier};
