//! Consulta Lookup - Client contract for the external identifier lookup service.
//!
//! The bulk engine talks to the lookup service one identifier at a time through
//! the [`LookupClient`] trait. A client never fails a call: business-level
//! absence is [`LookupOutcome::NotFound`] and every infrastructure problem is
//! folded into a [`TransportFailure`] by the [`ErrorClassifier`], so a single
//! bad call cannot abort its siblings.
//!
//! # Example
//!
//! ```rust,no_run
//! use consulta_core::{IdentifierKind, LookupConfig, NormalizedIdentifier};
//! use consulta_lookup::{HttpLookupClient, LookupClient, LookupOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpLookupClient::new(&LookupConfig::default())?;
//! let cpf = NormalizedIdentifier::new(IdentifierKind::Cpf, "52998224725")?;
//!
//! match client.lookup(&cpf).await {
//!     LookupOutcome::Success(payload) => println!("name: {:?}", payload.text(&["Name"])),
//!     LookupOutcome::NotFound => println!("not registered"),
//!     LookupOutcome::TransportFailure(failure) => println!("failed: {failure}"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod classifier;
pub mod client;
pub mod error;
pub mod http;
pub mod outcome;

// Re-export commonly used types
pub use classifier::ErrorClassifier;
pub use client::LookupClient;
pub use error::{LookupError, Result};
pub use http::HttpLookupClient;
pub use outcome::{FailureReason, LookupOutcome, LookupPayload, TransportFailure};
