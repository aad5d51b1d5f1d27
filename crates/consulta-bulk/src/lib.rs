//! Consulta Bulk - Spreadsheet-driven bulk identifier lookup.
//!
//! This crate turns a table of raw CPF, CNPJ or CEP values into a complete
//! result table: every unique valid identifier is looked up exactly once and
//! produces exactly one report row, whether the lookup succeeded or not.
//!
//! # Pipeline
//!
//! ```text
//! RawTable → IdentifierExtractor → Validator → WaveScheduler → ResultAggregator → ReportEmitter
//!                                                   ↓
//!                                     LookupClient × batch size, per wave
//! ```
//!
//! Lookups are dispatched in waves: all calls of a wave run concurrently and
//! the next wave opens only after every call of the current one has settled.
//!
//! # Example
//!
//! ```rust,ignore
//! use consulta_bulk::{BulkRun, CsvCodec, RunSettings};
//! use consulta_core::IdentifierKind;
//! use std::sync::Arc;
//!
//! let run = BulkRun::new(RunSettings::default(), Arc::new(client), Arc::new(CsvCodec::new()))
//!     .with_progress(Arc::new(|progress| println!("{progress}")));
//!
//! let report = run.run_bytes(IdentifierKind::Cpf, &input_bytes).await?;
//! std::fs::write(&report.artifact.filename, &report.artifact.bytes)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod aggregator;
#[allow(missing_docs)]
pub mod codec;
pub mod emitter;
#[allow(missing_docs)]
pub mod error;
pub mod extractor;
#[allow(missing_docs)]
pub mod pipeline;
pub mod scheduler;
pub mod table;
#[allow(missing_docs)]
pub mod validator;

// Re-export commonly used types
pub use aggregator::{OutcomeTally, ReportRow, ResultAggregator, RowStatus, PLACEHOLDER};
pub use codec::{CodecError, CsvCodec, Sheet, SpreadsheetCodec};
pub use emitter::{ReportArtifact, ReportEmitter};
pub use error::{BulkError, EmitterError, Result, ValidationError};
pub use extractor::{CandidateIdentifier, IdentifierExtractor};
pub use pipeline::{BulkRun, RunContext, RunReport, RunSettings, RunSummary};
pub use scheduler::{Progress, ProgressCallback, WaveScheduler};
pub use table::{RawRow, RawTable};
pub use validator::{
    InvalidCandidate, InvalidReason, ValidatedSet, ValidationVerdict, Validator, WorkItem,
};
