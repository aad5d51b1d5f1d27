use crate::codec::CodecError;
use crate::validator::InvalidCandidate;
use consulta_core::IdentifierKind;
use thiserror::Error;

/// Fatal, pre-flight failures. No lookup is made once one of these is raised.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid run settings for {field}: {reason}")]
    InvalidSettings { field: String, reason: String },

    #[error("input could not be read: {0}")]
    UnreadableInput(String),

    #[error("no {kind} column found in header, expected one of: {expected}")]
    MissingIdentifierColumn {
        kind: IdentifierKind,
        expected: String,
    },

    #[error("input contains no {kind} values")]
    EmptyInput { kind: IdentifierKind },

    #[error("none of the {} {kind} values in the input are valid", .invalid.len())]
    NoValidIdentifiers {
        kind: IdentifierKind,
        invalid: Vec<InvalidCandidate>,
    },

    #[error("{count} unique {kind} values exceed the limit of {max} per run")]
    CapExceeded {
        kind: IdentifierKind,
        count: usize,
        max: usize,
    },
}

/// The result artifact could not be produced.
#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("codec failure: {0}")]
    Codec(#[from] CodecError),

    #[error("report row {row} has {actual} cells, header has {expected}")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("report emission failed: {0}")]
    Emitter(#[from] EmitterError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BulkError {
    /// True for failures raised before any lookup was dispatched.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, BulkError>;
