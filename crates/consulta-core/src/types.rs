//! Shared types used across the Consulta application.
//!
//! This module defines the identifier kinds the bulk engine understands and the
//! digits-only newtype every stage after extraction works with.

use crate::error::{ConsultaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kinds of Brazilian identifiers the bulk lookup accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// Individual taxpayer registry (11 digits)
    Cpf,
    /// Company taxpayer registry (14 digits)
    Cnpj,
    /// Postal code (8 digits)
    Cep,
}

impl IdentifierKind {
    /// All supported kinds.
    pub const ALL: [Self; 3] = [Self::Cpf, Self::Cnpj, Self::Cep];

    /// Canonical digit count.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Cpf => 11,
            Self::Cnpj => 14,
            Self::Cep => 8,
        }
    }

    /// Header names (lowercase) that identify this kind's column in an input table.
    #[must_use]
    pub fn header_aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Cpf => &["cpf", "cpfs", "nr_cpf", "numero cpf"],
            Self::Cnpj => &["cnpj", "cnpjs", "nr_cnpj", "numero cnpj"],
            Self::Cep => &["cep", "ceps", "codigo postal"],
        }
    }

    /// Whether values of this kind are left-padded with zeros when short.
    ///
    /// Spreadsheets store CPFs as numbers and drop their leading zeros.
    #[must_use]
    pub fn pads_leading_zeros(&self) -> bool {
        matches!(self, Self::Cpf)
    }

    /// Upper-case label used in report headers and messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpf => "CPF",
            Self::Cnpj => "CNPJ",
            Self::Cep => "CEP",
        }
    }

    /// Lower-case slug used in file names and API paths.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Cpf => "cpf",
            Self::Cnpj => "cnpj",
            Self::Cep => "cep",
        }
    }

    /// Check whether a trimmed, case-insensitive header names this kind's column.
    #[must_use]
    pub fn matches_header(&self, header: &str) -> bool {
        let header = header.trim().to_lowercase();
        self.header_aliases().iter().any(|alias| *alias == header)
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for IdentifierKind {
    type Err = ConsultaError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == name)
            .ok_or_else(|| {
                ConsultaError::Validation(format!(
                    "unknown identifier kind '{name}': expected cpf, cnpj or cep"
                ))
            })
    }
}

/// Fixed-width, digits-only canonical form of an identifier.
///
/// Equality and hashing are defined on this form, which is what deduplication
/// groups by. Construction only checks shape (width and digits); business rules
/// such as check digits are applied by the bulk validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "UncheckedIdentifier")]
pub struct NormalizedIdentifier {
    kind: IdentifierKind,
    digits: String,
}

/// Wire shape of [`NormalizedIdentifier`] before the width and digit checks.
#[derive(Deserialize)]
struct UncheckedIdentifier {
    kind: IdentifierKind,
    digits: String,
}

impl TryFrom<UncheckedIdentifier> for NormalizedIdentifier {
    type Error = ConsultaError;

    fn try_from(raw: UncheckedIdentifier) -> Result<Self> {
        Self::new(raw.kind, raw.digits)
    }
}

impl NormalizedIdentifier {
    /// Create a normalized identifier from a digits-only string.
    ///
    /// # Errors
    /// Returns error if the value is not exactly `kind.width()` ASCII digits.
    pub fn new(kind: IdentifierKind, digits: impl Into<String>) -> Result<Self> {
        let digits = digits.into();

        if digits.len() != kind.width() {
            return Err(ConsultaError::Validation(format!(
                "invalid {kind}: expected {} digits, got {}",
                kind.width(),
                digits.len()
            )));
        }

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConsultaError::Validation(format!(
                "invalid {kind}: must contain only digits, got '{digits}'"
            )));
        }

        Ok(Self { kind, digits })
    }

    /// Identifier kind.
    #[must_use]
    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// Get the digits-only value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Human-readable punctuation (`000.000.000-00`, `00.000.000/0000-00`, `00000-000`).
    #[must_use]
    pub fn formatted(&self) -> String {
        let cuts: &[usize] = match self.kind {
            IdentifierKind::Cpf => &[3, 6, 9],
            IdentifierKind::Cnpj => &[2, 5, 8, 12],
            IdentifierKind::Cep => &[5],
        };
        let separators: &[char] = match self.kind {
            IdentifierKind::Cpf => &['.', '.', '-'],
            IdentifierKind::Cnpj => &['.', '.', '/', '-'],
            IdentifierKind::Cep => &['-'],
        };

        let mut out = String::with_capacity(self.digits.len() + separators.len());
        let mut start = 0;
        for (&cut, &sep) in cuts.iter().zip(separators) {
            let Some(part) = self.digits.get(start..cut) else {
                return self.digits.clone();
            };
            out.push_str(part);
            out.push(sep);
            start = cut;
        }
        match self.digits.get(start..) {
            Some(rest) if !rest.is_empty() => {
                out.push_str(rest);
                out
            }
            _ => self.digits.clone(),
        }
    }
}

impl fmt::Display for NormalizedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digits)
    }
}
