//! Validation and deduplication of extracted candidates.
//!
//! Each candidate gets a [`ValidationVerdict`]. Valid candidates are grouped by
//! their normalized value into [`WorkItem`]s in first-seen order; invalid ones
//! are kept as diagnostics. The unique set is capped before anything is
//! scheduled.

use crate::error::ValidationError;
use crate::extractor::CandidateIdentifier;
use crate::table::RawRow;
use consulta_core::{checksum, IdentifierKind, NormalizedIdentifier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default hard cap on unique identifiers per run.
pub const DEFAULT_MAX_UNIQUE: usize = 250;

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Cell contained no digits at all
    NoDigits,
    /// Digit count differs from the canonical width
    WrongLength { expected: usize, actual: usize },
    /// Every digit is the same (`00000000000`)
    RepeatedDigits,
    /// Check digits do not match the base digits
    CheckDigitMismatch,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDigits => write!(f, "no digits"),
            Self::WrongLength { expected, actual } => {
                write!(f, "expected {expected} digits, got {actual}")
            }
            Self::RepeatedDigits => write!(f, "repeated digit sequence"),
            Self::CheckDigitMismatch => write!(f, "check digits do not match"),
        }
    }
}

/// Outcome of validating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    Valid(NormalizedIdentifier),
    Invalid(InvalidReason),
}

/// A rejected candidate, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidCandidate {
    /// Spreadsheet line of the originating row
    pub line: usize,
    /// Cell text as read
    pub raw_value: String,
    /// Rejection reason
    pub reason: InvalidReason,
}

impl fmt::Display for InvalidCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: '{}' ({})", self.line, self.raw_value, self.reason)
    }
}

/// One unique valid identifier and every candidate that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    identifier: NormalizedIdentifier,
    sources: Vec<CandidateIdentifier>,
}

impl WorkItem {
    fn new(identifier: NormalizedIdentifier, first: CandidateIdentifier) -> Self {
        Self {
            identifier,
            sources: vec![first],
        }
    }

    /// Normalized identifier to look up.
    #[must_use]
    pub fn identifier(&self) -> &NormalizedIdentifier {
        &self.identifier
    }

    /// Un-normalized cell text of the first originating row.
    #[must_use]
    pub fn original_value(&self) -> &str {
        self.sources
            .first()
            .map_or(self.identifier.as_str(), |source| source.raw_value.as_str())
    }

    /// Every originating row, in input order.
    pub fn rows(&self) -> impl Iterator<Item = &RawRow> {
        self.sources.iter().map(|source| &source.row)
    }

    /// Spreadsheet lines of every originating row.
    #[must_use]
    pub fn lines(&self) -> Vec<usize> {
        self.rows().map(RawRow::line).collect()
    }

    /// Number of input rows collapsed into this item.
    #[must_use]
    pub fn occurrences(&self) -> usize {
        self.sources.len()
    }
}

/// Validator output: the unique working set plus diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ValidatedSet {
    /// Unique valid identifiers in discovery order
    pub items: Vec<WorkItem>,
    /// Rejected candidates in input order
    pub invalid: Vec<InvalidCandidate>,
    /// Valid candidates folded into an earlier item
    pub duplicates: usize,
}

/// Per-kind validation, deduplication and cap enforcement.
pub struct Validator {
    kind: IdentifierKind,
    max_unique: usize,
    verify_cpf_check_digits: bool,
}

impl Validator {
    #[must_use]
    pub fn new(kind: IdentifierKind) -> Self {
        Self {
            kind,
            max_unique: DEFAULT_MAX_UNIQUE,
            verify_cpf_check_digits: false,
        }
    }

    /// Set the maximum number of unique identifiers.
    #[must_use]
    pub fn with_max_unique(mut self, max: usize) -> Self {
        self.max_unique = max;
        self
    }

    /// Also reject CPFs whose check digits do not match.
    #[must_use]
    pub fn with_cpf_check_digits(mut self, verify: bool) -> Self {
        self.verify_cpf_check_digits = verify;
        self
    }

    /// Judge one digits-only value.
    #[must_use]
    pub fn verdict(&self, digits: &str) -> ValidationVerdict {
        match self.check(digits) {
            Ok(()) => match NormalizedIdentifier::new(self.kind, digits) {
                Ok(identifier) => ValidationVerdict::Valid(identifier),
                Err(_) => ValidationVerdict::Invalid(InvalidReason::WrongLength {
                    expected: self.kind.width(),
                    actual: digits.len(),
                }),
            },
            Err(reason) => ValidationVerdict::Invalid(reason),
        }
    }

    fn check(&self, digits: &str) -> Result<(), InvalidReason> {
        if digits.is_empty() {
            return Err(InvalidReason::NoDigits);
        }

        let width = self.kind.width();
        if digits.len() != width {
            return Err(InvalidReason::WrongLength {
                expected: width,
                actual: digits.len(),
            });
        }

        if checksum::is_repeated_sequence(digits) {
            return Err(InvalidReason::RepeatedDigits);
        }

        let checksum_ok = match self.kind {
            IdentifierKind::Cnpj => checksum::is_valid_cnpj(digits),
            IdentifierKind::Cpf if self.verify_cpf_check_digits => checksum::is_valid_cpf(digits),
            IdentifierKind::Cpf | IdentifierKind::Cep => true,
        };

        if checksum_ok {
            Ok(())
        } else {
            Err(InvalidReason::CheckDigitMismatch)
        }
    }

    /// Validate, deduplicate and cap the candidates.
    ///
    /// # Errors
    /// - [`ValidationError::InvalidSettings`] if the cap is zero
    /// - [`ValidationError::EmptyInput`] if there are no candidates
    /// - [`ValidationError::NoValidIdentifiers`] if every candidate is invalid
    /// - [`ValidationError::CapExceeded`] if the unique set is larger than the cap
    pub fn validate(
        &self,
        candidates: Vec<CandidateIdentifier>,
    ) -> Result<ValidatedSet, ValidationError> {
        if self.max_unique == 0 {
            return Err(ValidationError::InvalidSettings {
                field: "max_unique_identifiers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if candidates.is_empty() {
            return Err(ValidationError::EmptyInput { kind: self.kind });
        }

        let mut set = ValidatedSet::default();
        let mut positions: HashMap<NormalizedIdentifier, usize> = HashMap::new();

        for candidate in candidates {
            match self.verdict(&candidate.digits) {
                ValidationVerdict::Valid(identifier) => {
                    if let Some(&index) = positions.get(&identifier) {
                        set.items[index].sources.push(candidate);
                        set.duplicates += 1;
                    } else {
                        positions.insert(identifier.clone(), set.items.len());
                        set.items.push(WorkItem::new(identifier, candidate));
                    }
                }
                ValidationVerdict::Invalid(reason) => {
                    tracing::debug!(
                        "Rejected {} at line {}: {}",
                        self.kind,
                        candidate.row.line(),
                        reason
                    );
                    set.invalid.push(InvalidCandidate {
                        line: candidate.row.line(),
                        raw_value: candidate.raw_value,
                        reason,
                    });
                }
            }
        }

        if set.items.is_empty() {
            return Err(ValidationError::NoValidIdentifiers {
                kind: self.kind,
                invalid: set.invalid,
            });
        }

        if set.items.len() > self.max_unique {
            return Err(ValidationError::CapExceeded {
                kind: self.kind,
                count: set.items.len(),
                max: self.max_unique,
            });
        }

        tracing::debug!(
            "Validated {} unique {} values ({} invalid, {} duplicates)",
            set.items.len(),
            self.kind,
            set.invalid.len(),
            set.duplicates
        );

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(line: usize, raw: &str, digits: &str) -> CandidateIdentifier {
        CandidateIdentifier {
            row: RawRow::new(line, vec![("doc".to_string(), raw.to_string())]),
            raw_value: raw.to_string(),
            digits: digits.to_string(),
        }
    }

    fn cnpj_from_seed(seed: usize) -> String {
        let base = format!("{seed:08}0001");
        let [d1, d2] = checksum::cnpj_check_digits(&base).expect("12-digit base");
        format!("{base}{d1}{d2}")
    }

    #[test]
    fn test_cpf_rules() {
        let validator = Validator::new(IdentifierKind::Cpf);
        assert!(matches!(
            validator.verdict("52998224725"),
            ValidationVerdict::Valid(_)
        ));
        // Check digits are not enforced by default
        assert!(matches!(
            validator.verdict("52998224700"),
            ValidationVerdict::Valid(_)
        ));
        assert_eq!(
            validator.verdict("00000000000"),
            ValidationVerdict::Invalid(InvalidReason::RepeatedDigits)
        );
        assert_eq!(
            validator.verdict("5299822472"),
            ValidationVerdict::Invalid(InvalidReason::WrongLength {
                expected: 11,
                actual: 10
            })
        );
        assert_eq!(
            validator.verdict(""),
            ValidationVerdict::Invalid(InvalidReason::NoDigits)
        );
    }

    #[test]
    fn test_cpf_check_digits_opt_in() {
        let validator = Validator::new(IdentifierKind::Cpf).with_cpf_check_digits(true);
        assert!(matches!(
            validator.verdict("52998224725"),
            ValidationVerdict::Valid(_)
        ));
        assert_eq!(
            validator.verdict("52998224700"),
            ValidationVerdict::Invalid(InvalidReason::CheckDigitMismatch)
        );
    }

    #[test]
    fn test_cnpj_check_digits() {
        let validator = Validator::new(IdentifierKind::Cnpj);
        assert!(matches!(
            validator.verdict("11222333000181"),
            ValidationVerdict::Valid(_)
        ));
        assert_eq!(
            validator.verdict("11222333000191"),
            ValidationVerdict::Invalid(InvalidReason::CheckDigitMismatch)
        );
        assert_eq!(
            validator.verdict("11222333000182"),
            ValidationVerdict::Invalid(InvalidReason::CheckDigitMismatch)
        );
        assert_eq!(
            validator.verdict("11111111111111"),
            ValidationVerdict::Invalid(InvalidReason::RepeatedDigits)
        );
    }

    #[test]
    fn test_cep_rules() {
        let validator = Validator::new(IdentifierKind::Cep);
        assert!(matches!(
            validator.verdict("01310100"),
            ValidationVerdict::Valid(_)
        ));
        assert_eq!(
            validator.verdict("00000000"),
            ValidationVerdict::Invalid(InvalidReason::RepeatedDigits)
        );
        assert!(matches!(
            validator.verdict("0131010"),
            ValidationVerdict::Invalid(InvalidReason::WrongLength { .. })
        ));
    }

    #[test]
    fn test_duplicates_collapse_in_discovery_order() {
        let candidates = vec![
            candidate(2, "529.982.247-25", "52998224725"),
            candidate(3, "013.101.000-00", "01310100000"),
            candidate(4, "52998224725", "52998224725"),
            candidate(5, "bad", ""),
            candidate(6, "123.456.789-09", "12345678909"),
            candidate(7, "123456789-09", "12345678909"),
        ];

        let set = Validator::new(IdentifierKind::Cpf)
            .validate(candidates)
            .expect("validate");

        let identifiers: Vec<&str> = set.items.iter().map(|i| i.identifier().as_str()).collect();
        assert_eq!(identifiers, vec!["52998224725", "01310100000", "12345678909"]);
        assert_eq!(set.duplicates, 2);
        assert_eq!(set.invalid.len(), 1);
        assert_eq!(set.invalid[0].line, 5);

        let first = &set.items[0];
        assert_eq!(first.original_value(), "529.982.247-25");
        assert_eq!(first.lines(), vec![2, 4]);
        assert_eq!(first.occurrences(), 2);
    }

    #[test]
    fn test_cap_boundary() {
        let at_cap: Vec<_> = (0..250)
            .map(|i| {
                let cnpj = cnpj_from_seed(i + 1);
                candidate(i + 2, &cnpj, &cnpj)
            })
            .collect();
        let set = Validator::new(IdentifierKind::Cnpj)
            .validate(at_cap.clone())
            .expect("250 unique values are allowed");
        assert_eq!(set.items.len(), 250);

        let mut over_cap = at_cap;
        let extra = cnpj_from_seed(9999);
        over_cap.push(candidate(252, &extra, &extra));
        let err = Validator::new(IdentifierKind::Cnpj)
            .validate(over_cap)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CapExceeded {
                count: 251,
                max: 250,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicates_do_not_count_against_cap() {
        let candidates: Vec<_> = (0..10)
            .map(|i| candidate(i + 2, "01310-100", "01310100"))
            .collect();
        let set = Validator::new(IdentifierKind::Cep)
            .with_max_unique(1)
            .validate(candidates)
            .expect("one unique value");
        assert_eq!(set.items.len(), 1);
        assert_eq!(set.duplicates, 9);
    }

    #[test]
    fn test_empty_and_all_invalid_inputs_fail() {
        let validator = Validator::new(IdentifierKind::Cpf);

        let err = validator.validate(Vec::new()).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyInput { .. }));

        let err = validator
            .validate(vec![candidate(2, "abc", ""), candidate(3, "123-4", "1234")])
            .unwrap_err();
        match err {
            ValidationError::NoValidIdentifiers { invalid, .. } => assert_eq!(invalid.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_cap_is_invalid_settings() {
        let err = Validator::new(IdentifierKind::Cpf)
            .with_max_unique(0)
            .validate(vec![candidate(2, "52998224725", "52998224725")])
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSettings { .. }));
    }
}
