//! Identifier extraction from input tables.

use crate::error::ValidationError;
use crate::table::{RawRow, RawTable};
use consulta_core::IdentifierKind;

/// A raw value pulled from the identifier column, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateIdentifier {
    /// Row the value came from
    pub row: RawRow,
    /// Cell text as read, with surrounding whitespace removed
    pub raw_value: String,
    /// Digits-only form, zero-padded for kinds that pad
    pub digits: String,
}

/// Locates the identifier column and pulls one candidate per non-blank cell.
pub struct IdentifierExtractor {
    kind: IdentifierKind,
}

impl IdentifierExtractor {
    #[must_use]
    pub fn new(kind: IdentifierKind) -> Self {
        Self { kind }
    }

    /// Position of the first header matching one of the kind's aliases.
    #[must_use]
    pub fn locate_column(&self, headers: &[String]) -> Option<usize> {
        headers
            .iter()
            .position(|header| self.kind.matches_header(header))
    }

    /// Strip everything but digits and pad to the canonical width if the kind pads.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let width = self.kind.width();

        if self.kind.pads_leading_zeros() && !digits.is_empty() && digits.len() < width {
            format!("{digits:0>width$}")
        } else {
            digits
        }
    }

    /// Extract candidates in row order. Blank cells are skipped.
    pub fn extract(&self, table: &RawTable) -> Result<Vec<CandidateIdentifier>, ValidationError> {
        let column = self.locate_column(table.headers()).ok_or_else(|| {
            ValidationError::MissingIdentifierColumn {
                kind: self.kind,
                expected: self.kind.header_aliases().join(", "),
            }
        })?;

        let candidates: Vec<CandidateIdentifier> = table
            .rows()
            .iter()
            .filter_map(|row| {
                let raw_value = row.value_at(column)?.trim();
                if raw_value.is_empty() {
                    return None;
                }
                Some(CandidateIdentifier {
                    row: row.clone(),
                    raw_value: raw_value.to_string(),
                    digits: self.normalize(raw_value),
                })
            })
            .collect();

        tracing::debug!(
            "Extracted {} {} candidates from {} rows (column '{}')",
            candidates.len(),
            self.kind,
            table.len(),
            table.headers()[column]
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        let extractor = IdentifierExtractor::new(IdentifierKind::Cnpj);
        assert_eq!(extractor.normalize("11.222.333/0001-81"), "11222333000181");
        assert_eq!(extractor.normalize(" abc "), "");
    }

    #[test]
    fn test_normalize_pads_cpf_only() {
        let cpf = IdentifierExtractor::new(IdentifierKind::Cpf);
        assert_eq!(cpf.normalize("1234567890"), "01234567890");
        assert_eq!(cpf.normalize("123456789012"), "123456789012");

        let cep = IdentifierExtractor::new(IdentifierKind::Cep);
        assert_eq!(cep.normalize("1310-100"), "1310100");
    }

    #[test]
    fn test_locates_column_case_insensitively() {
        let extractor = IdentifierExtractor::new(IdentifierKind::Cpf);
        let headers = vec!["Nome".to_string(), " Cpf ".to_string()];
        assert_eq!(extractor.locate_column(&headers), Some(1));
        assert_eq!(extractor.locate_column(&["CNPJ".to_string()]), None);
    }

    #[test]
    fn test_extract_skips_blank_cells_and_keeps_order() {
        let table = RawTable::from_records(
            &["Nome", "CPF"],
            vec![
                vec!["Ana", "529.982.247-25"],
                vec!["Sem documento", "   "],
                vec!["Carla", "xx"],
                vec!["Bruno", "123.456.789-09"],
            ],
        );

        let candidates = IdentifierExtractor::new(IdentifierKind::Cpf)
            .extract(&table)
            .expect("extract");

        let lines: Vec<usize> = candidates.iter().map(|c| c.row.line()).collect();
        assert_eq!(lines, vec![2, 4, 5]);
        assert_eq!(candidates[0].raw_value, "529.982.247-25");
        assert_eq!(candidates[0].digits, "52998224725");
        // Non-blank cell without digits is kept for the validator to reject
        assert_eq!(candidates[1].digits, "");
    }

    #[test]
    fn test_raw_value_drops_surrounding_whitespace() {
        let table = RawTable::from_records(&["CEP"], vec![vec!["  01310-100\t"]]);

        let candidates = IdentifierExtractor::new(IdentifierKind::Cep)
            .extract(&table)
            .expect("extract");

        assert_eq!(candidates[0].row.get("CEP"), Some("  01310-100\t"));
        assert_eq!(candidates[0].raw_value, "01310-100");
        assert_eq!(candidates[0].digits, "01310100");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let table = RawTable::from_records(&["Nome", "Email"], vec![vec!["Ana", "a@b.c"]]);
        let err = IdentifierExtractor::new(IdentifierKind::Cep)
            .extract(&table)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingIdentifierColumn {
                kind: IdentifierKind::Cep,
                ..
            }
        ));
        assert!(err.to_string().contains("cep"));
    }
}
