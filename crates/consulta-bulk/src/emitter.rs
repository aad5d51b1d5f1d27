//! Serializes report rows into a downloadable artifact.

use crate::aggregator::ReportRow;
use crate::codec::{Sheet, SpreadsheetCodec};
use crate::error::EmitterError;
use consulta_core::IdentifierKind;
use std::sync::Arc;

const FILENAME_PREFIX: &str = "planilha-resultados";

/// An encoded result table with its download metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    /// Suggested file name, e.g. `planilha-resultados-cpf.csv`
    pub filename: String,
    /// MIME type reported by the codec
    pub content_type: String,
    /// Encoded table
    pub bytes: Vec<u8>,
}

/// Writes report rows through a [`SpreadsheetCodec`].
pub struct ReportEmitter {
    codec: Arc<dyn SpreadsheetCodec>,
}

impl ReportEmitter {
    #[must_use]
    pub fn new(codec: Arc<dyn SpreadsheetCodec>) -> Self {
        Self { codec }
    }

    /// Deterministic artifact name for a kind.
    #[must_use]
    pub fn filename(&self, kind: IdentifierKind) -> String {
        format!("{FILENAME_PREFIX}-{}.{}", kind.slug(), self.codec.extension())
    }

    /// Encode the header and every row. No row is ever dropped.
    ///
    /// # Errors
    /// Returns [`EmitterError::ShapeMismatch`] if a row's cell count differs
    /// from the header, or [`EmitterError::Codec`] if encoding fails.
    pub fn emit(
        &self,
        kind: IdentifierKind,
        headers: Vec<String>,
        rows: &[ReportRow],
    ) -> Result<ReportArtifact, EmitterError> {
        let expected = headers.len();
        let cells = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let cells = row.to_cells();
                if cells.len() == expected {
                    Ok(cells)
                } else {
                    Err(EmitterError::ShapeMismatch {
                        row: index,
                        expected,
                        actual: cells.len(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sheet = Sheet {
            headers,
            rows: cells,
        };
        let bytes = self.codec.encode(&sheet)?;
        let filename = self.filename(kind);

        tracing::debug!(
            "Emitted {} ({} rows, {} bytes)",
            filename,
            sheet.rows.len(),
            bytes.len()
        );

        Ok(ReportArtifact {
            filename,
            content_type: self.codec.content_type().to_string(),
            bytes,
        })
    }
}
