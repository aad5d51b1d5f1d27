//! Spreadsheet codec seam and the CSV implementation.

use crate::table::RawTable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input has no header row")]
    MissingHeader,
}

/// A table ready to be encoded: header plus positional rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Reads input tables and writes result tables in one file format.
pub trait SpreadsheetCodec: Send + Sync {
    /// File extension without the dot.
    fn extension(&self) -> &str;

    /// MIME type of encoded artifacts.
    fn content_type(&self) -> &str;

    /// Decode an input file. The first record is the header row.
    fn decode(&self, bytes: &[u8]) -> Result<RawTable, CodecError>;

    /// Encode a result sheet.
    fn encode(&self, sheet: &Sheet) -> Result<Vec<u8>, CodecError>;
}

/// CSV codec backed by the `csv` crate.
///
/// Spreadsheet exports from Brazilian locales usually use `;` as the
/// delimiter, so [`CsvCodec::detect`] sniffs the header line on decode.
#[derive(Debug, Clone)]
pub struct CsvCodec {
    delimiter: Option<u8>,
    output_delimiter: u8,
}

impl CsvCodec {
    /// Codec that detects the input delimiter and writes `,`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: None,
            output_delimiter: b',',
        }
    }

    /// Codec with a fixed delimiter for both reading and writing.
    #[must_use]
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
            output_delimiter: delimiter,
        }
    }

    /// Pick `;` or `,` by whichever occurs more often in the first line.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> u8 {
        let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
        let semicolons = first_line.iter().filter(|b| **b == b';').count();
        let commas = first_line.iter().filter(|b| **b == b',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadsheetCodec for CsvCodec {
    fn extension(&self) -> &str {
        "csv"
    }

    fn content_type(&self) -> &str {
        "text/csv; charset=utf-8"
    }

    fn decode(&self, bytes: &[u8]) -> Result<RawTable, CodecError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let delimiter = self.delimiter.unwrap_or_else(|| Self::detect(bytes));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(CodecError::MissingHeader);
        }

        let mut table = RawTable::new(headers);
        for record in reader.records() {
            let record = record?;
            table.push_record(record.iter().map(ToString::to_string).collect());
        }

        Ok(table)
    }

    fn encode(&self, sheet: &Sheet) -> Result<Vec<u8>, CodecError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.output_delimiter)
            .from_writer(Vec::new());

        writer.write_record(&sheet.headers)?;
        for row in &sheet.rows {
            writer.write_record(row)?;
        }

        writer
            .into_inner()
            .map_err(|e| CodecError::Io(e.into_error()))
    }
}
