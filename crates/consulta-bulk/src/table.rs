//! Decoded input tables.

use serde::{Deserialize, Serialize};

/// One data row of the input table, as read.
///
/// Cells keep their column names and original order. `line` is the row number
/// as a spreadsheet user sees it: the header is line 1, so the first data row
/// is line 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    line: usize,
    cells: Vec<(String, String)>,
}

impl RawRow {
    /// Create a row from `(column, value)` pairs.
    #[must_use]
    pub fn new(line: usize, cells: Vec<(String, String)>) -> Self {
        Self { line, cells }
    }

    /// Spreadsheet line number.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Value of the cell at a column position.
    #[must_use]
    pub fn value_at(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(|(_, value)| value.as_str())
    }

    /// Value of the first cell whose column name matches, ignoring case.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(column.trim()))
            .map(|(_, value)| value.as_str())
    }

    /// All `(column, value)` pairs in order.
    #[must_use]
    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }
}

/// Header plus data rows of an input spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    /// Create an empty table with the given header row.
    #[must_use]
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and positional records.
    #[must_use]
    pub fn from_records<I, R, S>(headers: &[&str], records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(headers.iter().map(ToString::to_string).collect());
        for record in records {
            table.push_record(record.into_iter().map(Into::into).collect());
        }
        table
    }

    /// Append a positional record. Missing trailing cells read as empty and
    /// cells beyond the header are dropped.
    pub fn push_record(&mut self, mut values: Vec<String>) {
        values.resize(self.headers.len(), String::new());

        let cells = self
            .headers
            .iter()
            .cloned()
            .zip(values)
            .collect::<Vec<_>>();
        let line = self.rows.len() + 2;
        self.rows.push(RawRow::new(line, cells));
    }

    /// Header row.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in input order.
    #[must_use]
    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
