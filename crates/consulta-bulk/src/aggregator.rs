//! Turns lookup outcomes into report rows.
//!
//! One [`ReportRow`] is produced per [`WorkItem`], in work item order, whatever
//! the outcome. Rows for items that were not found or failed carry
//! [`PLACEHOLDER`] in every display field and a non-empty error column.

use crate::error::{BulkError, Result};
use crate::validator::WorkItem;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use consulta_core::{IdentifierKind, NormalizedIdentifier};
use consulta_lookup::{FailureReason, LookupOutcome, LookupPayload};
use serde::Serialize;

/// Value written for any display field that could not be resolved.
pub const PLACEHOLDER: &str = "N/A";

const LINES_HEADER: &str = "Linhas de Origem";
const STATUS_HEADER: &str = "Status da Consulta";
const ERROR_HEADER: &str = "Erro";
const NOT_FOUND_ERROR: &str = "Nenhum registro encontrado";

/// A display column and the payload keys it is read from.
struct FieldSpec {
    header: &'static str,
    paths: &'static [&'static str],
    date: bool,
}

impl FieldSpec {
    const fn text(header: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            header,
            paths,
            date: false,
        }
    }

    const fn date(header: &'static str, paths: &'static [&'static str]) -> Self {
        Self {
            header,
            paths,
            date: true,
        }
    }

    fn resolve(&self, payload: &LookupPayload) -> String {
        match payload.text(self.paths) {
            Some(value) if self.date => format_date(&value),
            Some(value) => value,
            None => PLACEHOLDER.to_string(),
        }
    }
}

const CPF_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("Nome", &["Name"]),
    FieldSpec::text("Situação Cadastral", &["TaxIdStatus"]),
    FieldSpec::date("Data de Nascimento", &["BirthDate"]),
    FieldSpec::text("Nome da Mãe", &["MotherName"]),
    FieldSpec::text("Sexo", &["Gender"]),
];

const CNPJ_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("Razão Social", &["OfficialName", "Name"]),
    FieldSpec::text("Nome Fantasia", &["TradeName"]),
    FieldSpec::text("Situação Cadastral", &["TaxIdStatus"]),
    FieldSpec::date("Data de Abertura", &["FoundedDate", "OpeningDate"]),
    FieldSpec::text(
        "Atividade Principal",
        &["Activities.Activity", "MainActivity"],
    ),
];

const CEP_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("Logradouro", &["Street", "AddressMain"]),
    FieldSpec::text("Bairro", &["Neighborhood"]),
    FieldSpec::text("Cidade", &["City"]),
    FieldSpec::text("UF", &["State"]),
];

fn field_specs(kind: IdentifierKind) -> &'static [FieldSpec] {
    match kind {
        IdentifierKind::Cpf => CPF_FIELDS,
        IdentifierKind::Cnpj => CNPJ_FIELDS,
        IdentifierKind::Cep => CEP_FIELDS,
    }
}

/// Reduce a date or timestamp to `YYYY-MM-DD`. Unparseable values pass through.
fn format_date(value: &str) -> String {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return timestamp.date_naive().to_string();
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return timestamp.date().to_string();
    }
    if let Some(prefix) = value.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return date.to_string();
        }
    }

    value.to_string()
}

/// How the lookup for a row ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Found,
    NotFound,
    Failed(FailureReason),
}

impl RowStatus {
    /// Localized label for the status column.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Found => "Encontrado",
            Self::NotFound => "Não encontrado",
            Self::Failed(FailureReason::Cancelled) => "Cancelado",
            Self::Failed(_) => "Falha",
        }
    }
}

/// One line of the result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Normalized identifier that was looked up
    pub identifier: NormalizedIdentifier,
    /// Cell text of the first originating row
    pub original_value: String,
    /// Display fields in header order
    pub fields: Vec<String>,
    /// Spreadsheet lines that carried this identifier
    pub lines: Vec<usize>,
    /// Outcome of the lookup
    pub status: RowStatus,
    /// Error text, `None` on success
    pub error: Option<String>,
}

impl ReportRow {
    /// Cells in the same order as [`ResultAggregator::headers`].
    #[must_use]
    pub fn to_cells(&self) -> Vec<String> {
        let lines = self
            .lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        let mut cells = Vec::with_capacity(self.fields.len() + 4);
        cells.push(self.original_value.clone());
        cells.extend(self.fields.iter().cloned());
        cells.push(lines);
        cells.push(self.status.label().to_string());
        cells.push(self.error.clone().unwrap_or_default());
        cells
    }
}

/// Outcome counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub found: usize,
    pub not_found: usize,
    /// Transport failures, cancelled items excluded
    pub failed: usize,
    pub cancelled: usize,
}

impl OutcomeTally {
    /// Count the statuses of `rows`.
    #[must_use]
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        rows.iter().fold(Self::default(), |mut tally, row| {
            match row.status {
                RowStatus::Found => tally.found += 1,
                RowStatus::NotFound => tally.not_found += 1,
                RowStatus::Failed(FailureReason::Cancelled) => tally.cancelled += 1,
                RowStatus::Failed(_) => tally.failed += 1,
            }
            tally
        })
    }

    /// Total rows counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.found + self.not_found + self.failed + self.cancelled
    }
}

/// Builds report rows for one identifier kind.
pub struct ResultAggregator {
    kind: IdentifierKind,
}

impl ResultAggregator {
    #[must_use]
    pub fn new(kind: IdentifierKind) -> Self {
        Self { kind }
    }

    /// Localized header row of the result table.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![self.kind.label().to_string()];
        headers.extend(field_specs(self.kind).iter().map(|f| f.header.to_string()));
        headers.extend([LINES_HEADER, STATUS_HEADER, ERROR_HEADER].map(String::from));
        headers
    }

    /// Pair each work item with its outcome and build its row.
    ///
    /// # Errors
    /// Returns [`BulkError::Internal`] if `outcomes` is not aligned with `items`.
    pub fn aggregate(
        &self,
        items: &[WorkItem],
        outcomes: Vec<LookupOutcome>,
    ) -> Result<Vec<ReportRow>> {
        if items.len() != outcomes.len() {
            return Err(BulkError::Internal(format!(
                "{} work items but {} lookup outcomes",
                items.len(),
                outcomes.len()
            )));
        }

        let rows: Vec<ReportRow> = items
            .iter()
            .zip(outcomes)
            .map(|(item, outcome)| self.row(item, outcome))
            .collect();

        tracing::debug!("Aggregated {} {} report rows", rows.len(), self.kind);
        Ok(rows)
    }

    fn row(&self, item: &WorkItem, outcome: LookupOutcome) -> ReportRow {
        let columns = field_specs(self.kind);

        let (fields, status, error) = match outcome {
            LookupOutcome::Success(payload) => (
                columns.iter().map(|column| column.resolve(&payload)).collect(),
                RowStatus::Found,
                None,
            ),
            LookupOutcome::NotFound => (
                placeholders(columns.len()),
                RowStatus::NotFound,
                Some(NOT_FOUND_ERROR.to_string()),
            ),
            LookupOutcome::TransportFailure(failure) => {
                let error = failure.to_string();
                (
                    placeholders(columns.len()),
                    RowStatus::Failed(failure.reason),
                    Some(error),
                )
            }
        };

        ReportRow {
            identifier: item.identifier().clone(),
            original_value: item.original_value().to_string(),
            fields,
            lines: item.lines(),
            status,
            error,
        }
    }
}

fn placeholders(count: usize) -> Vec<String> {
    vec![PLACEHOLDER.to_string(); count]
}
