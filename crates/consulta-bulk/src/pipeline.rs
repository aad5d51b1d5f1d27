//! End-to-end bulk run.
//!
//! [`BulkRun`] wires the stages together: extract, validate, dispatch in
//! waves, aggregate, emit. All state for one run lives in a [`RunContext`]
//! that is created at the start of [`BulkRun::run`] and dropped with it.

use crate::aggregator::{OutcomeTally, ReportRow, ResultAggregator};
use crate::codec::SpreadsheetCodec;
use crate::emitter::{ReportArtifact, ReportEmitter};
use crate::error::{Result, ValidationError};
use crate::extractor::IdentifierExtractor;
use crate::scheduler::{Progress, ProgressCallback, WaveScheduler, DEFAULT_BATCH_SIZE};
use crate::table::RawTable;
use crate::validator::{InvalidCandidate, Validator, DEFAULT_MAX_UNIQUE};
use chrono::{DateTime, Utc};
use consulta_core::{AppConfig, IdentifierKind};
use consulta_lookup::LookupClient;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Tunables for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Lookups per wave
    pub batch_size: usize,
    /// Hard cap on unique identifiers
    pub max_unique_identifiers: usize,
    /// Deadline for one lookup
    pub call_timeout: Duration,
    /// Reject CPFs with wrong check digits
    pub verify_cpf_check_digits: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_unique_identifiers: DEFAULT_MAX_UNIQUE,
            call_timeout: Duration::from_secs(30),
            verify_cpf_check_digits: false,
        }
    }
}

impl RunSettings {
    /// Take the run settings from the application config.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.bulk.batch_size,
            max_unique_identifiers: config.bulk.max_unique_identifiers,
            call_timeout: Duration::from_secs(config.lookup.timeout_secs),
            verify_cpf_check_digits: config.bulk.verify_cpf_check_digits,
        }
    }

    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let invalid = |field: &str| ValidationError::InvalidSettings {
            field: field.to_string(),
            reason: "must be greater than zero".to_string(),
        };

        if self.batch_size == 0 {
            return Err(invalid("batch_size"));
        }
        if self.max_unique_identifiers == 0 {
            return Err(invalid("max_unique_identifiers"));
        }
        if self.call_timeout.is_zero() {
            return Err(invalid("call_timeout"));
        }
        Ok(())
    }
}

/// State scoped to a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique id of the run, used in logs and the summary
    pub run_id: Uuid,
    /// Kind of identifier being processed
    pub kind: IdentifierKind,
    /// When the run started
    pub started_at: DateTime<Utc>,
    processed: Arc<AtomicUsize>,
}

impl RunContext {
    #[must_use]
    pub fn new(kind: IdentifierKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            kind,
            started_at: Utc::now(),
            processed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Work items settled so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    fn record(&self, progress: Progress) {
        self.processed.store(progress.processed, Ordering::SeqCst);
    }
}

/// Counters and timing for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub kind: IdentifierKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Data rows in the input table
    pub input_rows: usize,
    /// Non-blank cells in the identifier column
    pub candidates: usize,
    pub invalid: usize,
    /// Valid candidates folded into an earlier identifier
    pub duplicates: usize,
    /// Unique identifiers scheduled for lookup
    pub unique: usize,
    /// Unique identifiers whose wave settled; below `unique` after cancellation
    pub processed: usize,
    #[serde(flatten)]
    pub outcomes: OutcomeTally,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Encoded result table
    pub artifact: ReportArtifact,
    /// Report rows in work item order
    pub rows: Vec<ReportRow>,
    /// Candidates rejected by validation
    pub invalid: Vec<InvalidCandidate>,
    pub summary: RunSummary,
}

/// A configured bulk lookup pipeline.
pub struct BulkRun {
    settings: RunSettings,
    client: Arc<dyn LookupClient>,
    codec: Arc<dyn SpreadsheetCodec>,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
}

impl BulkRun {
    /// Create a pipeline over a lookup client and a spreadsheet codec.
    #[must_use]
    pub fn new(
        settings: RunSettings,
        client: Arc<dyn LookupClient>,
        codec: Arc<dyn SpreadsheetCodec>,
    ) -> Self {
        Self {
            settings,
            client,
            codec,
            cancel: CancellationToken::new(),
            on_progress: None,
        }
    }

    /// Stop dispatching new waves once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report progress after every wave.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Decode an input artifact with the codec, then run it.
    ///
    /// # Errors
    /// Undecodable input is [`ValidationError::UnreadableInput`]; otherwise
    /// as [`BulkRun::run`].
    pub async fn run_bytes(&self, kind: IdentifierKind, bytes: &[u8]) -> Result<RunReport> {
        let table = self
            .codec
            .decode(bytes)
            .map_err(|e| ValidationError::UnreadableInput(e.to_string()))?;
        self.run(kind, &table).await
    }

    /// Run every stage over a decoded table.
    ///
    /// Validation failures are raised before any lookup is made. Once
    /// dispatch starts, per-item failures end up in the report and only an
    /// emitter or internal failure aborts the run.
    pub async fn run(&self, kind: IdentifierKind, table: &RawTable) -> Result<RunReport> {
        self.settings.validate()?;
        let context = RunContext::new(kind);

        tracing::info!(
            "Starting {} run {} over {} rows",
            kind,
            context.run_id,
            table.len()
        );

        let candidates = IdentifierExtractor::new(kind)
            .extract(table)
            .inspect_err(|e| tracing::error!("Run {} rejected: {}", context.run_id, e))?;
        let candidate_count = candidates.len();

        let validated = Validator::new(kind)
            .with_max_unique(self.settings.max_unique_identifiers)
            .with_cpf_check_digits(self.settings.verify_cpf_check_digits)
            .validate(candidates)
            .inspect_err(|e| tracing::error!("Run {} rejected: {}", context.run_id, e))?;

        if !validated.invalid.is_empty() {
            tracing::warn!(
                "{} invalid {} values skipped",
                validated.invalid.len(),
                kind
            );
        }

        let outcomes = self
            .scheduler(&context)
            .dispatch(&validated.items)
            .await?;

        let aggregator = ResultAggregator::new(kind);
        let rows = aggregator.aggregate(&validated.items, outcomes)?;
        let tally = OutcomeTally::from_rows(&rows);

        let artifact = ReportEmitter::new(Arc::clone(&self.codec))
            .emit(kind, aggregator.headers(), &rows)
            .inspect_err(|e| tracing::error!("Run {} failed: {}", context.run_id, e))?;

        let summary = RunSummary {
            run_id: context.run_id,
            kind,
            started_at: context.started_at,
            finished_at: Utc::now(),
            input_rows: table.len(),
            candidates: candidate_count,
            invalid: validated.invalid.len(),
            duplicates: validated.duplicates,
            unique: validated.items.len(),
            processed: context.processed(),
            outcomes: tally,
        };

        tracing::info!(
            "Run {} finished: {} found, {} not found, {} failed, {} cancelled",
            summary.run_id,
            tally.found,
            tally.not_found,
            tally.failed,
            tally.cancelled
        );

        Ok(RunReport {
            artifact,
            rows,
            invalid: validated.invalid,
            summary,
        })
    }

    fn scheduler(&self, context: &RunContext) -> WaveScheduler {
        let tracker = context.clone();
        let forward = self.on_progress.clone();
        let on_progress: ProgressCallback = Arc::new(move |progress: Progress| {
            tracker.record(progress);
            if let Some(callback) = &forward {
                callback(progress);
            }
        });

        WaveScheduler::new(Arc::clone(&self.client))
            .with_batch_size(self.settings.batch_size)
            .with_call_timeout(self.settings.call_timeout)
            .with_cancellation(self.cancel.clone())
            .with_progress(on_progress)
    }
}
