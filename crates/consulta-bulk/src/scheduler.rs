//! Wave scheduler for dispatching lookups against the external service.
//!
//! Work items are split into consecutive waves of at most `batch_size` items.
//! Every lookup of a wave is spawned at once and the scheduler waits until all
//! of them have settled before opening the next wave, so the provider never
//! sees more than `batch_size` calls in flight. This is deliberately not a
//! sliding window.

use crate::error::{BulkError, Result, ValidationError};
use crate::validator::WorkItem;
use consulta_lookup::{FailureReason, LookupClient, LookupOutcome, TransportFailure};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default number of lookups per wave.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Cumulative progress reported after each wave settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Work items settled so far
    pub processed: usize,
    /// Work items in the run
    pub total: usize,
    /// 1-based index of the wave that just settled
    pub wave: usize,
    /// Number of waves in the run
    pub waves: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processing {} of {}", self.processed, self.total)
    }
}

/// Callback invoked between waves.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Dispatches work items in sequential, fully-settled waves.
pub struct WaveScheduler {
    client: Arc<dyn LookupClient>,
    batch_size: usize,
    call_timeout: Duration,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
}

impl WaveScheduler {
    /// Create a scheduler with the default wave width and timeout.
    #[must_use]
    pub fn new(client: Arc<dyn LookupClient>) -> Self {
        Self {
            client,
            batch_size: DEFAULT_BATCH_SIZE,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cancel: CancellationToken::new(),
            on_progress: None,
        }
    }

    /// Set the number of lookups per wave.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the deadline for a single lookup.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Use a token that stops the run at the next wave boundary.
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

    /// Index ranges of the waves for `total` items.
    #[must_use]
    pub fn plan(total: usize, batch_size: usize) -> Vec<Range<usize>> {
        if batch_size == 0 {
            return Vec::new();
        }

        (0..total)
            .step_by(batch_size)
            .map(|start| start..(start + batch_size).min(total))
            .collect()
    }

    /// Look up every item and return one outcome per item, in input order.
    ///
    /// Items never dispatched because the run was cancelled resolve as
    /// `TransportFailure(Cancelled)`.
    pub async fn dispatch(&self, items: &[WorkItem]) -> Result<Vec<LookupOutcome>> {
        if self.batch_size == 0 {
            return Err(BulkError::Validation(ValidationError::InvalidSettings {
                field: "batch_size".to_string(),
                reason: "must be at least 1".to_string(),
            }));
        }

        let total = items.len();
        let waves = Self::plan(total, self.batch_size);
        let mut outcomes: Vec<Option<LookupOutcome>> = vec![None; total];
        let mut processed = 0;

        tracing::debug!(
            "Dispatching {} lookups in {} waves of up to {} via {}",
            total,
            waves.len(),
            self.batch_size,
            self.client.client_id()
        );

        for (wave_index, range) in waves.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    "Run cancelled before wave {}/{}, {} lookups skipped",
                    wave_index + 1,
                    waves.len(),
                    total - processed
                );
                break;
            }

            for (index, outcome) in self.run_wave(items, range.clone()).await {
                outcomes[index] = Some(outcome);
            }

            processed += range.len();
            let progress = Progress {
                processed,
                total,
                wave: wave_index + 1,
                waves: waves.len(),
            };
            tracing::info!("{} (wave {}/{})", progress, progress.wave, progress.waves);

            if let Some(callback) = &self.on_progress {
                callback(progress);
            }
        }

        Ok(outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| {
                    LookupOutcome::TransportFailure(TransportFailure::cancelled())
                })
            })
            .collect())
    }

    /// Spawn every lookup of one wave and wait for all of them to settle.
    async fn run_wave(
        &self,
        items: &[WorkItem],
        range: Range<usize>,
    ) -> Vec<(usize, LookupOutcome)> {
        let mut pending: FuturesUnordered<_> = range
            .map(|index| {
                let client = Arc::clone(&self.client);
                let identifier = items[index].identifier().clone();
                let call_timeout = self.call_timeout;

                let handle = tokio::spawn(async move {
                    let call = client.lookup(&identifier);
                    if let Ok(outcome) = tokio::time::timeout(call_timeout, call).await {
                        outcome
                    } else {
                        tracing::warn!("Lookup for {} timed out", identifier);
                        LookupOutcome::TransportFailure(TransportFailure::timeout(call_timeout))
                    }
                });

                async move { (index, handle.await) }
            })
            .collect();

        let mut settled = Vec::with_capacity(pending.len());
        while let Some((index, joined)) = pending.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                tracing::error!("Lookup task for item {} failed: {}", index, e);
                LookupOutcome::TransportFailure(TransportFailure::new(
                    FailureReason::Internal,
                    format!("lookup task failed: {e}"),
                ))
            });
            settled.push((index, outcome));
        }

        settled
    }
}
