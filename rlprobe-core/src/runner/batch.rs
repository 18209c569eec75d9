use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::progress::{ProgressEvent, ProgressFn};
use super::request::perform_request;
use crate::error::{Error, Result};
use crate::{ReportAck, RequestOutcome, ResultAggregator, ResultTally, RunConfig, Transport};

/// Fires a run as a sequence of concurrent batches.
///
/// Every request of a batch is spawned at once, and the batch is fully joined before the next one
/// is spawned, so no more than `batch_size` requests are ever in flight.
pub struct BatchRunner {
    transport: Arc<dyn Transport>,
    progress: Option<ProgressFn>,
}

struct PlannedBatch {
    batch: u64,
    batches: u64,
    size: u64,
}

impl BatchRunner {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn run(&self, config: &RunConfig) -> Result<ResultTally> {
        let aggregator = Arc::new(ResultAggregator::new());
        let batches = config.batch_count();

        info!(
            url = config.url(),
            attempts = config.total_attempts(),
            batch_size = config.batch_size(),
            batches,
            policy = %config.policy(),
            transport = self.transport.name(),
            "starting run"
        );

        for (idx, size) in config.batch_sizes().enumerate() {
            let plan = PlannedBatch {
                batch: idx as u64 + 1,
                batches,
                size,
            };
            self.run_batch(&plan, config, &aggregator).await?;
        }

        // Every task has been joined, nothing else reports from here on.
        let tally = aggregator.snapshot();
        info!(total_completed = tally.total_completed, "run finished");
        Ok(tally)
    }

    async fn run_batch(
        &self,
        plan: &PlannedBatch,
        config: &RunConfig,
        aggregator: &Arc<ResultAggregator>,
    ) -> Result<()> {
        debug!(batch = plan.batch, batches = plan.batches, size = plan.size, "batch started");
        self.emit(ProgressEvent::BatchStarted {
            batch: plan.batch,
            batches: plan.batches,
            size: plan.size,
        });

        let started = Instant::now();
        let url = config.shared_url();
        let timeout = config.request_timeout();

        let mut tasks = JoinSet::new();
        for _ in 0..plan.size {
            let transport = self.transport.clone();
            let url = url.clone();
            let aggregator = aggregator.clone();
            let progress = self.progress.clone();

            tasks.spawn(async move {
                let outcome = perform_request(transport.as_ref(), &url, timeout).await;
                let ack = aggregator.report(outcome);
                flag_first_sighting(outcome, ack);
                if let Some(progress) = &progress {
                    progress(ProgressEvent::RequestCompleted { outcome });
                }
            });
        }

        // Drain the whole batch even if a task blew up, so the barrier still holds.
        let mut first_err: Option<Error> = None;
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!(batch = plan.batch, error = %err, "request task failed");
                first_err.get_or_insert(Error::Join(err));
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }

        let elapsed = started.elapsed();
        debug!(batch = plan.batch, elapsed_ms = elapsed.as_millis() as u64, "batch finished");
        self.emit(ProgressEvent::BatchFinished {
            batch: plan.batch,
            batches: plan.batches,
            size: plan.size,
            elapsed,
        });

        Ok(())
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress(event);
        }
    }
}

fn flag_first_sighting(outcome: RequestOutcome, ack: ReportAck) {
    match outcome.error_kind() {
        Some(kind) if ack.first_of_error_kind => {
            warn!(kind = %kind, "transport failure; counted under status 0");
        }
        Some(_) => {}
        None if ack.first_of_status && !outcome.is_expected() => {
            info!(status = outcome.status(), "first unexpected status code");
        }
        None => {}
    }
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("transport", &self.transport.name())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
