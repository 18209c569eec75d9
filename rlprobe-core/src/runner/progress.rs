use std::time::Duration;

use crate::RequestOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    BatchStarted {
        /// 1-based batch index.
        batch: u64,
        batches: u64,
        size: u64,
    },
    /// Emitted by each request task after its outcome has been tallied. Order within a batch is
    /// whatever order the tasks finish in.
    RequestCompleted { outcome: RequestOutcome },
    BatchFinished {
        batch: u64,
        batches: u64,
        size: u64,
        elapsed: Duration,
    },
}

pub type ProgressFn = std::sync::Arc<dyn Fn(ProgressEvent) + Send + Sync + 'static>;
