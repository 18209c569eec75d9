use std::collections::BTreeMap;

use parking_lot::Mutex;
use rlprobe_http::HttpTransportErrorKind;

use super::outcome::RequestOutcome;

/// Status code frequencies for a run.
///
/// `total_completed` always equals the sum of `counts`; transport failures are counted under
/// [`crate::TRANSPORT_FAILURE_STATUS`] and broken down by kind in `transport_failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTally {
    pub counts: BTreeMap<u16, u64>,
    pub total_completed: u64,
    pub transport_failures: BTreeMap<HttpTransportErrorKind, u64>,
}

impl ResultTally {
    pub fn count(&self, status: u16) -> u64 {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn transport_failures_total(&self) -> u64 {
        self.transport_failures.values().sum()
    }

    fn apply(&mut self, outcome: RequestOutcome) -> ReportAck {
        let slot = self.counts.entry(outcome.status()).or_insert(0);
        *slot += 1;
        let first_of_status = *slot == 1;
        self.total_completed += 1;

        let first_of_error_kind = match outcome.error_kind() {
            Some(kind) => {
                let slot = self.transport_failures.entry(kind).or_insert(0);
                *slot += 1;
                *slot == 1
            }
            None => false,
        };

        ReportAck {
            first_of_status,
            first_of_error_kind,
        }
    }
}

/// What a report changed, so callers can flag something the first time it shows up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportAck {
    pub first_of_status: bool,
    pub first_of_error_kind: bool,
}

/// Concurrency-safe tally shared by every request task of a run.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: Mutex<ResultTally>,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one outcome. The status count and the total move together under one lock.
    pub fn report(&self, outcome: RequestOutcome) -> ReportAck {
        self.inner.lock().apply(outcome)
    }

    pub fn snapshot(&self) -> ResultTally {
        self.inner.lock().clone()
    }

    pub fn into_tally(self) -> ResultTally {
        self.inner.into_inner()
    }
}
