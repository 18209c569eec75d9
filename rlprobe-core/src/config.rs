use std::sync::Arc;
use std::time::Duration;

use super::error::{Error, Result};

/// How `attempts` and `batch_size` must relate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum BatchPolicy {
    /// `batch_size` must divide `attempts` exactly; every batch has the same size.
    #[default]
    Strict,
    /// Any `batch_size <= attempts`; the last batch carries the remainder.
    AllowPartial,
}

/// A validated, immutable description of one probing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    url: Arc<str>,
    total_attempts: u64,
    batch_size: u64,
    policy: BatchPolicy,
    request_timeout: Option<Duration>,
}

impl RunConfig {
    pub fn new(
        url: impl Into<String>,
        total_attempts: u64,
        batch_size: u64,
        policy: BatchPolicy,
    ) -> Result<Self> {
        let url = url.into();
        rlprobe_http::validate_url(&url).map_err(Error::InvalidUrl)?;

        if total_attempts == 0 {
            return Err(Error::InvalidAttempts);
        }
        if batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        if batch_size > total_attempts {
            return Err(Error::BatchSizeExceedsAttempts {
                attempts: total_attempts,
                batch_size,
            });
        }
        if policy == BatchPolicy::Strict && total_attempts % batch_size != 0 {
            return Err(Error::BatchSizeNotFactor {
                attempts: total_attempts,
                batch_size,
            });
        }

        Ok(Self {
            url: Arc::from(url),
            total_attempts,
            batch_size,
            policy,
            request_timeout: None,
        })
    }

    /// Bounds every request; a request that runs past it is counted as a transport failure.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn shared_url(&self) -> Arc<str> {
        self.url.clone()
    }

    pub fn total_attempts(&self) -> u64 {
        self.total_attempts
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn batch_count(&self) -> u64 {
        self.total_attempts.div_ceil(self.batch_size)
    }

    /// Size of each batch, in dispatch order.
    pub fn batch_sizes(&self) -> impl Iterator<Item = u64> {
        let full = self.total_attempts / self.batch_size;
        let remainder = self.total_attempts % self.batch_size;
        let batch_size = self.batch_size;

        (0..full)
            .map(move |_| batch_size)
            .chain((remainder > 0).then_some(remainder))
    }
}
