pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("invalid target url: {0}")]
    InvalidUrl(#[source] rlprobe_http::Error),

    #[error("`attempts` must be a positive integer")]
    InvalidAttempts,

    #[error("`batch_size` must be a positive integer")]
    InvalidBatchSize,

    #[error("`batch_size` ({batch_size}) must be less than or equal to `attempts` ({attempts})")]
    BatchSizeExceedsAttempts { attempts: u64, batch_size: u64 },

    #[error(
        "`batch_size` ({batch_size}) must be a factor of `attempts` ({attempts}); \
         e.g. attempts=10 with batch_size=5 is accepted but batch_size=6 is not"
    )]
    BatchSizeNotFactor { attempts: u64, batch_size: u64 },
}

impl Error {
    /// True for errors raised while validating a run, before any request went out.
    #[must_use]
    pub fn is_invalid_config(&self) -> bool {
        !matches!(self, Self::Join(_))
    }
}
