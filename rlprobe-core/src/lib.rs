#![forbid(unsafe_code)]

mod config;
mod error;
mod outcome;
mod tally;
mod transport;

pub mod runner;

pub use config::{BatchPolicy, RunConfig};
pub use error::{Error, Result};
pub use outcome::{EXPECTED_STATUSES, RequestOutcome, TRANSPORT_FAILURE_STATUS};
pub use runner::{BatchRunner, ProgressEvent, ProgressFn, perform_request};
pub use tally::{ReportAck, ResultAggregator, ResultTally};
pub use transport::{HttpTransport, Transport, TransportFuture};

pub use rlprobe_http::{DEFAULT_CONNECT_TIMEOUT, HttpClient, HttpTransportErrorKind};
