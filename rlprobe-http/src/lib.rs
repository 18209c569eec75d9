#![forbid(unsafe_code)]

mod client;
mod error;
mod types;

pub use client::{DEFAULT_CONNECT_TIMEOUT, HttpClient, validate_url};
pub use error::{Error, HttpTransportErrorKind, Result};
pub use types::HttpResponse;
