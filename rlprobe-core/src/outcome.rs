use rlprobe_http::HttpTransportErrorKind;

/// Status recorded for attempts that never got an HTTP response. Not a valid HTTP status.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Status codes treated as "the request went through".
pub const EXPECTED_STATUSES: [u16; 2] = [200, 204];

/// The result of one completed request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestOutcome {
    status: u16,
    succeeded: bool,
    error_kind: Option<HttpTransportErrorKind>,
}

impl RequestOutcome {
    /// The server answered, whatever the status.
    #[must_use]
    pub fn response(status: u16) -> Self {
        Self {
            status,
            succeeded: true,
            error_kind: None,
        }
    }

    /// No response: connect failure, reset, timeout and so on.
    #[must_use]
    pub fn transport_failure(kind: HttpTransportErrorKind) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            succeeded: false,
            error_kind: Some(kind),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error_kind(&self) -> Option<HttpTransportErrorKind> {
        self.error_kind
    }

    pub fn is_expected(&self) -> bool {
        self.succeeded && EXPECTED_STATUSES.contains(&self.status)
    }

    /// Single-character progress mark: `.` for an expected status, `!` for anything else.
    pub fn progress_mark(&self) -> char {
        if self.is_expected() { '.' } else { '!' }
    }
}
