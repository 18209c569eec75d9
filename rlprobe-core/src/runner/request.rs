use std::time::Duration;

use tracing::trace;

use crate::{RequestOutcome, Transport};

/// Performs one attempt against `url`. Never fails: transport errors and timeouts come back as
/// sentinel outcomes so the attempt is still counted.
pub async fn perform_request(
    transport: &dyn Transport,
    url: &str,
    timeout: Option<Duration>,
) -> RequestOutcome {
    let res = match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, transport.get(url)).await {
            Ok(res) => res,
            Err(_) => Err(rlprobe_http::Error::Timeout(timeout)),
        },
        None => transport.get(url).await,
    };

    match res {
        Ok(status) => RequestOutcome::response(status),
        Err(err) => {
            trace!(error = %err, "request failed");
            RequestOutcome::transport_failure(err.transport_error_kind())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpTransportErrorKind, TRANSPORT_FAILURE_STATUS, TransportFuture};

    struct Fixed(u16);

    impl Transport for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn get<'a>(&'a self, _url: &'a str) -> TransportFuture<'a> {
            Box::pin(async move { Ok(self.0) })
        }
    }

    struct Never;

    impl Transport for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn get<'a>(&'a self, _url: &'a str) -> TransportFuture<'a> {
            Box::pin(std::future::pending::<rlprobe_http::Result<u16>>())
        }
    }

    struct Refused;

    impl Transport for Refused {
        fn name(&self) -> &'static str {
            "refused"
        }

        fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a> {
            Box::pin(async move { Err(rlprobe_http::Error::InvalidUrl(url.to_string())) })
        }
    }

    #[tokio::test]
    async fn response_becomes_successful_outcome() {
        let o = perform_request(&Fixed(429), "http://x/", None).await;
        assert_eq!(o, RequestOutcome::response(429));
        assert!(o.succeeded());
    }

    #[tokio::test]
    async fn timeout_becomes_sentinel_outcome() {
        let o = perform_request(&Never, "http://x/", Some(Duration::from_millis(20))).await;
        assert_eq!(o.status(), TRANSPORT_FAILURE_STATUS);
        assert_eq!(o.error_kind(), Some(HttpTransportErrorKind::Timeout));
    }

    #[tokio::test]
    async fn transport_error_keeps_its_kind() {
        let o = perform_request(&Refused, "http://x/", None).await;
        assert!(!o.succeeded());
        assert_eq!(o.error_kind(), Some(HttpTransportErrorKind::InvalidUrl));
    }
}
