use std::future::Future;
use std::pin::Pin;

use rlprobe_http::HttpClient;

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = rlprobe_http::Result<u16>> + Send + 'a>>;

/// Issues a single GET and yields the response status.
///
/// Implementations must not retry. Timeouts are applied by the caller.
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a> {
        Box::pin(async move {
            let res = self.client.get(url, None).await?;
            Ok(res.status)
        })
    }
}
