use bytes::Bytes;
use http_body_util::{BodyExt as _, Empty};
use hyper::Request;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use super::{Error, HttpResponse, Result};

/// Applied when the caller does not pick a connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Checks that `url` parses and uses a scheme the client can speak.
pub fn validate_url(url: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(Error::UnsupportedScheme(url.to_string())),
    }
    if parsed.host_str().is_none() {
        return Err(Error::InvalidUrl(url.to_string()));
    }
    request_uri(&parsed)?;
    Ok(parsed)
}

/// The normalized form (percent-encoded path, punycode host) is what goes on the wire.
fn request_uri(parsed: &url::Url) -> Result<hyper::Uri> {
    parsed
        .as_str()
        .parse()
        .map_err(|_| Error::InvalidUrl(parsed.to_string()))
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        // The OS-level TCP connect timeout can be very long (tens of seconds), which makes
        // a burst against an unreachable host look hung.
        Self::new(Some(DEFAULT_CONNECT_TIMEOUT))
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(connect_timeout);

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let inner = Client::builder(TokioExecutor::new()).build(https_connector);

        Self { inner }
    }

    /// Sends one GET with no extra headers and no body.
    ///
    /// The response body is read to the end and thrown away so the connection can return to the
    /// pool. When `timeout` is set it bounds the whole exchange, body included.
    pub async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<HttpResponse> {
        let parsed = validate_url(url)?;
        let uri = request_uri(&parsed)?;

        let req = Request::builder()
            .method(http::Method::GET)
            .uri(uri)
            .body(Empty::<Bytes>::new())?;

        match timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.exchange(req)).await {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout(timeout)),
            },
            None => self.exchange(req).await,
        }
    }

    async fn exchange(&self, req: Request<Empty<Bytes>>) -> Result<HttpResponse> {
        let res = self.inner.request(req).await?;
        let status = res.status().as_u16();
        res.into_body().collect().await?;
        Ok(HttpResponse { status })
    }
}
