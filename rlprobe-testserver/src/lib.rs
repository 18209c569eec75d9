use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_OK: &str = "/ok";
pub const PATH_NO_CONTENT: &str = "/no-content";
pub const PATH_STATUS: &str = "/status/{code}";
pub const PATH_LIMITED: &str = "/limited";
pub const PATH_SLOW: &str = "/slow";
pub const PATH_HANG: &str = "/hang";

/// Requests to `/limited` answered with 200 before it starts answering 429.
pub const DEFAULT_RATE_LIMIT: u64 = 5;

const DEFAULT_SLOW_MS: u64 = 50;
const HANG_FOR: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    limited_total: Arc<AtomicU64>,
    in_flight: Arc<AtomicU64>,
    max_in_flight: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn enter(&self) -> InFlightGuard<'_> {
        self.inc_requests_total();
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_in_flight.fetch_max(now, Ordering::AcqRel);
        InFlightGuard { stats: self }
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Requests to `/limited` (both admitted and rejected).
    pub fn limited_total(&self) -> u64 {
        self.limited_total.load(Ordering::Relaxed)
    }

    /// Highest number of handlers observed running at the same time.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::Acquire)
    }
}

struct InFlightGuard<'a> {
    stats: &'a TestServerStats,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub rate_limit: u64,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    pub ok: String,
    pub no_content: String,
    pub limited: String,
    pub slow: String,
    pub hang: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        Self {
            ok: format!("{base_url}{PATH_OK}"),
            no_content: format!("{base_url}{PATH_NO_CONTENT}"),
            limited: format!("{base_url}{PATH_LIMITED}"),
            slow: format!("{base_url}{PATH_SLOW}"),
            hang: format!("{base_url}{PATH_HANG}"),
            base_url,
        }
    }

    /// URL that always answers with `code`.
    pub fn status(&self, code: u16) -> String {
        format!("{}/status/{code}", self.base_url)
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    rate_limit: u64,
}

async fn handle_ok(State(state): State<AppState>) -> &'static str {
    let _guard = state.stats.enter();
    "ok"
}

async fn handle_no_content(State(state): State<AppState>) -> StatusCode {
    let _guard = state.stats.enter();
    StatusCode::NO_CONTENT
}

async fn handle_status(State(state): State<AppState>, Path(code): Path<u16>) -> StatusCode {
    let _guard = state.stats.enter();
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn handle_limited(State(state): State<AppState>) -> Response {
    let _guard = state.stats.enter();

    let seen = state.stats.limited_total.fetch_add(1, Ordering::AcqRel);
    if seen < state.rate_limit {
        return (StatusCode::OK, "ok").into_response();
    }

    let mut res = StatusCode::TOO_MANY_REQUESTS.into_response();
    res.headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    res
}

#[derive(Debug, Deserialize)]
struct SlowQuery {
    ms: Option<u64>,
}

async fn handle_slow(State(state): State<AppState>, Query(q): Query<SlowQuery>) -> &'static str {
    let _guard = state.stats.enter();
    sleep(Duration::from_millis(q.ms.unwrap_or(DEFAULT_SLOW_MS))).await;
    "slow"
}

async fn handle_hang(State(state): State<AppState>) -> &'static str {
    let _guard = state.stats.enter();
    sleep(HANG_FOR).await;
    "late"
}

pub fn router(stats: TestServerStats, config: &TestServerConfig) -> Router {
    let state = AppState {
        stats,
        rate_limit: config.rate_limit,
    };

    Router::new()
        .route(PATH_OK, get(handle_ok))
        .route(PATH_NO_CONTENT, get(handle_no_content))
        .route(PATH_STATUS, get(handle_status))
        .route(PATH_LIMITED, get(handle_limited))
        .route(PATH_SLOW, get(handle_slow))
        .route(PATH_HANG, get(handle_hang))
        .with_state(state)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    urls: TestServerUrls,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerConfig::default()).await
    }

    pub async fn start_with(config: TestServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();

        let app = router(stats.clone(), &config);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        let base_url = format!("http://{addr}");
        let urls = TestServerUrls::new(base_url.clone());

        Ok(Self {
            addr,
            base_url,
            urls,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
