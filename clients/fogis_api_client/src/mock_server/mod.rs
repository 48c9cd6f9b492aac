mod data;
mod history;
mod login;

use axum::{
    extract::{Request, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Span};

use crate::config::{ClientConfig, MockServerConfig};

pub use history::{RequestHistory, RequestRecord};

const FIRST_GENERATED_ID: i64 = 900_000;

#[derive(Clone)]
pub struct MockServerState {
    pub config: Arc<MockServerConfig>,
    pub history: RequestHistory,
    validation: Arc<AtomicBool>,
    next_id: Arc<AtomicI64>,
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl MockServerState {
    pub fn new(config: MockServerConfig) -> Self {
        let validation = Arc::new(AtomicBool::new(config.validate_requests));
        Self {
            config: Arc::new(config),
            history: RequestHistory::default(),
            validation,
            next_id: Arc::new(AtomicI64::new(FIRST_GENERATED_ID)),
            shutdown_tx: Arc::new(Mutex::new(None)),
        }
    }

    pub fn validation_enabled(&self) -> bool {
        self.validation.load(Ordering::SeqCst)
    }

    pub fn set_validation(&self, enabled: bool) {
        self.validation.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn install_shutdown(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        *self.shutdown_tx.lock() = Some(tx);
        rx
    }

    /// Fires the shutdown signal once. Later calls are no-ops.
    fn trigger_shutdown(&self) -> bool {
        match self.shutdown_tx.lock().take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now() }))
}

async fn history_handler(State(state): State<MockServerState>) -> Json<Value> {
    Json(json!({ "requests": state.history.snapshot() }))
}

async fn clear_history_handler(State(state): State<MockServerState>) -> Json<Value> {
    state.history.clear();
    Json(json!({ "status": "success", "message": "Request history cleared" }))
}

fn validation_status(state: &MockServerState) -> Json<Value> {
    Json(json!({ "validation_enabled": state.validation_enabled() }))
}

async fn enable_validation_handler(State(state): State<MockServerState>) -> Json<Value> {
    state.set_validation(true);
    info!("Request validation enabled");
    validation_status(&state)
}

async fn disable_validation_handler(State(state): State<MockServerState>) -> Json<Value> {
    state.set_validation(false);
    info!("Request validation disabled");
    validation_status(&state)
}

async fn validation_status_handler(State(state): State<MockServerState>) -> Json<Value> {
    validation_status(&state)
}

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<MockServerState>) -> Json<Value> {
    let triggered = state.trigger_shutdown();
    info!("Shutdown requested (server stopping: {})", triggered);
    Json(json!({ "status": "shutting down", "triggered": triggered }))
}

pub fn build_router(state: MockServerState, span: Span) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request| {
        tracing::info_span!(
            parent: &span,
            "mock_request",
            method = %request.method(),
            uri = %request.uri()
        )
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/request-history", get(history_handler))
        .route("/clear-request-history", post(clear_history_handler))
        .route("/validation/enable", post(enable_validation_handler))
        .route("/validation/disable", post(disable_validation_handler))
        .route("/validation/status", get(validation_status_handler))
        .route("/shutdown", post(shutdown_handler))
        .route("/mdk/", get(login::home_handler))
        .route(
            "/mdk/Login.aspx",
            get(login::login_page_handler).post(login::login_submit_handler),
        )
        .route(
            "/mdk/MatchWebMetoder.aspx/{operation}",
            post(data::method_handler),
        )
        .layer(trace)
        .with_state(state)
}

pub struct MockFogisServer {
    state: MockServerState,
    span: Span,
}

impl MockFogisServer {
    pub fn new(config: MockServerConfig) -> Self {
        Self {
            state: MockServerState::new(config),
            span: tracing::info_span!("mock_fogis_server"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn state(&self) -> &MockServerState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.span.clone())
    }

    /// Runs on the current runtime until `signal` resolves or `/shutdown` is hit.
    pub async fn serve<F>(self, signal: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let config = &self.state.config;
        let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
        let addr = listener.local_addr()?;
        info!(
            parent: &self.span,
            "Mock FOGIS server listening on {} (validation: {})",
            addr,
            self.state.validation_enabled()
        );

        let shutdown_rx = self.state.install_shutdown();
        let router = self.router();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signal => {}
                    _ = shutdown_rx => {}
                }
            })
            .await
    }

    /// Starts the server on a background thread with its own runtime.
    ///
    /// The socket is bound before this returns, so the handle's URL is usable
    /// immediately.
    pub fn spawn(self) -> io::Result<MockServerHandle> {
        let config = &self.state.config;
        let listener = std::net::TcpListener::bind((config.host.as_str(), config.port))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let shutdown_rx = self.state.install_shutdown();
        let router = self.router();
        let span = self.span.clone();

        let thread = std::thread::Builder::new()
            .name("mock-fogis-server".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(e) => {
                            error!(parent: &span, "Could not adopt listener: {}", e);
                            return;
                        }
                    };
                    info!(parent: &span, "Mock FOGIS server listening on {}", addr);
                    let served = axum::serve(listener, router)
                        .with_graceful_shutdown(async move {
                            let _ = shutdown_rx.await;
                        })
                        .await;
                    if let Err(e) = served {
                        error!(parent: &span, "Mock FOGIS server stopped with error: {}", e);
                    }
                })
            })?;

        Ok(MockServerHandle {
            addr,
            state: self.state,
            thread: Some(thread),
        })
    }
}

/// A running server. Dropping it shuts the server down.
pub struct MockServerHandle {
    addr: SocketAddr,
    state: MockServerState,
    thread: Option<JoinHandle<()>>,
}

impl MockServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/mdk", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::with_base_url(self.base_url())
    }

    pub fn history(&self) -> &RequestHistory {
        &self.state.history
    }

    pub fn clear_history(&self) {
        self.state.history.clear();
    }

    pub fn set_validation(&self, enabled: bool) {
        self.state.set_validation(enabled);
    }

    pub fn validation_enabled(&self) -> bool {
        self.state.validation_enabled()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.state.trigger_shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for MockServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
