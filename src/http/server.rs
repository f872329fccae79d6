//! HTTP server setup for the ack demonstration service.
//!
//! # Responsibilities
//! - Create Axum Router with the ack-speaking handlers
//! - Wire up middleware (tracing, request timeout)
//! - Serve `/metrics` from the injected Prometheus registry
//! - Bind server to listener and stop on shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AckServerConfig;
use crate::envelope::kinds;
use crate::http::acknowledger::AckService;
use crate::http::adapter::AxumContext;
use crate::observability::AckMetrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub acks: Arc<AckService>,
    pub metrics_handle: Option<PrometheusHandle>,
    pub max_body_bytes: usize,
}

/// Body accepted by `POST /echo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoRequest {
    pub message: String,
}

/// HTTP server answering every request with an ack.
pub struct HttpServer {
    router: Router,
    config: AckServerConfig,
}

impl HttpServer {
    /// Create a server with its own Prometheus registry (or none, if disabled).
    pub fn new(config: AckServerConfig) -> Self {
        if config.observability.metrics_enabled {
            let (metrics, handle) = AckMetrics::prometheus();
            Self::with_metrics(config, metrics, Some(handle))
        } else {
            Self::with_metrics(config, AckMetrics::noop(), None)
        }
    }

    /// Create a server around an existing metrics registry.
    pub fn with_metrics(
        config: AckServerConfig,
        metrics: AckMetrics,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        let state = AppState {
            acks: Arc::new(AckService::new(config.identity.clone(), metrics)),
            metrics_handle,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AckServerConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/test", get(test_handler))
            .route("/echo", post(echo_handler));

        if state.metrics_handle.is_some() {
            router = router.route("/metrics", get(metrics_handler));
        }

        router
            .fallback(not_found_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// A clone of the router, for serving or driving it in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            agent = %self.config.identity.agent,
            service_env = %self.config.identity.service_env,
            service_ns = %self.config.identity.service_ns,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AckServerConfig {
        &self.config
    }
}

async fn test_handler(State(state): State<AppState>, request: Request) -> Response {
    let mut ctx = AxumContext::new(request, state.max_body_bytes);
    state
        .acks
        .begin(&mut ctx)
        .send(kinds::MESSAGE, "A test message.");
    ctx.into_response()
}

async fn echo_handler(State(state): State<AppState>, request: Request) -> Response {
    let mut ctx = AxumContext::new(request, state.max_body_bytes);
    let ack = state.acks.begin(&mut ctx);

    match ack.decode_body_or_abort::<EchoRequest>().await {
        Ok((echo, ack)) => ack.send("Echo", echo),
        Err(e) => tracing::debug!(
            error = %e,
            cause = ?std::error::Error::source(&e),
            "Echo request rejected"
        ),
    }

    ctx.into_response()
}

async fn not_found_handler(State(state): State<AppState>, request: Request) -> Response {
    let mut ctx = AxumContext::new(request, state.max_body_bytes);
    let ack = state.acks.begin(&mut ctx);
    let message = format!("no route for {}", ack.ack().location());
    ack.abort_with_error(404, "NotFound", message);
    ctx.into_response()
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Wait for Ctrl+C or an internal shutdown trigger.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = shutdown.recv() => {}
    }
    tracing::info!("Shutdown signal received");
}
