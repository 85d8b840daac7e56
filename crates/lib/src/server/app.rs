//! Relay HTTP server (single port).

use crate::automation::AutomationForwarder;
use crate::chat::SendbirdClient;
use crate::config::{self, Config, RelaySettings};
use crate::pipeline::IngestPipeline;
use crate::state::LatestState;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

const NO_PAYLOAD_MESSAGE: &str = "No webhook payload received yet";
const NO_EMAIL_MESSAGE: &str = "No email received yet";

/// Shared state for the handlers: the latest-state store and the pipeline that writes it.
#[derive(Clone)]
pub struct AppState {
    /// Port reported by the health endpoint.
    pub port: u16,
    pub latest: Arc<LatestState>,
    pub pipeline: Arc<IngestPipeline>,
}

impl AppState {
    /// Wire a fresh store, the Sendbird client and the automation forwarder from resolved settings.
    pub fn from_settings(settings: &RelaySettings, port: u16) -> Self {
        let latest = Arc::new(LatestState::new());
        let source = Arc::new(SendbirdClient::new(
            settings.api_base.clone(),
            settings.api_token.clone(),
        ));
        let sink = Arc::new(AutomationForwarder::new(settings.webhook_url.clone()));
        let pipeline = Arc::new(IngestPipeline::new(latest.clone(), source, sink));
        Self {
            port,
            latest,
            pipeline,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/sbwebhook", post(sendbird_webhook))
        .route("/latest_webhook", get(latest_webhook))
        .route("/latest_email", get(latest_email))
        .with_state(state)
}

/// Serve on an already-bound listener until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server exited")?;
    log::info!("relay stopped");
    Ok(())
}

/// Run the relay; binds to config.server.bind:config.server.port.
/// Fails before binding when the chat API token or automation webhook URL is missing.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_server(config: Config) -> Result<()> {
    let settings = config::resolve_settings(&config).context("invalid relay configuration")?;
    let state = AppState::from_settings(&settings, config.server.port);

    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("relay listening on {}", bind_addr);
    serve(listener, state).await
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /sbwebhook — Sendbird webhook. Runs the pipeline inline; the answer never depends on its outcome.
async fn sendbird_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let outcome = state.pipeline.handle_body(&body).await;
    log::debug!("webhook outcome: {:?}", outcome);
    Json(json!({ "status": "ok" }))
}

/// GET /latest_webhook returns the last accepted payload verbatim.
async fn latest_webhook(State(state): State<AppState>) -> Json<Value> {
    match state.latest.payload().await {
        Some(payload) => Json(payload),
        None => Json(json!({ "message": NO_PAYLOAD_MESSAGE })),
    }
}

/// GET /latest_email
async fn latest_email(State(state): State<AppState>) -> Json<Value> {
    match state.latest.email().await {
        Some(email) => Json(json!({ "email": email })),
        None => Json(json!({ "message": NO_EMAIL_MESSAGE })),
    }
}

/// GET / returns a simple health JSON.
async fn health_http(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}
