// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use myai_agent::{AgentSession, CaptionSession};
use myai_core::{MyaiError, PluginAdapter, TrainingLauncher};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
///
/// Sessions sit behind async mutexes so a prompt holds its session for the
/// whole transcribe/generate/narrate sequence. `/health` reads only the
/// lock-free fields.
#[derive(Clone)]
pub struct GatewayState {
    pub agent: Arc<Mutex<AgentSession>>,
    pub captions: Arc<Mutex<CaptionSession>>,
    /// `None` when no training command is configured.
    pub trainer: Option<Arc<dyn TrainingLauncher>>,
    /// The agent's wake flag, shared with the session.
    pub awake: Arc<AtomicBool>,
    /// Collaborators probed by `/health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    pub fn new(
        agent: AgentSession,
        captions: CaptionSession,
        trainer: Option<Arc<dyn TrainingLauncher>>,
    ) -> Self {
        Self {
            awake: agent.awake_flag(),
            agent: Arc::new(Mutex::new(agent)),
            captions: Arc::new(Mutex::new(captions)),
            trainer,
            adapters: Vec::new(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Sets the collaborators whose health `/health` reports.
    pub fn with_adapters(mut self, adapters: Vec<Arc<dyn PluginAdapter>>) -> Self {
        self.adapters = adapters;
        self
    }
}

/// Paths of the gateway routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub asr: String,
    pub tts: String,
    pub caption: String,
    pub training: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            asr: "/api/v1/asr".to_string(),
            tts: "/api/v1/tts".to_string(),
            caption: "/api/v1/caption".to_string(),
            training: "/api/v1/training".to_string(),
        }
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from myai-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub routes: RouteTable,
    /// Largest accepted request body (audio or image upload).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            routes: RouteTable::default(),
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Builds the gateway router.
///
/// - POST `routes.asr`: raw audio bytes, `?mode=&narrateResponse=`
/// - POST `routes.tts`: `userMessage` as form field or JSON
/// - POST `routes.caption`: raw image bytes, optional `?prompt=`
/// - POST `routes.training`: start a fine-tuning run
/// - GET /health
pub fn router(config: &ServerConfig, state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route(&config.routes.asr, post(handlers::post_asr))
        .route(&config.routes.tts, post(handlers::post_tts))
        .route(&config.routes.caption, post(handlers::post_caption))
        .route(&config.routes.training, post(handlers::post_training))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), MyaiError> {
    let app = router(config, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MyaiError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| MyaiError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
