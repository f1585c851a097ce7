// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `myai serve` command implementation.
//!
//! Builds the collaborators from configuration, opens the agent and caption
//! sessions, warms the agent up, and serves the gateway until SIGTERM or
//! Ctrl+C. Both transcripts are flushed on the way out.

use std::sync::Arc;

use myai_agent::{
    AgentCollaborators, AgentSession, CaptionSession, JsonHistoryStore, ModelResolver,
    SessionSettings,
};
use myai_config::MyaiConfig;
use myai_core::{HistorySink, MyaiError, PluginAdapter};
use myai_gateway::{GatewayState, RouteTable, ServerConfig};
use myai_inference::{InferenceStack, SymphoniaCodec};
use tracing::{debug, info, warn};

/// Resolves the model and opens an agent session over the configured
/// collaborators.
pub async fn open_agent(
    config: &MyaiConfig,
    stack: &InferenceStack,
    sink: Arc<dyn HistorySink>,
) -> Result<AgentSession, MyaiError> {
    let resolver = ModelResolver::from_config(stack.loader.clone(), &config.model);
    let collaborators = AgentCollaborators {
        transcriber: stack.transcriber.clone(),
        synthesizer: stack.synthesizer.clone(),
        codec: Arc::new(SymphoniaCodec::new()),
        sink,
    };
    AgentSession::open(&resolver, collaborators, SessionSettings::from_config(config)).await
}

fn server_config(config: &MyaiConfig) -> ServerConfig {
    let gateway = &config.gateway;
    ServerConfig {
        host: gateway.host.clone(),
        port: gateway.port,
        routes: RouteTable {
            asr: gateway.route_asr.clone(),
            tts: gateway.route_tts.clone(),
            caption: gateway.route_caption.clone(),
            training: gateway.route_training.clone(),
        },
        max_body_bytes: gateway.max_body_bytes,
    }
}

/// Runs the `myai serve` command.
pub async fn run_serve(config: MyaiConfig) -> Result<(), MyaiError> {
    info!(
        name = %config.agent.name,
        model = %config.model.default_model,
        inference = %config.model.inference_url,
        "starting myai"
    );

    let stack = InferenceStack::from_config(&config)?;
    let sink: Arc<dyn HistorySink> = Arc::new(JsonHistoryStore::new(&config.history.dir));

    let mut agent = open_agent(&config, &stack, sink.clone()).await?;
    if !agent.wake().await {
        warn!("agent warm-up failed; serving without a greeting");
    }
    let captions = CaptionSession::new(stack.captioner.clone(), sink);

    let state = GatewayState::new(agent, captions, stack.trainer.clone())
        .with_adapters(stack.adapters.clone());
    let cancel = myai_agent::install_signal_handler();

    myai_gateway::start_server(&server_config(&config), state.clone(), cancel).await?;

    close_sessions(state).await;
    shutdown_adapters(&stack.adapters).await;
    info!("myai serve shutdown complete");
    Ok(())
}

/// Flushes both transcripts once the server has released its state.
async fn close_sessions(state: GatewayState) {
    let GatewayState {
        agent, captions, ..
    } = state;

    match Arc::try_unwrap(agent) {
        Ok(agent) => {
            if let Err(e) = agent.into_inner().close().await {
                warn!(error = %e, "failed to flush agent transcript");
            }
        }
        // Dropping the last handle flushes through the transcript guard.
        Err(_) => warn!("agent session still shared at shutdown"),
    }

    match Arc::try_unwrap(captions) {
        Ok(captions) => {
            if let Err(e) = captions.into_inner().close() {
                warn!(error = %e, "failed to flush caption transcript");
            }
        }
        Err(_) => warn!("caption session still shared at shutdown"),
    }
}

/// Shuts every collaborator down. Failures are logged and do not stop the
/// remaining adapters.
pub async fn shutdown_adapters(adapters: &[Arc<dyn PluginAdapter>]) {
    for adapter in adapters {
        match adapter.shutdown().await {
            Ok(()) => debug!(adapter = adapter.name(), "adapter shut down"),
            Err(e) => warn!(adapter = adapter.name(), error = %e, "adapter shutdown error"),
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("myai={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
