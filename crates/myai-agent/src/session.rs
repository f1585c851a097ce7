// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agent session: one model handle, one conversation history, and the
//! speech collaborators used to answer prompts.
//!
//! Lifecycle: [`AgentSession::open`] resolves the model, [`AgentSession::wake`]
//! warms it with the bootstrap prompt, and [`AgentSession::close`] flushes the
//! transcript. A session dropped without `close` still flushes once.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use myai_config::MyaiConfig;
use myai_core::{AudioCodec, HistorySink, MyaiError, SpeechSynthesizer, Transcriber};
use tracing::{debug, info, warn};

use crate::history::{ConversationHistory, ScopedTranscript};
use crate::reply::{GenerationSettings, ReplyGenerator};
use crate::resolver::{ModelHandle, ModelResolver};

/// History component name for agent transcripts.
pub const AGENT_COMPONENT: &str = "AGENT";

/// Per-session settings derived from configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub generation: GenerationSettings,
    pub bootstrap_path: PathBuf,
    /// Rate decoded audio is resampled to before transcription.
    pub sample_rate: u32,
    /// Log request envelopes at debug level.
    pub debug: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            bootstrap_path: PathBuf::from("config/agent.json"),
            sample_rate: 16_000,
            debug: false,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &MyaiConfig) -> Self {
        Self {
            generation: GenerationSettings::from_config(&config.agent),
            bootstrap_path: config.agent.bootstrap_path.clone(),
            sample_rate: config.audio.sample_rate,
            debug: config.agent.debug,
        }
    }
}

/// External collaborators a session calls besides the language model.
#[derive(Clone)]
pub struct AgentCollaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub codec: Arc<dyn AudioCodec>,
    pub sink: Arc<dyn HistorySink>,
}

/// Snapshot reported by the health endpoint and the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHealth {
    pub session_id: String,
    pub awake: bool,
    pub model: String,
    pub history_len: usize,
}

/// Owns the model handle and conversation history for one agent.
///
/// Not reentrant: callers sharing a session across tasks serialize access
/// (the gateway wraps it in a `tokio::sync::Mutex`).
pub struct AgentSession {
    session_id: String,
    pub(crate) settings: SessionSettings,
    pub(crate) handle: ModelHandle,
    pub(crate) generator: ReplyGenerator,
    pub(crate) transcript: ScopedTranscript,
    pub(crate) collaborators: AgentCollaborators,
    /// Set once wake succeeds; guards against a second bootstrap turn.
    greeting: Option<String>,
    /// Mirrors `greeting.is_some()` for readers that do not hold the session.
    awake: Arc<AtomicBool>,
}

impl AgentSession {
    /// Resolves the model and prepares it for generation.
    ///
    /// Fails only when no model at all can be loaded, or when the embedding
    /// table cannot be aligned with the tokenizer.
    pub async fn open(
        resolver: &ModelResolver,
        collaborators: AgentCollaborators,
        settings: SessionSettings,
    ) -> Result<Self, MyaiError> {
        let mut handle = resolver.resolve().await?;
        handle.set_token_padding();
        handle.align_embeddings().await?;
        Ok(Self::new(handle, collaborators, settings))
    }

    /// Wraps an already-prepared model handle.
    pub fn new(
        handle: ModelHandle,
        collaborators: AgentCollaborators,
        settings: SessionSettings,
    ) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        info!(session = %session_id, model = %handle.source, "agent session created");
        let transcript = ScopedTranscript::new(AGENT_COMPONENT, collaborators.sink.clone());
        Self {
            session_id,
            generator: ReplyGenerator::new(settings.generation),
            settings,
            handle,
            transcript,
            collaborators,
            greeting: None,
            awake: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    pub fn history(&self) -> &ConversationHistory {
        self.transcript.history()
    }

    pub fn is_awake(&self) -> bool {
        self.greeting.is_some()
    }

    /// Shared flag that turns true once wake succeeds. Readable without
    /// locking the session, so health probes never wait on a generation.
    pub fn awake_flag(&self) -> Arc<AtomicBool> {
        self.awake.clone()
    }

    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    /// Warms the pipeline with the bootstrap prompt and records the greeting.
    ///
    /// Runs at most once successfully. Failures are logged and leave the
    /// session usable without a greeting; a later call retries.
    pub async fn wake(&mut self) -> bool {
        if self.greeting.is_some() {
            debug!(session = %self.session_id, "agent already awake");
            return true;
        }

        match self.try_wake().await {
            Ok(greeting) => {
                info!(session = %self.session_id, chars = greeting.len(), "agent awake");
                self.greeting = Some(greeting);
                self.awake.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                warn!(
                    session = %self.session_id,
                    error = %e,
                    "failed to wake agent, continuing without warm-up"
                );
                false
            }
        }
    }

    async fn try_wake(&mut self) -> Result<String, MyaiError> {
        let bootstrap = myai_config::load_bootstrap(&self.settings.bootstrap_path)
            .map_err(|e| MyaiError::Config(e.to_string()))?;

        if self.handle.needs_padding() {
            self.handle.set_token_padding();
        }
        self.handle.align_context_limit();
        self.handle.align_embeddings().await?;
        self.handle.model.set_seed(bootstrap.seed);

        info!(session = %self.session_id, seed = bootstrap.seed, "waking agent");
        self.generator
            .generate_greeting(
                &self.handle,
                self.transcript.history_mut(),
                &bootstrap.startup_prompt,
            )
            .await
    }

    /// Generates a reply to `user_input`, recording both turns on success.
    pub async fn generate_reply(&mut self, user_input: &str) -> Result<String, MyaiError> {
        self.handle.align_embeddings().await?;
        self.generator
            .generate_reply(&self.handle, self.transcript.history_mut(), user_input)
            .await
    }

    pub fn health(&self) -> SessionHealth {
        SessionHealth {
            session_id: self.session_id.clone(),
            awake: self.is_awake(),
            model: self.handle.source.to_string(),
            history_len: self.history().len(),
        }
    }

    /// Flushes the transcript and ends the session.
    ///
    /// Returns the transcript path. A flush failure is returned after the
    /// session is released; the transcript is not retried.
    pub async fn close(mut self) -> Result<Option<PathBuf>, MyaiError> {
        let flushed = self.transcript.flush();
        if let Err(e) = &flushed {
            warn!(session = %self.session_id, error = %e, "failed to save agent history");
        }
        info!(session = %self.session_id, "agent session destroyed");
        flushed
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("session_id", &self.session_id)
            .field("handle", &self.handle)
            .field("history_len", &self.history().len())
            .field("awake", &self.is_awake())
            .finish_non_exhaustive()
    }
}
