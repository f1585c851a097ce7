// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply generation over a conversation history.
//!
//! A turn is built from the history plus the pending user record, sent to the
//! generation collaborator under a bounded wait, and committed to the history
//! only once the decoded reply is in hand.

use std::time::Duration;

use myai_core::{InteractionRecord, MyaiError, Role};
use tracing::{debug, warn};

use crate::history::ConversationHistory;
use crate::resolver::ModelHandle;

/// Generation limits applied to every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
    pub max_new_tokens: u32,
    /// Last-N history entries used for flat context. `None` uses all of them.
    pub context_window: Option<usize>,
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_new_tokens: 128,
            context_window: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl GenerationSettings {
    pub fn from_config(config: &myai_config::model::AgentConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            context_window: config.context_window,
            timeout: Duration::from_secs(config.generation_timeout_secs),
        }
    }
}

/// Builds prompts and runs generation calls against a [`ModelHandle`].
#[derive(Debug, Clone, Default)]
pub struct ReplyGenerator {
    settings: GenerationSettings,
}

impl ReplyGenerator {
    pub fn new(settings: GenerationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Renders the generation prompt for `pending` on top of `history`.
    ///
    /// Uses the tokenizer's chat template over the full history when one is
    /// available, otherwise the space-joined contents of the context window.
    pub fn build_prompt(
        &self,
        handle: &ModelHandle,
        history: &ConversationHistory,
        pending: &InteractionRecord,
    ) -> Result<String, MyaiError> {
        match handle.tokenizer.chat_template() {
            Some(template) => {
                let mut turns = history.records().to_vec();
                turns.push(pending.clone());
                template.render(&turns, true)
            }
            None => Ok(history.render_context_with(self.settings.context_window, pending)),
        }
    }

    /// Runs one generation call and decodes the continuation.
    pub async fn complete(&self, handle: &ModelHandle, prompt: &str) -> Result<String, MyaiError> {
        let mut input_ids = handle.tokenizer.encode(prompt)?;

        if let Some(limit) = handle.input_limit(self.settings.max_new_tokens) {
            if input_ids.len() > limit {
                let dropped = input_ids.len() - limit;
                debug!(dropped, limit, "prompt exceeds context, dropping oldest tokens");
                input_ids.drain(..dropped);
            }
        }

        let output = tokio::time::timeout(
            self.settings.timeout,
            handle.model.generate(&input_ids, self.settings.max_new_tokens),
        )
        .await
        .map_err(|_| MyaiError::Timeout {
            duration: self.settings.timeout,
        })??;

        let continuation = if handle.model.echoes_prompt() {
            output.get(input_ids.len()..).unwrap_or_default()
        } else {
            &output[..]
        };

        let text = handle.tokenizer.decode(continuation, true)?;
        Ok(text.trim().to_string())
    }

    /// Generates a reply to `user_input`, recording the user and agent turns.
    ///
    /// Nothing is appended when generation fails.
    pub async fn generate_reply(
        &self,
        handle: &ModelHandle,
        history: &mut ConversationHistory,
        user_input: &str,
    ) -> Result<String, MyaiError> {
        let pending = InteractionRecord::new(Role::User, user_input);
        let prompt = self.build_prompt(handle, history, &pending)?;

        let reply = match self.complete(handle, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "reply generation failed, turn not recorded");
                return Err(e);
            }
        };

        history.append(pending);
        history.record(Role::Agent, reply.clone());
        Ok(reply)
    }

    /// Runs a warm-up prompt and records only the agent's greeting.
    pub async fn generate_greeting(
        &self,
        handle: &ModelHandle,
        history: &mut ConversationHistory,
        startup_prompt: &str,
    ) -> Result<String, MyaiError> {
        let pending = InteractionRecord::new(Role::User, startup_prompt);
        let prompt = self.build_prompt(handle, history, &pending)?;
        let greeting = self.complete(handle, &prompt).await?;
        history.record(Role::Agent, greeting.clone());
        Ok(greeting)
    }
}
