// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image captioning session with its own transcript.

use std::path::PathBuf;
use std::sync::Arc;

use myai_core::{HistorySink, ImageCaptioner, ImageEnvelope, MyaiError, Role};
use tracing::info;

use crate::history::{ConversationHistory, ScopedTranscript};

/// History component name for caption transcripts.
pub const CAPTION_COMPONENT: &str = "CAPTION";

/// Prefix used for conditional captioning when the request has none.
pub const DEFAULT_CAPTION_PROMPT: &str = "This is a photo of";

/// Captions images and records each result as an agent turn.
pub struct CaptionSession {
    captioner: Arc<dyn ImageCaptioner>,
    transcript: ScopedTranscript,
    default_prompt: String,
}

impl CaptionSession {
    pub fn new(captioner: Arc<dyn ImageCaptioner>, sink: Arc<dyn HistorySink>) -> Self {
        Self {
            captioner,
            transcript: ScopedTranscript::new(CAPTION_COMPONENT, sink),
            default_prompt: DEFAULT_CAPTION_PROMPT.to_string(),
        }
    }

    pub fn with_default_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.default_prompt = prompt.into();
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        self.transcript.history()
    }

    /// Conditional captioning, prefixed by the envelope prompt or the default.
    pub async fn caption(&mut self, envelope: ImageEnvelope) -> Result<String, MyaiError> {
        let prompt = envelope
            .prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.default_prompt.clone());
        self.run("caption_img", &envelope.image, Some(&prompt)).await
    }

    /// Unconditional captioning.
    pub async fn analyze(&mut self, image: &[u8]) -> Result<String, MyaiError> {
        self.run("analyze_img", image, None).await
    }

    async fn run(
        &mut self,
        operation: &str,
        image: &[u8],
        prompt: Option<&str>,
    ) -> Result<String, MyaiError> {
        if image.is_empty() {
            return Err(MyaiError::InvalidRequest("image body is empty".to_string()));
        }
        let caption = self.captioner.caption(image, prompt).await?;
        info!(component = CAPTION_COMPONENT, operation, chars = caption.len(), "image captioned");
        self.transcript
            .history_mut()
            .record(Role::Agent, format!("[{operation}] :: {caption}"));
        Ok(caption)
    }

    /// Flushes the caption transcript.
    pub fn close(mut self) -> Result<Option<PathBuf>, MyaiError> {
        self.transcript.flush()
    }
}
