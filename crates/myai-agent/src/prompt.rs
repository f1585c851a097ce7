// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multimodal prompt handling.
//!
//! Each request moves through `received -> transcribed -> replied -> narrated
//! -> returned`, skipping the stages its envelope does not ask for. The
//! request mode is checked before any collaborator runs.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use myai_core::{AudioEnvelope, MyaiError, PromptReply, RequestMode, TextEnvelope};
use tracing::{debug, info, warn};

use crate::audio::{normalize_to_pcm16, resample};
use crate::session::AgentSession;

/// Per-request progress, used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStage {
    Received,
    Transcribed,
    Replied,
    Narrated,
    Returned,
}

impl fmt::Display for PromptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStage::Received => write!(f, "received"),
            PromptStage::Transcribed => write!(f, "transcribed"),
            PromptStage::Replied => write!(f, "replied"),
            PromptStage::Narrated => write!(f, "narrated"),
            PromptStage::Returned => write!(f, "returned"),
        }
    }
}

impl AgentSession {
    /// Transcribes an audio prompt and, in question mode, answers it.
    pub async fn handle_audio_prompt(
        &mut self,
        envelope: AudioEnvelope,
    ) -> Result<PromptReply, MyaiError> {
        let mode = RequestMode::parse(envelope.mode.as_deref())?;
        if envelope.audio.is_empty() {
            return Err(MyaiError::InvalidRequest("audio body is empty".to_string()));
        }
        if self.settings.debug {
            debug!(
                session = %self.session_id(),
                bytes = envelope.audio.len(),
                %mode,
                narrate = envelope.narrate_response,
                "audio envelope"
            );
        }
        self.log_stage(PromptStage::Received, mode);

        let transcription = self.transcribe(envelope.audio).await?;
        self.log_stage(PromptStage::Transcribed, mode);

        self.answer(mode, transcription.clone(), envelope.narrate_response, Some(transcription))
            .await
    }

    /// Answers (or, in transcribe mode, echoes) a text prompt.
    pub async fn handle_text_prompt(
        &mut self,
        envelope: TextEnvelope,
    ) -> Result<PromptReply, MyaiError> {
        let mode = RequestMode::parse(envelope.mode.as_deref())?;
        let message = envelope.user_message.ok_or_else(|| {
            MyaiError::InvalidRequest("userMessage must be provided".to_string())
        })?;
        if self.settings.debug {
            debug!(
                session = %self.session_id(),
                chars = message.len(),
                %mode,
                narrate = envelope.narrate_response,
                "text envelope"
            );
        }
        self.log_stage(PromptStage::Received, mode);

        let transcription = match mode {
            RequestMode::Transcribe => Some(message.clone()),
            RequestMode::Question => None,
        };
        self.answer(mode, message, envelope.narrate_response, transcription)
            .await
    }

    /// Synthesizes `text` and returns it as base64 WAV bytes.
    pub async fn narrate(&self, text: &str) -> Result<String, MyaiError> {
        let wav = self.narrate_wav(text).await?;
        Ok(STANDARD.encode(wav))
    }

    /// Synthesizes `text` into WAV container bytes.
    pub async fn narrate_wav(&self, text: &str) -> Result<Vec<u8>, MyaiError> {
        let speech = self.collaborators.synthesizer.synthesize(text).await?;
        let pcm = normalize_to_pcm16(&speech.samples);
        self.collaborators.codec.encode_wav(&pcm, speech.sample_rate)
    }

    async fn answer(
        &mut self,
        mode: RequestMode,
        utterance: String,
        narrate: bool,
        transcription: Option<String>,
    ) -> Result<PromptReply, MyaiError> {
        let reply = match mode {
            RequestMode::Question => {
                let reply = self.generate_reply(&utterance).await?;
                self.log_stage(PromptStage::Replied, mode);
                Some(reply)
            }
            RequestMode::Transcribe => None,
        };

        let audio = match (&reply, narrate) {
            (Some(text), true) => {
                let audio = self.narrate(text).await?;
                self.log_stage(PromptStage::Narrated, mode);
                Some(audio)
            }
            (None, true) => {
                debug!(session = %self.session_id(), "no reply to narrate");
                None
            }
            _ => None,
        };

        self.log_stage(PromptStage::Returned, mode);
        Ok(PromptReply {
            reply,
            audio,
            transcription,
        })
    }

    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, MyaiError> {
        let codec = self.collaborators.codec.clone();
        let target_rate = self.settings.sample_rate;

        let mono = tokio::task::spawn_blocking(move || {
            let waveform = codec.decode(&audio)?.to_mono();
            resample(&waveform.samples, waveform.sample_rate, target_rate)
        })
        .await
        .map_err(|e| MyaiError::Internal(format!("audio decode task failed: {e}")))??;

        if mono.is_empty() {
            warn!(session = %self.session_id(), "decoded audio contains no samples");
        }

        let transcription = self
            .collaborators
            .transcriber
            .transcribe(&mono, target_rate)
            .await?;
        info!(
            session = %self.session_id(),
            chars = transcription.text.len(),
            "audio transcribed"
        );
        Ok(transcription.text)
    }

    fn log_stage(&self, stage: PromptStage, mode: RequestMode) {
        debug!(session = %self.session_id(), %mode, %stage, "prompt stage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_display_lowercase() {
        assert_eq!(PromptStage::Received.to_string(), "received");
        assert_eq!(PromptStage::Narrated.to_string(), "narrated");
        assert_eq!(PromptStage::Returned.to_string(), "returned");
    }
}
