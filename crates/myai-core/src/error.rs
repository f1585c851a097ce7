// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the MyAI assistant service.

use thiserror::Error;

/// The primary error type used across collaborator traits and the agent core.
#[derive(Debug, Error)]
pub enum MyaiError {
    /// Configuration errors (invalid TOML, unreadable bootstrap resource, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A request precondition failed (missing field, unrecognized mode, empty body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Text generation collaborator errors (model/tokenizer load, generate, decode).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Speech-to-text collaborator errors.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Text-to-speech collaborator errors.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Audio container decode/encode errors.
    #[error("audio error: {0}")]
    Audio(String),

    /// Image captioning collaborator errors.
    #[error("captioning error: {0}")]
    Captioning(String),

    /// External training job errors.
    #[error("training error: {0}")]
    Training(String),

    /// Durable history storage errors (flush, reload).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MyaiError {
    /// Builds a [`MyaiError::Provider`] without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        MyaiError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true when the error was caused by the caller's request
    /// rather than by a collaborator or the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MyaiError::InvalidRequest(_))
    }
}

