// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Service-style collaborators extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod captioning;
pub mod generation;
pub mod history;
pub mod speech;
pub mod training;

pub use adapter::PluginAdapter;
pub use captioning::ImageCaptioner;
pub use generation::{ChatTemplate, LanguageModel, ModelLoader, Tokenizer};
pub use history::HistorySink;
pub use speech::{AudioCodec, SpeechSynthesizer, Transcriber};
pub use training::TrainingLauncher;
