// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the MyAI multimodal assistant.
//!
//! This crate provides the conversation data model, the error type, and the
//! narrow collaborator traits the agent consumes (text generation,
//! transcription, speech synthesis, audio coding, captioning, training,
//! history storage). Model inference itself lives behind these traits.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MyaiError;
pub use types::{
    AdapterType, AudioEnvelope, HealthStatus, ImageEnvelope, InteractionRecord, ModelSource,
    PromptReply, RequestMode, Role, SynthesizedAudio, TextEnvelope, TrainingRun, Transcription,
    Waveform,
};

pub use traits::{
    AudioCodec, ChatTemplate, HistorySink, ImageCaptioner, LanguageModel, ModelLoader,
    PluginAdapter, SpeechSynthesizer, Tokenizer, TrainingLauncher, Transcriber,
};
