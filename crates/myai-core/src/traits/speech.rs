// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech collaborators: transcription, synthesis, and audio container coding.

use async_trait::async_trait;

use crate::error::MyaiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SynthesizedAudio, Transcription, Waveform};

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: PluginAdapter {
    /// Transcribes a mono waveform sampled at `sample_rate`.
    async fn transcribe(&self, mono: &[f32], sample_rate: u32)
    -> Result<Transcription, MyaiError>;
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: PluginAdapter {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, MyaiError>;
}

/// Audio container decoding and WAV encoding.
///
/// Both operations are CPU-bound and synchronous.
pub trait AudioCodec: Send + Sync {
    /// Decodes an arbitrary container into uncompressed samples.
    fn decode(&self, bytes: &[u8]) -> Result<Waveform, MyaiError>;

    /// Encodes mono 16-bit PCM into a WAV container.
    fn encode_wav(&self, pcm: &[i16], sample_rate: u32) -> Result<Vec<u8>, MyaiError>;
}
