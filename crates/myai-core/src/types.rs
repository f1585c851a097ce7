// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the agent core, the collaborators, and the gateway.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MyaiError;

/// Speaker of a single dialogue turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One turn of dialogue. Immutable once appended to a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub role: Role,
    pub content: String,
}

impl InteractionRecord {
    /// Creates a record stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            role,
            content: content.into(),
        }
    }
}

/// Request classification flag selecting transcription or question answering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// Generate a reply to the (transcribed) user utterance.
    Question,
    /// Return the transcription only.
    Transcribe,
}

impl RequestMode {
    /// Parses the raw `mode` value of a request envelope.
    ///
    /// A missing or unrecognized value is a precondition failure.
    pub fn parse(raw: Option<&str>) -> Result<Self, MyaiError> {
        let raw = raw.ok_or_else(|| {
            MyaiError::InvalidRequest("request mode must be specified".to_string())
        })?;
        raw.parse::<RequestMode>().map_err(|_| {
            MyaiError::InvalidRequest(format!(
                "invalid request mode `{raw}`, expected one of: question, transcribe"
            ))
        })
    }
}

/// Inbound audio prompt: raw container bytes plus request flags.
#[derive(Debug, Clone, Default)]
pub struct AudioEnvelope {
    pub audio: Vec<u8>,
    pub mode: Option<String>,
    pub narrate_response: bool,
}

/// Inbound text prompt.
#[derive(Debug, Clone, Default)]
pub struct TextEnvelope {
    pub user_message: Option<String>,
    pub mode: Option<String>,
    pub narrate_response: bool,
}

/// Inbound image for captioning.
#[derive(Debug, Clone, Default)]
pub struct ImageEnvelope {
    pub image: Vec<u8>,
    /// Conditional captioning prefix; the session default is used when absent.
    pub prompt: Option<String>,
}

/// Combined result of a prompt request.
///
/// All three keys are always serialized; absent parts are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptReply {
    pub reply: Option<String>,
    /// Base64-encoded WAV narration of `reply`.
    pub audio: Option<String>,
    pub transcription: Option<String>,
}

/// Uncompressed PCM audio with interleaved samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Waveform {
    /// Creates a single-channel waveform.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            n => self.samples.len() / usize::from(n),
        }
    }

    /// Down-mixes to a single channel by averaging each frame.
    pub fn to_mono(&self) -> Waveform {
        if self.channels <= 1 {
            return Waveform::mono(self.samples.clone(), self.sample_rate);
        }
        let channels = usize::from(self.channels);
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Waveform::mono(samples, self.sample_rate)
    }
}

/// Output of the speech-synthesis collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Output of the transcription collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
}

/// Where a model handle's weights came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSource {
    /// A pretrained model identifier.
    Default(String),
    /// A locally trained checkpoint directory.
    Checkpoint(PathBuf),
}

impl ModelSource {
    /// String form handed to the model loader.
    pub fn reference(&self) -> String {
        match self {
            ModelSource::Default(id) => id.clone(),
            ModelSource::Checkpoint(path) => path.display().to_string(),
        }
    }

    pub fn is_checkpoint(&self) -> bool {
        matches!(self, ModelSource::Checkpoint(_))
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Default(id) => write!(f, "default:{id}"),
            ModelSource::Checkpoint(path) => write!(f, "checkpoint:{}", path.display()),
        }
    }
}

/// A launched external training job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRun {
    pub run_id: String,
    pub output_dir: PathBuf,
}

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Collaborator is fully operational.
    Healthy,
    /// Collaborator is operational but experiencing issues.
    Degraded(String),
    /// Collaborator is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Identifies the kind of collaborator adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    ModelLoader,
    Transcription,
    Synthesis,
    Captioning,
    Training,
}
