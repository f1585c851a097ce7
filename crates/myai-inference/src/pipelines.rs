// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech-to-text, text-to-speech, and image captioning pipelines hosted by
//! the inference server.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use myai_core::traits::adapter::PluginAdapter;
use myai_core::types::{AdapterType, HealthStatus, SynthesizedAudio, Transcription};
use myai_core::{ImageCaptioner, MyaiError, SpeechSynthesizer, Transcriber};
use tracing::debug;

use crate::client::InferenceClient;
use crate::types::{
    CaptionRequest, CaptionResponse, SynthesizeRequest, SynthesizeResponse, TranscribeRequest,
    TranscribeResponse,
};

macro_rules! remote_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, MyaiError> {
                match self.client.health().await {
                    Ok(()) => Ok(HealthStatus::Healthy),
                    Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
                }
            }

            async fn shutdown(&self) -> Result<(), MyaiError> {
                Ok(())
            }
        }
    };
}

/// Automatic speech recognition over `POST /v1/transcribe`.
#[derive(Debug, Clone)]
pub struct RemoteTranscriber {
    client: InferenceClient,
}

impl RemoteTranscriber {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

remote_adapter!(RemoteTranscriber, "remote-transcriber", AdapterType::Transcription);

#[async_trait]
impl Transcriber for RemoteTranscriber {
    async fn transcribe(&self, mono: &[f32], sample_rate: u32) -> Result<Transcription, MyaiError> {
        let request = TranscribeRequest {
            samples: mono,
            sample_rate,
        };
        let response: TranscribeResponse = self
            .client
            .post_json("/v1/transcribe", &request)
            .await
            .map_err(|e| MyaiError::Transcription(e.to_string()))?;
        debug!(samples = mono.len(), sample_rate, "transcription received");
        Ok(Transcription {
            text: response.text.trim().to_string(),
        })
    }
}

/// Text-to-speech over `POST /v1/synthesize`.
#[derive(Debug, Clone)]
pub struct RemoteSynthesizer {
    client: InferenceClient,
}

impl RemoteSynthesizer {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

remote_adapter!(RemoteSynthesizer, "remote-synthesizer", AdapterType::Synthesis);

#[async_trait]
impl SpeechSynthesizer for RemoteSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, MyaiError> {
        let response: SynthesizeResponse = self
            .client
            .post_json("/v1/synthesize", &SynthesizeRequest { text })
            .await
            .map_err(|e| MyaiError::Synthesis(e.to_string()))?;
        if response.sample_rate == 0 {
            return Err(MyaiError::Synthesis(
                "synthesizer returned a zero sample rate".to_string(),
            ));
        }
        Ok(SynthesizedAudio {
            samples: response.samples,
            sample_rate: response.sample_rate,
        })
    }
}

/// Image captioning over `POST /v1/caption`.
#[derive(Debug, Clone)]
pub struct RemoteCaptioner {
    client: InferenceClient,
}

impl RemoteCaptioner {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

remote_adapter!(RemoteCaptioner, "remote-captioner", AdapterType::Captioning);

#[async_trait]
impl ImageCaptioner for RemoteCaptioner {
    async fn caption(&self, image: &[u8], prompt: Option<&str>) -> Result<String, MyaiError> {
        let request = CaptionRequest {
            image: STANDARD.encode(image),
            prompt,
        };
        let response: CaptionResponse = self
            .client
            .post_json("/v1/caption", &request)
            .await
            .map_err(|e| MyaiError::Captioning(e.to_string()))?;
        Ok(response.caption.trim().to_string())
    }
}
