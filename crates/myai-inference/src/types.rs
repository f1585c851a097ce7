// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response types for the inference server's JSON API.

use serde::{Deserialize, Serialize};

/// Request body for `POST /v1/models/load`.
#[derive(Debug, Clone, Serialize)]
pub struct LoadModelRequest {
    pub model: String,
    pub device_map: String,
}

/// Metadata of a model loaded on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub embedding_rows: usize,
    #[serde(default)]
    pub eos_token_id: Option<u32>,
    #[serde(default)]
    pub max_position_embeddings: Option<usize>,
}

/// Request body for `POST /v1/models/resize`.
#[derive(Debug, Clone, Serialize)]
pub struct ResizeRequest {
    pub model: String,
    pub rows: usize,
}

/// Request body for `POST /v1/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub input_ids: Vec<u32>,
    pub max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad_token_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Generated token ids; the prompt ids come first.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub output_ids: Vec<u32>,
}

/// Request body for `POST /v1/transcribe`.
#[derive(Debug, Clone, Serialize)]
pub struct TranscribeRequest<'a> {
    pub samples: &'a [f32],
    pub sample_rate: u32,
}

/// Response of `POST /v1/transcribe`.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Request body for `POST /v1/synthesize`.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizeRequest<'a> {
    pub text: &'a str,
}

/// Float samples produced by the speech synthesis pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesizeResponse {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Request body for `POST /v1/caption`.
#[derive(Debug, Clone, Serialize)]
pub struct CaptionRequest<'a> {
    /// Base64-encoded image bytes.
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<&'a str>,
}

/// Response of `POST /v1/caption`.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
}

/// Error body returned by the inference server.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_omits_unset_options() {
        let req = GenerateRequest {
            model: "gpt2".into(),
            input_ids: vec![1, 2],
            max_new_tokens: 128,
            pad_token_id: None,
            seed: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("seed").is_none());
        assert!(json.get("pad_token_id").is_none());
        assert_eq!(json["max_new_tokens"], 128);
    }

    #[test]
    fn model_info_tolerates_missing_optional_fields() {
        let info: ModelInfo =
            serde_json::from_str(r#"{"model": "gpt2", "embedding_rows": 50257}"#).unwrap();
        assert_eq!(info.eos_token_id, None);
        assert_eq!(info.max_position_embeddings, None);
    }

    #[test]
    fn api_error_parses_type_field() {
        let err: ApiErrorResponse =
            serde_json::from_str(r#"{"error": {"type": "model_not_found", "message": "nope"}}"#)
                .unwrap();
        assert_eq!(err.error.type_, "model_not_found");
    }
}
