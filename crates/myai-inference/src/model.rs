// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model loading: local tokenizers plus generation models hosted by the
//! inference server.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use myai_core::traits::adapter::PluginAdapter;
use myai_core::types::{AdapterType, HealthStatus, ModelSource};
use myai_core::{LanguageModel, ModelLoader, MyaiError, Tokenizer};
use tracing::{debug, info};

use crate::client::InferenceClient;
use crate::tokenizer::HubTokenizer;
use crate::types::{GenerateRequest, GenerateResponse, LoadModelRequest, ModelInfo, ResizeRequest};

/// A causal language model hosted by the inference server.
#[derive(Debug)]
pub struct RemoteLanguageModel {
    client: InferenceClient,
    info: ModelInfo,
    pad_token_id: Option<u32>,
    seed: Option<u64>,
}

impl RemoteLanguageModel {
    pub fn new(client: InferenceClient, info: ModelInfo) -> Self {
        Self {
            client,
            info,
            pad_token_id: None,
            seed: None,
        }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

#[async_trait]
impl LanguageModel for RemoteLanguageModel {
    fn reference(&self) -> &str {
        &self.info.model
    }

    fn embedding_rows(&self) -> usize {
        self.info.embedding_rows
    }

    async fn resize_token_embeddings(&mut self, rows: usize) -> Result<(), MyaiError> {
        let request = ResizeRequest {
            model: self.info.model.clone(),
            rows,
        };
        let info: ModelInfo = self.client.post_json("/v1/models/resize", &request).await?;
        if info.embedding_rows != rows {
            return Err(MyaiError::provider(format!(
                "resize of {} returned {} rows, expected {rows}",
                self.info.model, info.embedding_rows
            )));
        }
        self.info = info;
        Ok(())
    }

    fn eos_token_id(&self) -> Option<u32> {
        self.info.eos_token_id
    }

    fn pad_token_id(&self) -> Option<u32> {
        self.pad_token_id
    }

    fn set_pad_token_id(&mut self, id: Option<u32>) {
        self.pad_token_id = id;
    }

    fn max_context(&self) -> Option<usize> {
        self.info.max_position_embeddings
    }

    fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }

    async fn generate(
        &self,
        input_ids: &[u32],
        max_new_tokens: u32,
    ) -> Result<Vec<u32>, MyaiError> {
        let request = GenerateRequest {
            model: self.info.model.clone(),
            input_ids: input_ids.to_vec(),
            max_new_tokens,
            pad_token_id: self.pad_token_id,
            seed: self.seed,
        };
        let response: GenerateResponse = self.client.post_json("/v1/generate", &request).await?;
        debug!(
            model = %self.info.model,
            input = input_ids.len(),
            output = response.output_ids.len(),
            "generation complete"
        );
        Ok(response.output_ids)
    }
}

/// Loads tokenizers from `models_dir` and models onto the inference server.
#[derive(Debug, Clone)]
pub struct HubModelLoader {
    client: InferenceClient,
    models_dir: PathBuf,
    device_map: String,
}

impl HubModelLoader {
    pub fn new(client: InferenceClient, models_dir: impl Into<PathBuf>, device_map: &str) -> Self {
        Self {
            client,
            models_dir: models_dir.into(),
            device_map: device_map.to_string(),
        }
    }

    /// Directory holding `tokenizer.json` for `id`: `id` itself when it is a
    /// directory, else `<models_dir>/<id>`.
    pub fn tokenizer_dir(&self, id: &str) -> PathBuf {
        let direct = Path::new(id);
        if direct.is_dir() {
            direct.to_path_buf()
        } else {
            self.models_dir.join(id)
        }
    }
}

#[async_trait]
impl PluginAdapter for HubModelLoader {
    fn name(&self) -> &str {
        "hub-model-loader"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ModelLoader
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

#[async_trait]
impl ModelLoader for HubModelLoader {
    async fn load_tokenizer(&self, id: &str) -> Result<Box<dyn Tokenizer>, MyaiError> {
        let dir = self.tokenizer_dir(id);
        let tokenizer = tokio::task::spawn_blocking(move || HubTokenizer::from_dir(&dir))
            .await
            .map_err(|e| MyaiError::Internal(format!("tokenizer load task failed: {e}")))??;
        info!(tokenizer = id, vocab = tokenizer.vocab_size(), "tokenizer loaded");
        Ok(Box::new(tokenizer))
    }

    async fn load_model(&self, source: &ModelSource) -> Result<Box<dyn LanguageModel>, MyaiError> {
        let request = LoadModelRequest {
            model: source.reference(),
            device_map: self.device_map.clone(),
        };
        let info: ModelInfo = self.client.post_json("/v1/models/load", &request).await?;
        info!(
            model = %source,
            embedding_rows = info.embedding_rows,
            max_context = ?info.max_position_embeddings,
            "model loaded"
        );
        Ok(Box::new(RemoteLanguageModel::new(self.client.clone(), info)))
    }
}
