// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete collaborators for the MyAI assistant.
//!
//! - [`HubModelLoader`]: local HuggingFace tokenizers plus generation models
//!   hosted by the inference server
//! - [`RemoteTranscriber`], [`RemoteSynthesizer`], [`RemoteCaptioner`]:
//!   speech and vision pipelines on the same server
//! - [`SymphoniaCodec`]: container decoding and WAV encoding
//! - [`CommandTrainingLauncher`]: the external fine-tuning job

pub mod client;
pub mod codec;
pub mod model;
pub mod pipelines;
pub mod template;
pub mod tokenizer;
pub mod training;
pub mod types;

use std::sync::Arc;

use myai_config::MyaiConfig;
use myai_core::{
    ImageCaptioner, ModelLoader, MyaiError, PluginAdapter, SpeechSynthesizer, TrainingLauncher,
    Transcriber,
};

pub use client::InferenceClient;
pub use codec::SymphoniaCodec;
pub use model::{HubModelLoader, RemoteLanguageModel};
pub use pipelines::{RemoteCaptioner, RemoteSynthesizer, RemoteTranscriber};
pub use template::JinjaChatTemplate;
pub use tokenizer::HubTokenizer;
pub use training::CommandTrainingLauncher;

/// Collaborators built from configuration.
pub struct InferenceStack {
    pub loader: Arc<dyn ModelLoader>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub captioner: Arc<dyn ImageCaptioner>,
    /// `None` when `training.command` is empty.
    pub trainer: Option<Arc<dyn TrainingLauncher>>,
    /// The same collaborators viewed as adapters, for health checks and shutdown.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

impl InferenceStack {
    pub fn from_config(config: &MyaiConfig) -> Result<Self, MyaiError> {
        let client = InferenceClient::new(config.model.inference_url.clone())?;

        let loader = Arc::new(HubModelLoader::new(
            client.clone(),
            config.model.models_dir.clone(),
            config.model.device_map.as_str(),
        ));
        let transcriber = Arc::new(RemoteTranscriber::new(client.clone()));
        let synthesizer = Arc::new(RemoteSynthesizer::new(client.clone()));
        let captioner = Arc::new(RemoteCaptioner::new(client));

        let mut adapters: Vec<Arc<dyn PluginAdapter>> = vec![
            loader.clone(),
            transcriber.clone(),
            synthesizer.clone(),
            captioner.clone(),
        ];

        let trainer: Option<Arc<dyn TrainingLauncher>> = if config.training.is_enabled() {
            let output_root = config
                .training
                .output_dir
                .clone()
                .or_else(|| config.model.results_dir())
                .ok_or_else(|| {
                    MyaiError::Config("training output directory is not configured".to_string())
                })?;
            let launcher = Arc::new(CommandTrainingLauncher::new(
                config.training.command.clone(),
                output_root,
                config.model.default_model.clone(),
            )?);
            adapters.push(launcher.clone());
            Some(launcher)
        } else {
            None
        };

        Ok(Self {
            loader,
            transcriber,
            synthesizer,
            captioner,
            trainer,
            adapters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myai_core::PluginAdapter;

    #[test]
    fn stack_without_training_command_has_no_trainer() {
        let config = MyaiConfig::default();
        let stack = InferenceStack::from_config(&config).unwrap();
        assert!(stack.trainer.is_none());
        assert_eq!(stack.loader.name(), "hub-model-loader");
        assert_eq!(stack.adapters.len(), 4);
    }

    #[test]
    fn stack_training_defaults_to_results_dir() {
        let mut config = MyaiConfig::default();
        config.training.command = vec!["python".into(), "train.py".into()];
        config.model.pretrained_model_dir = Some("/srv/models".into());
        let stack = InferenceStack::from_config(&config).unwrap();
        assert!(stack.trainer.is_some());
        assert_eq!(stack.adapters.len(), 5);
    }
}
