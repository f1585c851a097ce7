// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model provider resolution.
//!
//! Picks the most recently trained checkpoint under the results directory,
//! falling back to the configured default model when no checkpoint can be
//! used. Resolution failures are classified and logged, never propagated,
//! unless the default itself cannot be loaded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use myai_core::{LanguageModel, ModelLoader, ModelSource, MyaiError, Tokenizer};
use tracing::{debug, info, warn};

/// Why a trained checkpoint could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no pretrained model directory configured")]
    NotConfigured,

    #[error("results directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("results directory {} contains no checkpoints", .0.display())]
    NoCheckpoints(PathBuf),

    #[error("failed to read results directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load checkpoint {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: MyaiError,
    },
}

/// A loaded tokenizer and generation model pair.
pub struct ModelHandle {
    pub tokenizer: Box<dyn Tokenizer>,
    pub model: Box<dyn LanguageModel>,
    pub source: ModelSource,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("source", &self.source)
            .field("model", &self.model.reference())
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    pub fn new(
        tokenizer: Box<dyn Tokenizer>,
        model: Box<dyn LanguageModel>,
        source: ModelSource,
    ) -> Self {
        Self {
            tokenizer,
            model,
            source,
        }
    }

    /// Whether the tokenizer still lacks a pad token.
    pub fn needs_padding(&self) -> bool {
        self.tokenizer.pad_token().is_none()
    }

    /// Pads with the end-of-sequence token and mirrors it into the model's
    /// generation settings.
    pub fn set_token_padding(&mut self) {
        match self.tokenizer.eos_token().map(str::to_owned) {
            Some(eos) => self.tokenizer.set_pad_token(eos),
            None => warn!(
                model = %self.source,
                "tokenizer has no end-of-sequence token, padding left unset"
            ),
        }
        let eos_id = self.model.eos_token_id();
        self.model.set_pad_token_id(eos_id);
        debug!(model = %self.source, pad_token_id = ?eos_id, "token padding set");
    }

    /// Resizes the model's embedding table to the tokenizer vocabulary when
    /// they differ. Must run before the first generation call.
    pub async fn align_embeddings(&mut self) -> Result<(), MyaiError> {
        let rows = self.model.embedding_rows();
        let vocab = self.tokenizer.vocab_size();
        if rows == vocab {
            return Ok(());
        }
        info!(
            model = %self.source,
            from = rows,
            to = vocab,
            "resizing token embeddings to tokenizer vocabulary"
        );
        self.model.resize_token_embeddings(vocab).await
    }

    /// Caps the tokenizer's input length at the model's maximum context.
    pub fn align_context_limit(&mut self) {
        if let Some(max) = self.model.max_context() {
            if self.tokenizer.model_max_length() != Some(max) {
                debug!(model = %self.source, max_context = max, "aligning tokenizer input length");
                self.tokenizer.set_model_max_length(max);
            }
        }
    }

    /// Largest prompt length, in tokens, that leaves room for `max_new_tokens`.
    pub fn input_limit(&self, max_new_tokens: u32) -> Option<usize> {
        self.tokenizer
            .model_max_length()
            .or_else(|| self.model.max_context())
            .map(|max| max.saturating_sub(max_new_tokens as usize).max(1))
    }
}

/// Resolves which model backs a session.
pub struct ModelResolver {
    loader: Arc<dyn ModelLoader>,
    default_model: String,
    default_tokenizer: String,
    results_dir: Option<PathBuf>,
}

impl ModelResolver {
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        default_model: impl Into<String>,
        default_tokenizer: impl Into<String>,
        results_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            loader,
            default_model: default_model.into(),
            default_tokenizer: default_tokenizer.into(),
            results_dir,
        }
    }

    pub fn from_config(loader: Arc<dyn ModelLoader>, config: &myai_config::model::ModelConfig) -> Self {
        Self::new(
            loader,
            config.default_model.clone(),
            config.default_tokenizer.clone(),
            config.results_dir(),
        )
    }

    /// The source used when no trained checkpoint is usable. Always the same
    /// for a given resolver.
    pub fn fallback_source(&self) -> ModelSource {
        ModelSource::Default(self.default_model.clone())
    }

    /// Lexicographically greatest subdirectory of the results directory.
    pub fn most_recent_checkpoint(&self) -> Result<PathBuf, ResolveError> {
        let dir = self.results_dir.as_deref().ok_or(ResolveError::NotConfigured)?;
        latest_subdirectory(dir)
    }

    /// Loads the most recent checkpoint, or the default model on any failure.
    ///
    /// Only a failure to load the default model (or the tokenizer) is fatal.
    pub async fn resolve(&self) -> Result<ModelHandle, MyaiError> {
        let tokenizer = self.loader.load_tokenizer(&self.default_tokenizer).await?;

        match self.load_checkpoint().await {
            Ok((model, source)) => {
                info!(model = %source, "resolved trained checkpoint");
                return Ok(ModelHandle::new(tokenizer, model, source));
            }
            Err(ResolveError::NotConfigured) => {
                debug!("no pretrained model directory configured, using default model");
            }
            Err(e @ (ResolveError::MissingDirectory(_) | ResolveError::NoCheckpoints(_))) => {
                info!(reason = %e, default = %self.default_model, "no trained checkpoint, using default model");
            }
            Err(e @ ResolveError::Io { .. }) => {
                warn!(error = %e, default = %self.default_model, "checkpoint scan failed, using default model");
            }
            Err(e @ ResolveError::Load { .. }) => {
                warn!(error = %e, default = %self.default_model, "checkpoint load failed, using default model");
            }
        }

        let source = self.fallback_source();
        let model = self.loader.load_model(&source).await.map_err(|e| {
            MyaiError::Provider {
                message: format!("default model `{}` failed to load", self.default_model),
                source: Some(Box::new(e)),
            }
        })?;
        info!(model = %source, "resolved default model");
        Ok(ModelHandle::new(tokenizer, model, source))
    }

    async fn load_checkpoint(&self) -> Result<(Box<dyn LanguageModel>, ModelSource), ResolveError> {
        let path = self.most_recent_checkpoint()?;
        let source = ModelSource::Checkpoint(path.clone());
        let model = self
            .loader
            .load_model(&source)
            .await
            .map_err(|source| ResolveError::Load { path, source })?;
        Ok((model, source))
    }
}

fn latest_subdirectory(dir: &Path) -> Result<PathBuf, ResolveError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ResolveError::MissingDirectory(dir.to_path_buf()));
        }
        Err(source) => {
            return Err(ResolveError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut latest: Option<std::ffi::OsString> = None;
    for entry in entries {
        let entry = entry.map_err(|source| ResolveError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        let name = entry.file_name();
        if latest.as_ref().is_none_or(|current| name > *current) {
            latest = Some(name);
        }
    }

    latest
        .map(|name| dir.join(name))
        .ok_or_else(|| ResolveError::NoCheckpoints(dir.to_path_buf()))
}
