// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HuggingFace `tokenizers` adapter.
//!
//! Loads `tokenizer.json` plus the optional `tokenizer_config.json` next to it
//! for the special tokens, maximum input length, and chat template.

use std::path::Path;

use myai_core::{ChatTemplate, MyaiError, Tokenizer};
use serde_json::Value;
use tracing::debug;

use crate::template::JinjaChatTemplate;

/// Lengths at or above this are the "unbounded" sentinel HF writes into
/// `tokenizer_config.json`.
const UNBOUNDED_MAX_LENGTH: f64 = 1e20;

/// Fields read from `tokenizer_config.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenizerSettings {
    pub bos_token: Option<String>,
    pub eos_token: Option<String>,
    pub pad_token: Option<String>,
    pub model_max_length: Option<usize>,
    pub chat_template: Option<String>,
}

impl TokenizerSettings {
    /// Parses a `tokenizer_config.json` document. Unknown keys are ignored.
    pub fn from_json(content: &str) -> Result<Self, MyaiError> {
        let value: Value = serde_json::from_str(content).map_err(|e| MyaiError::Provider {
            message: format!("invalid tokenizer_config.json: {e}"),
            source: Some(Box::new(e)),
        })?;

        let model_max_length = value
            .get("model_max_length")
            .and_then(Value::as_f64)
            .filter(|n| *n > 0.0 && *n < UNBOUNDED_MAX_LENGTH)
            .map(|n| n as usize);

        Ok(Self {
            bos_token: special_token(&value, "bos_token"),
            eos_token: special_token(&value, "eos_token"),
            pad_token: special_token(&value, "pad_token"),
            model_max_length,
            chat_template: value
                .get("chat_template")
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }
}

/// Special tokens are either a plain string or an `AddedToken` object.
fn special_token(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("content").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

/// Tokenizer backed by a HuggingFace `tokenizer.json`.
pub struct HubTokenizer {
    inner: tokenizers::Tokenizer,
    settings: TokenizerSettings,
    template: Option<JinjaChatTemplate>,
}

impl HubTokenizer {
    pub fn new(inner: tokenizers::Tokenizer, settings: TokenizerSettings) -> Self {
        let template = settings.chat_template.as_ref().map(|source| {
            JinjaChatTemplate::new(
                source.clone(),
                settings.bos_token.clone(),
                settings.eos_token.clone(),
            )
        });
        Self {
            inner,
            settings,
            template,
        }
    }

    /// Loads `<dir>/tokenizer.json` and, when present, `<dir>/tokenizer_config.json`.
    pub fn from_dir(dir: &Path) -> Result<Self, MyaiError> {
        let tokenizer_path = dir.join("tokenizer.json");
        let inner = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MyaiError::provider(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let config_path = dir.join("tokenizer_config.json");
        let settings = match std::fs::read_to_string(&config_path) {
            Ok(content) => TokenizerSettings::from_json(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %config_path.display(), "no tokenizer config, using defaults");
                TokenizerSettings::default()
            }
            Err(e) => {
                return Err(MyaiError::Provider {
                    message: format!("failed to read {}: {e}", config_path.display()),
                    source: Some(Box::new(e)),
                });
            }
        };

        Ok(Self::new(inner, settings))
    }

    pub fn settings(&self) -> &TokenizerSettings {
        &self.settings
    }
}

impl Tokenizer for HubTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, MyaiError> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| MyaiError::provider(format!("tokenization failed: {e}")))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, MyaiError> {
        self.inner
            .decode(ids, skip_special_tokens)
            .map_err(|e| MyaiError::provider(format!("detokenization failed: {e}")))
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn eos_token(&self) -> Option<&str> {
        self.settings.eos_token.as_deref()
    }

    fn pad_token(&self) -> Option<&str> {
        self.settings.pad_token.as_deref()
    }

    fn set_pad_token(&mut self, token: String) {
        self.settings.pad_token = Some(token);
    }

    fn model_max_length(&self) -> Option<usize> {
        self.settings.model_max_length
    }

    fn set_model_max_length(&mut self, len: usize) {
        self.settings.model_max_length = Some(len);
    }

    fn chat_template(&self) -> Option<&dyn ChatTemplate> {
        self.template.as_ref().map(|t| t as &dyn ChatTemplate)
    }
}
