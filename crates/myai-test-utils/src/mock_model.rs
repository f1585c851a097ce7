// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model loader, tokenizer, and language model for deterministic testing.
//!
//! The tokenizer is byte-level: every byte maps to `byte + BYTE_OFFSET`, and
//! ids below the offset are special tokens. The language model echoes the
//! prompt followed by the next queued response and an end-of-sequence token,
//! the way causal generation pipelines return their output.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use myai_core::traits::adapter::PluginAdapter;
use myai_core::types::{AdapterType, HealthStatus, InteractionRecord, ModelSource};
use myai_core::{ChatTemplate, LanguageModel, ModelLoader, MyaiError, Tokenizer};

/// Id of the end-of-sequence token.
pub const EOS_ID: u32 = 0;
/// Text of the end-of-sequence token.
pub const EOS_TOKEN: &str = "<|endoftext|>";
/// First id used for byte tokens.
pub const BYTE_OFFSET: u32 = 2;
/// Vocabulary size of the byte-level tokenizer.
pub const MOCK_VOCAB_SIZE: usize = 256 + BYTE_OFFSET as usize;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Encodes text with the byte-level scheme used by [`MockTokenizer`].
pub fn encode_bytes(text: &str) -> Vec<u32> {
    text.bytes().map(|b| u32::from(b) + BYTE_OFFSET).collect()
}

/// Renders turns as `role: content` lines, ending with `agent:` when a
/// generation prompt is requested.
#[derive(Debug, Clone, Default)]
pub struct MockChatTemplate;

impl ChatTemplate for MockChatTemplate {
    fn render(
        &self,
        history: &[InteractionRecord],
        add_generation_prompt: bool,
    ) -> Result<String, MyaiError> {
        let mut out: String = history
            .iter()
            .map(|r| format!("{}: {}\n", r.role, r.content))
            .collect();
        if add_generation_prompt {
            out.push_str("agent:");
        }
        Ok(out)
    }
}

/// Byte-level tokenizer with settable padding and input length.
#[derive(Debug, Clone)]
pub struct MockTokenizer {
    pad_token: Option<String>,
    model_max_length: Option<usize>,
    template: Option<MockChatTemplate>,
}

impl MockTokenizer {
    pub fn new() -> Self {
        Self {
            pad_token: None,
            model_max_length: None,
            template: None,
        }
    }

    /// Enables the chat-template capability.
    pub fn with_chat_template(mut self) -> Self {
        self.template = Some(MockChatTemplate);
        self
    }
}

impl Default for MockTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for MockTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, MyaiError> {
        Ok(encode_bytes(text))
    }

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, MyaiError> {
        let mut bytes = Vec::with_capacity(ids.len());
        for &id in ids {
            if id < BYTE_OFFSET {
                if !skip_special_tokens {
                    bytes.extend_from_slice(EOS_TOKEN.as_bytes());
                }
                continue;
            }
            let byte = u8::try_from(id - BYTE_OFFSET)
                .map_err(|_| MyaiError::provider(format!("token id {id} out of range")))?;
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn vocab_size(&self) -> usize {
        MOCK_VOCAB_SIZE
    }

    fn eos_token(&self) -> Option<&str> {
        Some(EOS_TOKEN)
    }

    fn pad_token(&self) -> Option<&str> {
        self.pad_token.as_deref()
    }

    fn set_pad_token(&mut self, token: String) {
        self.pad_token = Some(token);
    }

    fn model_max_length(&self) -> Option<usize> {
        self.model_max_length
    }

    fn set_model_max_length(&mut self, len: usize) {
        self.model_max_length = Some(len);
    }

    fn chat_template(&self) -> Option<&dyn ChatTemplate> {
        self.template.as_ref().map(|t| t as &dyn ChatTemplate)
    }
}

/// State shared between a [`MockModelLoader`] and the models it creates,
/// so tests can inspect calls after the model moved into a session.
#[derive(Debug, Default)]
pub struct MockModelState {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    loaded: Mutex<Vec<ModelSource>>,
    seed: Mutex<Option<u64>>,
    resized_to: Mutex<Option<usize>>,
    pad_token_id: Mutex<Option<u32>>,
    delay: Mutex<Option<Duration>>,
}

impl MockModelState {
    /// Queues a successful response.
    pub fn push_response(&self, text: impl Into<String>) {
        lock(&self.responses).push_back(Ok(text.into()));
    }

    /// Queues a generation failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.responses).push_back(Err(message.into()));
    }

    /// Delays every generation call, for timeout tests.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Prompts seen by `generate`, decoded from their token ids.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Sources passed to `load_model`, in call order.
    pub fn loaded(&self) -> Vec<ModelSource> {
        lock(&self.loaded).clone()
    }

    pub fn seed(&self) -> Option<u64> {
        *lock(&self.seed)
    }

    pub fn resized_to(&self) -> Option<usize> {
        *lock(&self.resized_to)
    }

    pub fn pad_token_id(&self) -> Option<u32> {
        *lock(&self.pad_token_id)
    }

    fn next_response(&self) -> Result<String, String> {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok("mock reply".to_string()))
    }
}

/// A language model replaying queued responses.
pub struct MockLanguageModel {
    reference: String,
    state: Arc<MockModelState>,
    embedding_rows: usize,
    max_context: Option<usize>,
    pad_token_id: Option<u32>,
    echo_prompt: bool,
}

impl MockLanguageModel {
    pub fn new(reference: impl Into<String>, state: Arc<MockModelState>) -> Self {
        Self {
            reference: reference.into(),
            state,
            embedding_rows: MOCK_VOCAB_SIZE,
            max_context: None,
            pad_token_id: None,
            echo_prompt: true,
        }
    }

    pub fn with_embedding_rows(mut self, rows: usize) -> Self {
        self.embedding_rows = rows;
        self
    }

    pub fn with_max_context(mut self, max_context: Option<usize>) -> Self {
        self.max_context = max_context;
        self
    }

    /// Makes `generate` return only the continuation, without the prompt ids.
    pub fn without_prompt_echo(mut self) -> Self {
        self.echo_prompt = false;
        self
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn embedding_rows(&self) -> usize {
        self.embedding_rows
    }

    async fn resize_token_embeddings(&mut self, rows: usize) -> Result<(), MyaiError> {
        self.embedding_rows = rows;
        *lock(&self.state.resized_to) = Some(rows);
        Ok(())
    }

    fn eos_token_id(&self) -> Option<u32> {
        Some(EOS_ID)
    }

    fn pad_token_id(&self) -> Option<u32> {
        self.pad_token_id
    }

    fn set_pad_token_id(&mut self, id: Option<u32>) {
        self.pad_token_id = id;
        *lock(&self.state.pad_token_id) = id;
    }

    fn max_context(&self) -> Option<usize> {
        self.max_context
    }

    fn set_seed(&mut self, seed: u64) {
        *lock(&self.state.seed) = Some(seed);
    }

    fn echoes_prompt(&self) -> bool {
        self.echo_prompt
    }

    async fn generate(
        &self,
        input_ids: &[u32],
        max_new_tokens: u32,
    ) -> Result<Vec<u32>, MyaiError> {
        if self.embedding_rows != MOCK_VOCAB_SIZE {
            return Err(MyaiError::provider(format!(
                "embedding table has {} rows, tokenizer has {MOCK_VOCAB_SIZE}",
                self.embedding_rows
            )));
        }

        let prompt = MockTokenizer::new().decode(input_ids, false)?;
        lock(&self.state.prompts).push(prompt);

        let delay = *lock(&self.state.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let text = self.state.next_response().map_err(MyaiError::provider)?;
        let mut output = if self.echo_prompt {
            input_ids.to_vec()
        } else {
            Vec::new()
        };
        output.extend(encode_bytes(&text).into_iter().take(max_new_tokens as usize));
        output.push(EOS_ID);
        Ok(output)
    }
}

/// Loads [`MockTokenizer`]s and [`MockLanguageModel`]s.
pub struct MockModelLoader {
    state: Arc<MockModelState>,
    chat_template: bool,
    embedding_rows: usize,
    max_context: Option<usize>,
    fail_checkpoints: bool,
    fail_default: bool,
    echo_prompt: bool,
}

impl MockModelLoader {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockModelState::default()),
            chat_template: false,
            embedding_rows: MOCK_VOCAB_SIZE,
            max_context: None,
            fail_checkpoints: false,
            fail_default: false,
            echo_prompt: true,
        }
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        let loader = Self::new();
        for response in responses {
            loader.state.push_response(response);
        }
        loader
    }

    pub fn with_chat_template(mut self) -> Self {
        self.chat_template = true;
        self
    }

    /// Embedding rows of loaded models; a mismatch with the vocabulary
    /// requires a resize before generation.
    pub fn with_embedding_rows(mut self, rows: usize) -> Self {
        self.embedding_rows = rows;
        self
    }

    pub fn with_max_context(mut self, max_context: usize) -> Self {
        self.max_context = Some(max_context);
        self
    }

    /// Makes every checkpoint load fail.
    pub fn failing_checkpoints(mut self) -> Self {
        self.fail_checkpoints = true;
        self
    }

    /// Makes the default model load fail.
    pub fn failing_default(mut self) -> Self {
        self.fail_default = true;
        self
    }

    /// Loaded models return only the continuation from `generate`.
    pub fn without_prompt_echo(mut self) -> Self {
        self.echo_prompt = false;
        self
    }

    pub fn state(&self) -> Arc<MockModelState> {
        self.state.clone()
    }
}

impl Default for MockModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockModelLoader {
    fn name(&self) -> &str {
        "mock-model-loader"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ModelLoader
    }

    async fn health_check(&self) -> Result<HealthStatus, MyaiError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MyaiError> {
        Ok(())
    }
}

#[async_trait]
impl ModelLoader for MockModelLoader {
    async fn load_tokenizer(&self, _id: &str) -> Result<Box<dyn Tokenizer>, MyaiError> {
        let tokenizer = if self.chat_template {
            MockTokenizer::new().with_chat_template()
        } else {
            MockTokenizer::new()
        };
        Ok(Box::new(tokenizer))
    }

    async fn load_model(&self, source: &ModelSource) -> Result<Box<dyn LanguageModel>, MyaiError> {
        lock(&self.state.loaded).push(source.clone());
        let fails = match source {
            ModelSource::Checkpoint(_) => self.fail_checkpoints,
            ModelSource::Default(_) => self.fail_default,
        };
        if fails {
            return Err(MyaiError::provider(format!("cannot load {source}")));
        }
        let mut model = MockLanguageModel::new(source.reference(), self.state.clone())
            .with_embedding_rows(self.embedding_rows)
            .with_max_context(self.max_context);
        if !self.echo_prompt {
            model = model.without_prompt_echo();
        }
        Ok(Box::new(model))
    }
}
