// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text generation collaborators: tokenizer, language model, and the loader
//! that produces them.
//!
//! A tokenizer and a language model together form a model handle. The agent
//! owns its handle exclusively; nothing here is shared between sessions.

use async_trait::async_trait;

use crate::error::MyaiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InteractionRecord, ModelSource};

/// Structured multi-turn prompt formatting offered by some tokenizers.
pub trait ChatTemplate: Send + Sync {
    /// Renders the conversation into a single prompt string.
    ///
    /// With `add_generation_prompt` the rendered text ends where the agent's
    /// next turn should begin.
    fn render(
        &self,
        history: &[InteractionRecord],
        add_generation_prompt: bool,
    ) -> Result<String, MyaiError>;
}

/// Text <-> token id conversion.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>, MyaiError>;

    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, MyaiError>;

    /// Vocabulary size including added tokens.
    fn vocab_size(&self) -> usize;

    fn eos_token(&self) -> Option<&str>;

    fn pad_token(&self) -> Option<&str>;

    fn set_pad_token(&mut self, token: String);

    /// Maximum number of input tokens, if bounded.
    fn model_max_length(&self) -> Option<usize>;

    fn set_model_max_length(&mut self, len: usize);

    /// Chat-template capability. `None` means prompts are built by flat
    /// concatenation of prior turns.
    fn chat_template(&self) -> Option<&dyn ChatTemplate> {
        None
    }
}

/// A loaded causal language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier or path the model was loaded from.
    fn reference(&self) -> &str;

    /// Rows in the input-embedding table.
    fn embedding_rows(&self) -> usize;

    /// Resizes the input-embedding table to `rows`.
    async fn resize_token_embeddings(&mut self, rows: usize) -> Result<(), MyaiError>;

    fn eos_token_id(&self) -> Option<u32>;

    fn pad_token_id(&self) -> Option<u32>;

    /// Sets the pad token id used by the generation configuration.
    fn set_pad_token_id(&mut self, id: Option<u32>);

    /// Maximum positional context (`max_position_embeddings`), if known.
    fn max_context(&self) -> Option<usize>;

    /// Seeds sampling for subsequent generation calls.
    fn set_seed(&mut self, seed: u64);

    /// Whether [`generate`](LanguageModel::generate) returns the prompt ids
    /// followed by the continuation.
    fn echoes_prompt(&self) -> bool {
        true
    }

    /// Generates at most `max_new_tokens` tokens continuing `input_ids`.
    async fn generate(&self, input_ids: &[u32], max_new_tokens: u32)
    -> Result<Vec<u32>, MyaiError>;
}

/// Loads tokenizers and models from identifiers or checkpoint directories.
#[async_trait]
pub trait ModelLoader: PluginAdapter {
    async fn load_tokenizer(&self, id: &str) -> Result<Box<dyn Tokenizer>, MyaiError>;

    async fn load_model(&self, source: &ModelSource) -> Result<Box<dyn LanguageModel>, MyaiError>;
}
