// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jinja chat templates as shipped in `tokenizer_config.json`.

use minijinja::{Environment, ErrorKind, context};
use myai_core::{ChatTemplate, InteractionRecord, MyaiError, Role};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn chat_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Agent => "assistant",
    }
}

/// Renders conversation turns through a HuggingFace-style Jinja template.
///
/// Templates see `messages` (`role` is `user` or `assistant`),
/// `add_generation_prompt`, `bos_token`, `eos_token`, and `raise_exception`.
#[derive(Debug, Clone)]
pub struct JinjaChatTemplate {
    source: String,
    bos_token: String,
    eos_token: String,
}

impl JinjaChatTemplate {
    pub fn new(source: String, bos_token: Option<String>, eos_token: Option<String>) -> Self {
        Self {
            source,
            bos_token: bos_token.unwrap_or_default(),
            eos_token: eos_token.unwrap_or_default(),
        }
    }
}

impl ChatTemplate for JinjaChatTemplate {
    fn render(
        &self,
        history: &[InteractionRecord],
        add_generation_prompt: bool,
    ) -> Result<String, MyaiError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_function("raise_exception", |message: String| -> Result<String, minijinja::Error> {
            Err(minijinja::Error::new(ErrorKind::InvalidOperation, message))
        });

        let template = env
            .template_from_str(&self.source)
            .map_err(|e| MyaiError::provider(format!("invalid chat template: {e}")))?;

        let messages: Vec<ChatMessage<'_>> = history
            .iter()
            .map(|r| ChatMessage {
                role: chat_role(r.role),
                content: &r.content,
            })
            .collect();

        template
            .render(context! {
                messages => messages,
                add_generation_prompt => add_generation_prompt,
                bos_token => &self.bos_token,
                eos_token => &self.eos_token,
            })
            .map_err(|e| MyaiError::provider(format!("chat template rendering failed: {e}")))
    }
}
