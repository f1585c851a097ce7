// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty model identifiers, token budgets, and distinct routes.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::MyaiConfig;

/// Upper bound accepted for `agent.max_new_tokens`.
pub const MAX_NEW_TOKENS_LIMIT: u32 = 4096;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MyaiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.model.default_model.trim().is_empty() {
        errors.push(validation("model.default_model must not be empty"));
    }

    if config.model.default_tokenizer.trim().is_empty() {
        errors.push(validation("model.default_tokenizer must not be empty"));
    }

    let url = config.model.inference_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(validation(format!(
            "model.inference_url `{url}` must start with http:// or https://"
        )));
    }

    let max_new_tokens = config.agent.max_new_tokens;
    if max_new_tokens == 0 || max_new_tokens > MAX_NEW_TOKENS_LIMIT {
        errors.push(validation(format!(
            "agent.max_new_tokens must be between 1 and {MAX_NEW_TOKENS_LIMIT}, got {max_new_tokens}"
        )));
    }

    if config.agent.context_window == Some(0) {
        errors.push(validation("agent.context_window must be at least 1 when set"));
    }

    if config.agent.generation_timeout_secs == 0 {
        errors.push(validation("agent.generation_timeout_secs must be at least 1"));
    }

    if config.audio.sample_rate == 0 {
        errors.push(validation("audio.sample_rate must be non-zero"));
    }

    if config.history.dir.as_os_str().is_empty() {
        errors.push(validation("history.dir must not be empty"));
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(validation("gateway.host must not be empty"));
    }

    let routes = [
        ("gateway.route_asr", &config.gateway.route_asr),
        ("gateway.route_tts", &config.gateway.route_tts),
        ("gateway.route_caption", &config.gateway.route_caption),
        ("gateway.route_training", &config.gateway.route_training),
    ];
    let mut seen = HashSet::new();
    for (key, route) in routes {
        if !route.starts_with('/') {
            errors.push(validation(format!("{key} `{route}` must start with `/`")));
        }
        if route == "/health" {
            errors.push(validation(format!("{key} must not shadow `/health`")));
        }
        if !seen.insert(route.as_str()) {
            errors.push(validation(format!("{key} `{route}` is used by another route")));
        }
    }

    if config.training.is_enabled()
        && config.training.output_dir.is_none()
        && config.model.pretrained_model_dir.is_none()
    {
        errors.push(validation(
            "training.command is set but neither training.output_dir nor model.pretrained_model_dir is",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
