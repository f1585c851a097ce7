// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The JSON bootstrap resource read during agent wake-up.
//!
//! ```json
//! { "seed": 67, "startup_prompt": "You are a helpful assistant." }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostic::ConfigError;

/// Session settings applied when the agent wakes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentBootstrap {
    /// Sampling seed for the warm-up generation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Prompt whose continuation becomes the greeting turn.
    #[serde(default)]
    pub startup_prompt: String,
}

impl Default for AgentBootstrap {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            startup_prompt: String::new(),
        }
    }
}

fn default_seed() -> u64 {
    67
}

/// Reads and parses the bootstrap resource at `path`.
pub fn load_bootstrap(path: &Path) -> Result<AgentBootstrap, ConfigError> {
    let shown = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Bootstrap {
        path: shown.clone(),
        message: e.to_string(),
    })?;
    let bootstrap = parse_bootstrap(&content).map_err(|e| ConfigError::Bootstrap {
        path: shown.clone(),
        message: e.to_string(),
    })?;
    debug!(path = %shown, seed = bootstrap.seed, "bootstrap resource loaded");
    Ok(bootstrap)
}

/// Parses bootstrap JSON; missing keys take their defaults.
pub fn parse_bootstrap(content: &str) -> Result<AgentBootstrap, serde_json::Error> {
    serde_json::from_str(content)
}
