// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the MyAI assistant service.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `MYAI_*` environment variable overrides, miette
//! diagnostics with typo suggestions, and the JSON bootstrap resource read at
//! agent wake-up.
//!
//! # Usage
//!
//! ```no_run
//! use myai_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Default model: {}", config.model.default_model);
//! ```

pub mod bootstrap;
pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use bootstrap::{AgentBootstrap, load_bootstrap};
pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::MyaiConfig;

use std::path::Path;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment errors are converted to diagnostics with typo suggestions;
/// validation errors are collected, not short-circuited.
pub fn load_and_validate() -> Result<MyaiConfig, Vec<ConfigError>> {
    finish(loader::load_config(), || {
        loader::config_file_candidates()
            .into_iter()
            .filter_map(|path| read_source(&path))
            .collect()
    })
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<MyaiConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<MyaiConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validates a loaded config, or turns the load error into diagnostics. The
/// TOML sources are only read when there is an error to locate.
#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<MyaiConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<MyaiConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

fn read_source(path: &Path) -> Option<(String, String)> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| (path.display().to_string(), content))
}
