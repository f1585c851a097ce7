// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./myai.toml` > `~/.config/myai/myai.toml` > `/etc/myai/myai.toml`
//! with environment variable overrides via `MYAI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MyaiConfig;

/// Sections that `MYAI_<SECTION>_<KEY>` variables are mapped into.
const ENV_SECTIONS: &[&str] = &["agent", "model", "history", "audio", "gateway", "training"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/myai/myai.toml` (system-wide)
/// 3. `~/.config/myai/myai.toml` (user XDG config)
/// 4. `./myai.toml` (local directory)
/// 5. `MYAI_*` environment variables
pub fn load_config() -> Result<MyaiConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MyaiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MyaiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MyaiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MyaiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files in merge order: system, user, then working directory.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/myai/myai.toml")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("myai").join("myai.toml"));
    }
    files.push(
        std::env::current_dir()
            .map(|cwd| cwd.join("myai.toml"))
            .unwrap_or_else(|_| PathBuf::from("myai.toml")),
    );
    files
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    config_file_candidates()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(MyaiConfig::default())),
            |figment, file| figment.merge(Toml::file(file)),
        )
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MYAI_AGENT_MAX_NEW_TOKENS` must map to `agent.max_new_tokens`,
/// not `agent.max.new.tokens`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("MYAI_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env key to its dotted config path. Figment keeps the
/// variable's original case, so the key is lowercased first.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
