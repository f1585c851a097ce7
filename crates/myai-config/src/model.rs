// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the MyAI assistant service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level MyAI configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MyaiConfig {
    /// Agent identity and reply generation settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Model resolution settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Conversation transcript storage.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Audio input normalization.
    #[serde(default)]
    pub audio: AudioConfig,

    /// HTTP boundary settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// External training job settings.
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Agent identity and reply generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log request envelopes at debug level.
    #[serde(default)]
    pub debug: bool,

    /// Token budget for each generation call.
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Number of most recent history entries used as flat generation context.
    /// `None` uses the whole history.
    #[serde(default)]
    pub context_window: Option<usize>,

    /// Bounded wait around each generation call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Path to the JSON bootstrap resource (`seed`, `startup_prompt`).
    #[serde(default = "default_bootstrap_path")]
    pub bootstrap_path: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            debug: false,
            max_new_tokens: default_max_new_tokens(),
            context_window: None,
            generation_timeout_secs: default_generation_timeout_secs(),
            bootstrap_path: default_bootstrap_path(),
        }
    }
}

fn default_agent_name() -> String {
    "myai".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_new_tokens() -> u32 {
    128
}

fn default_generation_timeout_secs() -> u64 {
    120
}

fn default_bootstrap_path() -> PathBuf {
    PathBuf::from("config/agent.json")
}

/// Device placement hint forwarded to the inference server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMap {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl DeviceMap {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMap::Auto => "auto",
            DeviceMap::Cpu => "cpu",
            DeviceMap::Cuda => "cuda",
        }
    }
}

/// Model resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Pretrained model used when no trained checkpoint is available.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Tokenizer identifier.
    #[serde(default = "default_model")]
    pub default_tokenizer: String,

    /// Directory whose `results/` subdirectory holds trained checkpoints.
    #[serde(default)]
    pub pretrained_model_dir: Option<PathBuf>,

    /// Local directory holding `<id>/tokenizer.json` files.
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Base URL of the inference server hosting the model pipelines.
    #[serde(default = "default_inference_url")]
    pub inference_url: String,

    /// Device placement forwarded with load requests.
    #[serde(default)]
    pub device_map: DeviceMap,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            default_tokenizer: default_model(),
            pretrained_model_dir: None,
            models_dir: default_models_dir(),
            inference_url: default_inference_url(),
            device_map: DeviceMap::default(),
        }
    }
}

impl ModelConfig {
    /// Directory scanned for the most recent trained checkpoint.
    pub fn results_dir(&self) -> Option<PathBuf> {
        self.pretrained_model_dir
            .as_ref()
            .map(|dir| dir.join("results"))
    }
}

fn default_model() -> String {
    "gpt2".to_string()
}

fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("myai").join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}

fn default_inference_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

/// Conversation transcript storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Root directory; transcripts land in `<dir>/<COMPONENT>/<timestamp>.json`.
    #[serde(default = "default_history_dir")]
    pub dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: default_history_dir(),
        }
    }
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("prompts/history")
}

/// Audio input normalization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    /// Sample rate decoded input is resampled to before transcription.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_sample_rate() -> u32 {
    16_000
}

/// HTTP boundary configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_route_asr")]
    pub route_asr: String,

    #[serde(default = "default_route_tts")]
    pub route_tts: String,

    #[serde(default = "default_route_caption")]
    pub route_caption: String,

    #[serde(default = "default_route_training")]
    pub route_training: String,

    /// Upper bound on request bodies (audio and images).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route_asr: default_route_asr(),
            route_tts: default_route_tts(),
            route_caption: default_route_caption(),
            route_training: default_route_training(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_route_asr() -> String {
    "/api/v1/asr".to_string()
}

fn default_route_tts() -> String {
    "/api/v1/tts".to_string()
}

fn default_route_caption() -> String {
    "/api/v1/caption".to_string()
}

fn default_route_training() -> String {
    "/api/v1/training".to_string()
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

/// External training job configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfig {
    /// Argv of the training job. Empty disables training.
    #[serde(default)]
    pub command: Vec<String>,

    /// Parent directory for run outputs. Defaults to `model.results_dir()`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl TrainingConfig {
    pub fn is_enabled(&self) -> bool {
        !self.command.is_empty()
    }
}
