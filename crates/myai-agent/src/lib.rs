// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration for the MyAI assistant.
//!
//! The [`AgentSession`] is the central coordinator that:
//! - Owns one resolved model handle and one conversation history
//! - Warms the model with a bootstrap prompt on wake
//! - Answers text and audio prompts, optionally narrating the reply
//! - Flushes its transcript exactly once at teardown

pub mod audio;
pub mod caption;
pub mod history;
pub mod prompt;
pub mod reply;
pub mod resolver;
pub mod session;
pub mod shutdown;

pub use caption::{CaptionSession, DEFAULT_CAPTION_PROMPT};
pub use history::{ConversationHistory, JsonHistoryStore, ScopedTranscript};
pub use prompt::PromptStage;
pub use reply::{GenerationSettings, ReplyGenerator};
pub use resolver::{ModelHandle, ModelResolver, ResolveError};
pub use session::{AgentCollaborators, AgentSession, SessionHealth, SessionSettings};
pub use shutdown::install_signal_handler;
