// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for MyAI integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without model servers.
//!
//! # Components
//!
//! - [`MockModelLoader`] - Byte-level tokenizer and replaying language model
//! - [`MockTranscriber`], [`MockSynthesizer`], [`MockAudioCodec`] - Speech collaborators
//! - [`TestHarness`] - An opened [`myai_agent::AgentSession`] over the mocks

pub mod harness;
pub mod mock_collaborators;
pub mod mock_model;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_collaborators::{
    MockAdapter, MockAudioCodec, MockCaptioner, MockHistorySink, MockSynthesizer, MockTrainingLauncher,
    MockTranscriber,
};
pub use mock_model::{MockLanguageModel, MockModelLoader, MockModelState, MockTokenizer};
