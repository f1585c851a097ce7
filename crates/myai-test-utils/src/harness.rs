// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end session testing.
//!
//! `TestHarness` assembles an [`AgentSession`] over mock collaborators, a temp
//! history directory, and a temp bootstrap resource.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use myai_agent::{
    AgentCollaborators, AgentSession, GenerationSettings, JsonHistoryStore, ModelResolver,
    SessionSettings,
};
use myai_core::MyaiError;

use crate::mock_collaborators::{MockAudioCodec, MockSynthesizer, MockTranscriber};
use crate::mock_model::{MockModelLoader, MockModelState};

/// Builder for creating test sessions with configurable options.
pub struct TestHarnessBuilder {
    loader: MockModelLoader,
    transcription: String,
    failing_transcriber: bool,
    failing_synthesizer: bool,
    bootstrap: Option<String>,
    checkpoints: Vec<String>,
    generation: GenerationSettings,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            loader: MockModelLoader::new(),
            transcription: "what is the weather".to_string(),
            failing_transcriber: false,
            failing_synthesizer: false,
            bootstrap: Some(r#"{"seed": 67, "startup_prompt": "Introduce yourself."}"#.to_string()),
            checkpoints: Vec::new(),
            generation: GenerationSettings::default(),
        }
    }

    /// Set mock model responses, consumed in order.
    pub fn with_mock_responses(self, responses: Vec<String>) -> Self {
        for response in responses {
            self.loader.state().push_response(response);
        }
        self
    }

    /// Replace the model loader (chat template, embedding size, failures).
    pub fn with_loader(mut self, loader: MockModelLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_transcription(mut self, text: impl Into<String>) -> Self {
        self.transcription = text.into();
        self
    }

    pub fn with_failing_transcriber(mut self) -> Self {
        self.failing_transcriber = true;
        self
    }

    pub fn with_failing_synthesizer(mut self) -> Self {
        self.failing_synthesizer = true;
        self
    }

    /// Raw JSON written to the bootstrap resource.
    pub fn with_bootstrap(mut self, json: impl Into<String>) -> Self {
        self.bootstrap = Some(json.into());
        self
    }

    /// Leave the bootstrap resource missing.
    pub fn without_bootstrap(mut self) -> Self {
        self.bootstrap = None;
        self
    }

    /// Create trained checkpoint directories under `<pretrained>/results/`.
    pub fn with_checkpoints(mut self, names: &[&str]) -> Self {
        self.checkpoints = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.generation.timeout = timeout;
        self
    }

    /// Build the harness and open the session.
    pub async fn build(self) -> Result<TestHarness, MyaiError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| MyaiError::Storage {
            source: Box::new(e),
        })?;
        let io = |e: std::io::Error| MyaiError::Storage {
            source: Box::new(e),
        };

        let bootstrap_path = temp_dir.path().join("agent.json");
        if let Some(json) = &self.bootstrap {
            std::fs::write(&bootstrap_path, json).map_err(io)?;
        }

        let pretrained_dir = temp_dir.path().join("pretrained");
        let results_dir = pretrained_dir.join("results");
        for name in &self.checkpoints {
            std::fs::create_dir_all(results_dir.join(name)).map_err(io)?;
        }

        let history_dir = temp_dir.path().join("history");
        let model_state = self.loader.state();
        let loader = Arc::new(self.loader);
        let resolver = ModelResolver::new(loader.clone(), "gpt2", "gpt2", Some(results_dir));

        let transcriber = Arc::new(if self.failing_transcriber {
            MockTranscriber::failing()
        } else {
            MockTranscriber::new(self.transcription)
        });
        let synthesizer = Arc::new(if self.failing_synthesizer {
            MockSynthesizer::failing()
        } else {
            MockSynthesizer::new()
        });

        let collaborators = AgentCollaborators {
            transcriber: transcriber.clone(),
            synthesizer: synthesizer.clone(),
            codec: Arc::new(MockAudioCodec),
            sink: Arc::new(JsonHistoryStore::new(&history_dir)),
        };
        let settings = SessionSettings {
            generation: self.generation,
            bootstrap_path,
            sample_rate: 16_000,
            debug: true,
        };

        let session = AgentSession::open(&resolver, collaborators, settings).await?;

        Ok(TestHarness {
            session,
            model: model_state,
            loader,
            transcriber,
            synthesizer,
            history_dir,
            pretrained_dir,
            _temp_dir: temp_dir,
        })
    }
}

/// An opened session plus handles to its mocks for assertions.
pub struct TestHarness {
    /// The session under test.
    pub session: AgentSession,
    /// Shared state of the mock language model.
    pub model: Arc<MockModelState>,
    pub loader: Arc<MockModelLoader>,
    pub transcriber: Arc<MockTranscriber>,
    pub synthesizer: Arc<MockSynthesizer>,
    /// Root passed to the JSON history store.
    pub history_dir: PathBuf,
    /// Pretrained model directory; checkpoints live in `results/`.
    pub pretrained_dir: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Transcript files flushed for `component`.
    pub fn flushed_files(&self, component: &str) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.history_dir.join(component))
            .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
            .unwrap_or_default();
        files.sort();
        files
    }

    /// Moves the session out for callers that need to own it. The returned
    /// temp dir must outlive the session.
    pub fn into_session(self) -> (AgentSession, tempfile::TempDir) {
        (self.session, self._temp_dir)
    }
}
