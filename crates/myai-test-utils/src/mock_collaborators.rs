// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock speech, audio, captioning, training, and history collaborators.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use myai_core::traits::adapter::PluginAdapter;
use myai_core::types::{
    AdapterType, HealthStatus, InteractionRecord, SynthesizedAudio, TrainingRun, Transcription,
    Waveform,
};
use myai_core::{
    AudioCodec, HistorySink, ImageCaptioner, MyaiError, SpeechSynthesizer, TrainingLauncher,
    Transcriber,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

macro_rules! mock_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, MyaiError> {
                Ok(HealthStatus::Healthy)
            }

            async fn shutdown(&self) -> Result<(), MyaiError> {
                Ok(())
            }
        }
    };
}

/// Stand-alone adapter with a fixed health status that counts shutdowns.
pub struct MockAdapter {
    name: String,
    status: HealthStatus,
    shutdowns: Mutex<usize>,
}

impl MockAdapter {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self::with_status(name, HealthStatus::Healthy)
    }

    pub fn unhealthy(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::with_status(name, HealthStatus::Unhealthy(reason.into()))
    }

    pub fn with_status(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            shutdowns: Mutex::new(0),
        }
    }

    pub fn shutdowns(&self) -> usize {
        *lock(&self.shutdowns)
    }
}

#[async_trait]
impl PluginAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ModelLoader
    }

    async fn health_check(&self) -> Result<HealthStatus, MyaiError> {
        Ok(self.status.clone())
    }

    async fn shutdown(&self) -> Result<(), MyaiError> {
        *lock(&self.shutdowns) += 1;
        Ok(())
    }
}

/// Returns a fixed transcription and records what it was given.
pub struct MockTranscriber {
    text: String,
    fail: bool,
    calls: Mutex<Vec<(usize, u32)>>,
}

impl MockTranscriber {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// `(sample_count, sample_rate)` for every call.
    pub fn calls(&self) -> Vec<(usize, u32)> {
        lock(&self.calls).clone()
    }
}

mock_adapter!(MockTranscriber, "mock-transcriber", AdapterType::Transcription);

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, mono: &[f32], sample_rate: u32) -> Result<Transcription, MyaiError> {
        lock(&self.calls).push((mono.len(), sample_rate));
        if self.fail {
            return Err(MyaiError::Transcription("mock transcriber failure".into()));
        }
        Ok(Transcription {
            text: self.text.clone(),
        })
    }
}

/// Synthesizes a short quiet ramp for any text.
pub struct MockSynthesizer {
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Texts passed to `synthesize`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

mock_adapter!(MockSynthesizer, "mock-synthesizer", AdapterType::Synthesis);

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, MyaiError> {
        lock(&self.calls).push(text.to_string());
        if self.fail {
            return Err(MyaiError::Synthesis("mock synthesizer failure".into()));
        }
        let samples = (0..160).map(|i| (i as f32 / 160.0) * 0.25).collect();
        Ok(SynthesizedAudio {
            samples,
            sample_rate: 16_000,
        })
    }
}

/// Decodes any non-empty buffer as stereo 32 kHz audio, one sample per byte.
///
/// WAV encoding writes `RIFF` followed by the little-endian samples.
#[derive(Debug, Default)]
pub struct MockAudioCodec;

impl AudioCodec for MockAudioCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Waveform, MyaiError> {
        if bytes.starts_with(b"garbage") {
            return Err(MyaiError::Audio("unrecognized container".into()));
        }
        Ok(Waveform {
            samples: bytes.iter().map(|&b| f32::from(b) / 255.0).collect(),
            channels: 2,
            sample_rate: 32_000,
        })
    }

    fn encode_wav(&self, pcm: &[i16], _sample_rate: u32) -> Result<Vec<u8>, MyaiError> {
        let mut out = b"RIFF".to_vec();
        for sample in pcm {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(out)
    }
}

/// Returns `"<prompt> a cat"` (or `"a cat"` unconditionally).
pub struct MockCaptioner {
    prompts: Mutex<Vec<Option<String>>>,
}

impl MockCaptioner {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Option<String>> {
        lock(&self.prompts).clone()
    }
}

impl Default for MockCaptioner {
    fn default() -> Self {
        Self::new()
    }
}

mock_adapter!(MockCaptioner, "mock-captioner", AdapterType::Captioning);

#[async_trait]
impl ImageCaptioner for MockCaptioner {
    async fn caption(&self, _image: &[u8], prompt: Option<&str>) -> Result<String, MyaiError> {
        lock(&self.prompts).push(prompt.map(str::to_owned));
        Ok(match prompt {
            Some(p) => format!("{p} a cat"),
            None => "a cat".to_string(),
        })
    }
}

/// Reports a launched run without spawning anything.
pub struct MockTrainingLauncher {
    output_root: PathBuf,
    launches: Mutex<usize>,
}

impl MockTrainingLauncher {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            launches: Mutex::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        *lock(&self.launches)
    }
}

mock_adapter!(MockTrainingLauncher, "mock-trainer", AdapterType::Training);

#[async_trait]
impl TrainingLauncher for MockTrainingLauncher {
    async fn launch(&self) -> Result<TrainingRun, MyaiError> {
        let mut launches = lock(&self.launches);
        *launches += 1;
        Ok(TrainingRun {
            run_id: format!("run-{}", *launches),
            output_dir: self.output_root.join(format!("gpt2-run-{}", *launches)),
        })
    }
}

/// Keeps flushed transcripts in memory.
#[derive(Debug, Default)]
pub struct MockHistorySink {
    flushes: Mutex<Vec<(String, Vec<InteractionRecord>)>>,
    fail: bool,
}

impl MockHistorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(component, records)` for every flush.
    pub fn flushes(&self) -> Vec<(String, Vec<InteractionRecord>)> {
        lock(&self.flushes).clone()
    }
}

impl HistorySink for MockHistorySink {
    fn flush(&self, component: &str, records: &[InteractionRecord]) -> Result<PathBuf, MyaiError> {
        if self.fail {
            return Err(MyaiError::Storage {
                source: Box::new(std::io::Error::other("mock sink failure")),
            });
        }
        let mut flushes = lock(&self.flushes);
        flushes.push((component.to_string(), records.to_vec()));
        Ok(PathBuf::from(format!("mem://{component}/{}", flushes.len())))
    }

    fn load(&self, path: &Path) -> Result<Vec<InteractionRecord>, MyaiError> {
        let index = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1));
        index
            .and_then(|i| lock(&self.flushes).get(i).map(|(_, r)| r.clone()))
            .ok_or_else(|| MyaiError::Storage {
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no transcript at {}", path.display()),
                )),
            })
    }
}
