// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Launches the external fine-tuning job as a child process.
//!
//! Each run writes into `<output_root>/<model>-<YYYY-mm-dd__HH-MM-SS>`, passed
//! to the job as `MYAI_TRAINING_OUTPUT`. The timestamped name makes the newest
//! run the lexicographically greatest, which is what model resolution picks.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use myai_core::traits::adapter::PluginAdapter;
use myai_core::types::{AdapterType, HealthStatus, TrainingRun};
use myai_core::{MyaiError, TrainingLauncher};
use tracing::{info, warn};

/// Environment variable naming the run's output directory.
pub const TRAINING_OUTPUT_ENV: &str = "MYAI_TRAINING_OUTPUT";

const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d__%H-%M-%S";

/// Spawns a configured argv per training run.
#[derive(Debug, Clone)]
pub struct CommandTrainingLauncher {
    command: Vec<String>,
    output_root: PathBuf,
    model: String,
}

impl CommandTrainingLauncher {
    pub fn new(command: Vec<String>, output_root: impl Into<PathBuf>, model: impl Into<String>) -> Result<Self, MyaiError> {
        if command.is_empty() {
            return Err(MyaiError::Config("training command must not be empty".to_string()));
        }
        Ok(Self {
            command,
            output_root: output_root.into(),
            model: model.into(),
        })
    }

    /// Output directory for a run started now.
    pub fn next_output_dir(&self) -> PathBuf {
        let stamp = chrono::Local::now().format(RUN_TIMESTAMP_FORMAT);
        let model = self.model.replace(['/', '\\'], "_");
        self.output_root.join(format!("{model}-{stamp}"))
    }
}

#[async_trait]
impl PluginAdapter for CommandTrainingLauncher {
    fn name(&self) -> &str {
        "command-trainer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Training
    }

    async fn health_check(&self) -> Result<HealthStatus, MyaiError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MyaiError> {
        Ok(())
    }
}

#[async_trait]
impl TrainingLauncher for CommandTrainingLauncher {
    async fn launch(&self) -> Result<TrainingRun, MyaiError> {
        let output_dir = self.next_output_dir();
        tokio::fs::create_dir_all(&self.output_root)
            .await
            .map_err(|e| MyaiError::Training(format!("cannot create {}: {e}", self.output_root.display())))?;

        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| MyaiError::Training("training command is empty".to_string()))?;

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .env(TRAINING_OUTPUT_ENV, &output_dir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| MyaiError::Training(format!("failed to spawn `{program}`: {e}")))?;

        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            component = "TRAINER",
            run_id = %run_id,
            output = %output_dir.display(),
            pid = ?child.id(),
            "training run started"
        );

        let id = run_id.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    info!(component = "TRAINER", run_id = %id, "training run finished");
                }
                Ok(status) => {
                    warn!(component = "TRAINER", run_id = %id, %status, "training run failed");
                }
                Err(e) => {
                    warn!(component = "TRAINER", run_id = %id, error = %e, "lost track of training run");
                }
            }
        });

        Ok(TrainingRun { run_id, output_dir })
    }
}
