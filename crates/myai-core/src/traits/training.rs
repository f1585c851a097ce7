// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow interface to the external fine-tuning batch job.

use async_trait::async_trait;

use crate::error::MyaiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::TrainingRun;

#[async_trait]
pub trait TrainingLauncher: PluginAdapter {
    /// Starts a training run in the background and returns immediately.
    async fn launch(&self) -> Result<TrainingRun, MyaiError>;
}
