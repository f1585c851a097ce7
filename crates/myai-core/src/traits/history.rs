// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage for conversation transcripts.

use std::path::{Path, PathBuf};

use crate::error::MyaiError;
use crate::types::InteractionRecord;

/// Writes and reads whole transcripts.
///
/// Synchronous so it can run from a scoped-release path (`Drop`).
pub trait HistorySink: Send + Sync {
    /// Writes `records` under the `component` subdirectory and returns the path.
    fn flush(&self, component: &str, records: &[InteractionRecord]) -> Result<PathBuf, MyaiError>;

    /// Reads back a transcript written by [`flush`](HistorySink::flush).
    fn load(&self, path: &Path) -> Result<Vec<InteractionRecord>, MyaiError>;
}
