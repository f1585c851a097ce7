// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history: an append-only, single-owner list of interaction
//! records, plus JSON transcript persistence.
//!
//! Records are never removed or reordered during a session. A
//! [`ScopedTranscript`] ties a history to its sink so the transcript is written
//! exactly once, either by an explicit [`ScopedTranscript::flush`] or when the
//! owner is dropped.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use myai_core::{HistorySink, InteractionRecord, MyaiError, Role};
use tracing::{debug, info, warn};

/// File-name timestamp format for flushed transcripts.
const FLUSH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d__%H-%M-%S";

/// Ordered sequence of interaction records. Insertion order is temporal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    records: Vec<InteractionRecord>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a history from previously flushed records.
    pub fn from_records(records: Vec<InteractionRecord>) -> Self {
        Self { records }
    }

    /// Adds a record to the end.
    pub fn append(&mut self, record: InteractionRecord) {
        debug!(role = %record.role, chars = record.content.len(), "interaction recorded");
        self.records.push(record);
    }

    /// Creates and appends a record stamped with the current time.
    pub fn record(&mut self, role: Role, content: impl Into<String>) -> &InteractionRecord {
        self.append(InteractionRecord::new(role, content));
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&InteractionRecord> {
        self.records.last()
    }

    /// The last `window` records, or all of them when `window` is `None`.
    pub fn window(&self, window: Option<usize>) -> &[InteractionRecord] {
        match window {
            Some(n) => &self.records[self.records.len().saturating_sub(n)..],
            None => &self.records,
        }
    }

    /// Space-joined contents of the last `window` records.
    pub fn render_context(&self, window: Option<usize>) -> String {
        join_contents(self.window(window).iter().map(|r| r.content.as_str()))
    }

    /// Like [`render_context`](Self::render_context), with a not-yet-appended
    /// record as the final element. `window` counts the pending record.
    pub fn render_context_with(&self, window: Option<usize>, pending: &InteractionRecord) -> String {
        let prior = self.window(window.map(|w| w.saturating_sub(1)));
        join_contents(
            prior
                .iter()
                .map(|r| r.content.as_str())
                .chain(std::iter::once(pending.content.as_str())),
        )
    }
}

fn join_contents<'a>(contents: impl Iterator<Item = &'a str>) -> String {
    contents
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes transcripts as pretty JSON arrays to
/// `<root>/<component>/<YYYY-mm-dd__HH-MM-SS>.json`.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    root: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// First free path for `stem` in `dir`, suffixing `-1`, `-2`, ... on collision.
    fn unique_path(dir: &Path, stem: &str) -> PathBuf {
        let candidate = dir.join(format!("{stem}.json"));
        if !candidate.exists() {
            return candidate;
        }
        (1..)
            .map(|n| dir.join(format!("{stem}-{n}.json")))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl HistorySink for JsonHistoryStore {
    fn flush(&self, component: &str, records: &[InteractionRecord]) -> Result<PathBuf, MyaiError> {
        let dir = self.root.join(component);
        std::fs::create_dir_all(&dir).map_err(storage_error)?;

        let stem = chrono::Local::now()
            .format(FLUSH_TIMESTAMP_FORMAT)
            .to_string();
        let path = Self::unique_path(&dir, &stem);

        let file = File::create_new(&path).map_err(storage_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records).map_err(storage_error)?;
        writer.flush().map_err(storage_error)?;

        Ok(path)
    }

    fn load(&self, path: &Path) -> Result<Vec<InteractionRecord>, MyaiError> {
        let file = File::open(path).map_err(storage_error)?;
        serde_json::from_reader(BufReader::new(file)).map_err(storage_error)
    }
}

fn storage_error(err: impl std::error::Error + Send + Sync + 'static) -> MyaiError {
    MyaiError::Storage {
        source: Box::new(err),
    }
}

/// A history bound to the sink it is flushed to at teardown.
///
/// The flush happens exactly once: on the first call to
/// [`flush`](Self::flush), or on drop if it was never called. Errors on the
/// drop path are logged; the transcript is then lost.
pub struct ScopedTranscript {
    component: String,
    history: ConversationHistory,
    sink: Arc<dyn HistorySink>,
    flushed: bool,
}

impl ScopedTranscript {
    pub fn new(component: impl Into<String>, sink: Arc<dyn HistorySink>) -> Self {
        Self {
            component: component.into(),
            history: ConversationHistory::new(),
            sink,
            flushed: false,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Writes the full history. Later calls are no-ops returning `Ok(None)`.
    pub fn flush(&mut self) -> Result<Option<PathBuf>, MyaiError> {
        if self.flushed {
            return Ok(None);
        }
        self.flushed = true;

        info!(
            component = %self.component,
            records = self.history.len(),
            "saving conversation history"
        );
        let path = self.sink.flush(&self.component, self.history.records())?;
        info!(component = %self.component, path = %path.display(), "conversation history saved");
        Ok(Some(path))
    }
}

impl Drop for ScopedTranscript {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }
        if let Err(e) = self.flush() {
            warn!(
                component = %self.component,
                error = %e,
                "failed to save conversation history on release"
            );
        }
    }
}
