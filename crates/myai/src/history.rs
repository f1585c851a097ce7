// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `myai history` command implementation.

use std::path::Path;

use colored::Colorize;
use myai_agent::JsonHistoryStore;
use myai_core::{HistorySink, InteractionRecord, MyaiError, Role};

/// Loads a flushed transcript and prints one line per record.
pub fn print_transcript(file: &Path) -> Result<(), MyaiError> {
    let root = file.parent().unwrap_or_else(|| Path::new("."));
    let records = JsonHistoryStore::new(root).load(file)?;

    if records.is_empty() {
        println!("{}", "empty transcript".dimmed());
        return Ok(());
    }
    for record in &records {
        println!("{}", render_line(record, true));
    }
    println!("{}", format!("{} records", records.len()).dimmed());
    Ok(())
}

fn render_line(record: &InteractionRecord, color: bool) -> String {
    let when = chrono::DateTime::from_timestamp(record.timestamp, 0)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());
    let role = match record.role {
        Role::User => "user",
        Role::Agent => "agent",
    };
    if color {
        let role = match record.role {
            Role::User => role.green().bold(),
            Role::Agent => role.cyan().bold(),
        };
        format!("{} {role}: {}", when.dimmed(), record.content)
    } else {
        format!("{when} {role}: {}", record.content)
    }
}
