// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `myai shell` command implementation.
//!
//! An interactive REPL over the same agent session the gateway uses. The
//! session wakes on start and flushes its transcript on exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use myai_agent::{AgentSession, JsonHistoryStore};
use myai_config::MyaiConfig;
use myai_core::{HistorySink, MyaiError};
use myai_inference::InferenceStack;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::serve::open_agent;

/// Subdirectory of the history dir that receives narrated replies.
const NARRATION_DIR: &str = "NARRATION";

/// What the REPL should do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum ShellInput<'a> {
    Quit,
    Skip,
    /// Speak the previous reply through the synthesizer.
    Narrate,
    Message(&'a str),
}

fn classify(line: &str) -> ShellInput<'_> {
    match line.trim() {
        "/quit" | "/exit" => ShellInput::Quit,
        "" => ShellInput::Skip,
        "/narrate" => ShellInput::Narrate,
        text => ShellInput::Message(text),
    }
}

/// Runs the `myai shell` interactive REPL.
pub async fn run_shell(config: MyaiConfig) -> Result<(), MyaiError> {
    let stack = InferenceStack::from_config(&config)?;
    let sink: Arc<dyn HistorySink> = Arc::new(JsonHistoryStore::new(&config.history.dir));
    let mut session = open_agent(&config, &stack, sink).await?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| MyaiError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{} shell", config.agent.name).bold().green());
    println!(
        "Type {} to exit, {} to hear the last reply.\n",
        "/quit".yellow(),
        "/narrate".yellow()
    );

    if session.wake().await {
        if let Some(greeting) = session.greeting() {
            println!("{}\n", greeting.cyan());
        }
    } else {
        eprintln!("{}", "warm-up failed; continuing without a greeting".yellow());
    }

    let prompt = format!("{}> ", "you".green());
    let mut last_reply: Option<String> = None;
    loop {
        match rl.readline(&prompt) {
            Ok(line) => match classify(&line) {
                ShellInput::Quit => break,
                ShellInput::Skip => continue,
                ShellInput::Narrate => {
                    let dir = config.history.dir.join(NARRATION_DIR);
                    narrate(&session, last_reply.as_deref(), &dir).await
                }
                ShellInput::Message(text) => {
                    let _ = rl.add_history_entry(&line);
                    match session.generate_reply(text).await {
                        Ok(reply) => {
                            println!("{} {}\n", "agent:".cyan().bold(), reply);
                            last_reply = Some(reply);
                        }
                        Err(e) => eprintln!("{}: {e}", "error".red()),
                    }
                }
            },
            // Ctrl+C / Ctrl+D
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    let turns = session.history().len();
    match session.close().await? {
        Some(path) => println!(
            "{}",
            format!("{turns} records saved to {}", path.display()).dimmed()
        ),
        None => println!("{}", "nothing to save".dimmed()),
    }
    Ok(())
}

async fn narrate(session: &AgentSession, reply: Option<&str>, dir: &Path) {
    let Some(reply) = reply else {
        eprintln!("{}", "no reply to narrate yet".yellow());
        return;
    };
    let saved = match session.narrate_wav(reply).await {
        Ok(wav) => save_narration(dir, &wav),
        Err(e) => Err(e),
    };
    match saved {
        Ok(path) => println!("{}", format!("narration saved to {}", path.display()).dimmed()),
        Err(e) => eprintln!("{}: {e}", "error".red()),
    }
}

/// Writes `wav` to `<dir>/<timestamp>.wav`, never overwriting an older file.
fn save_narration(dir: &Path, wav: &[u8]) -> Result<PathBuf, MyaiError> {
    let io = |e: std::io::Error| MyaiError::Storage { source: Box::new(e) };
    std::fs::create_dir_all(dir).map_err(io)?;

    let stem = chrono::Local::now().format("%Y-%m-%d__%H-%M-%S").to_string();
    let path = std::iter::once(dir.join(format!("{stem}.wav")))
        .chain((1..).map(|n| dir.join(format!("{stem}-{n}.wav"))))
        .find(|p| !p.exists())
        .unwrap_or_else(|| dir.join(format!("{stem}.wav")));

    std::fs::write(&path, wav).map_err(io)?;
    Ok(path)
}
