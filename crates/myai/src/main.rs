// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MyAI - a multimodal assistant service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod history;
mod serve;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// MyAI - a multimodal assistant service.
#[derive(Parser, Debug)]
#[command(name = "myai", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Talk to the assistant from the terminal.
    Shell,
    /// Print a flushed conversation transcript.
    History {
        /// Path to a transcript JSON file.
        file: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => myai_config::load_and_validate_path(path),
        None => myai_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            myai_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            serve::init_tracing(&config.agent.log_level);
            serve::run_serve(config).await
        }
        Some(Commands::Shell) => {
            serve::init_tracing("warn");
            shell::run_shell(config).await
        }
        Some(Commands::History { file }) => history::print_transcript(&file),
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                print!("{rendered}");
                Ok(())
            }
            Err(e) => Err(myai_core::MyaiError::Config(format!(
                "failed to render config: {e}"
            ))),
        },
        None => {
            println!("myai: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("myai: {e}");
        std::process::exit(1);
    }
}
