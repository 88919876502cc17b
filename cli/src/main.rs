//! Checkr CLI - binary entry point.
//!
//! ```text
//! main() -> init_tracing() -> ConfigStore::open() -> Session::new()
//!                                                        |
//!                                                        v
//!                                  stdin line -> repl::handle_line() -> stdout
//! ```
//!
//! Logs go to a file so they never interleave with interactive output.

mod render;
mod repl;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::{
    fs::{self, OpenOptions},
    io::{Write, stdout},
    path::PathBuf,
    sync::Mutex,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use checkr_engine::{ConfigPaths, ConfigStore, Notice, OllamaGenerator, Session, config_dir};

use repl::Flow;

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_checkr_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than mixing logs into the prompt.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_checkr_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in checkr_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn checkr_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.checkr/logs/checkr.log
    if let Some(dir) = config_dir() {
        candidates.push(dir.join("logs").join("checkr.log"));
    }

    // Fallback: ./.checkr/logs/checkr.log
    candidates.push(PathBuf::from(".checkr").join("logs").join("checkr.log"));

    candidates
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let paths = ConfigPaths::discover();
    let opened = ConfigStore::open(paths).context("failed to open settings")?;
    let generator = OllamaGenerator::from_env().context("failed to build HTTP client")?;
    tracing::info!(endpoint = generator.endpoint(), "Using Ollama generator");

    let mut out = stdout().lock();
    for err in &opened.recovered {
        writeln!(out, "{}", Notice::from(err).to_string().yellow())?;
    }

    let mut session = Session::new(opened.store, generator);
    if let Some(action) = session.selected_action() {
        writeln!(out, "Action: {}  (:help for commands)", action.name.label())?;
    }
    out.flush()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        if repl::handle_line(&mut session, &line, &mut out).await? == Flow::Quit {
            break;
        }
    }

    tracing::info!("Session ended");
    Ok(())
}
