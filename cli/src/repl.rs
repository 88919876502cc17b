//! Line dispatch for the interactive loop.
//!
//! Each line is either a `:command` or text to rewrite. Text starting with
//! `:` is typed as `::`. Every failure is
//! reported to the user and the loop keeps going; only IO errors on the
//! output stream end it.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Stylize,
    terminal::{Clear, ClearType},
};

use checkr_engine::{
    Command, ConfigError, Generator, Input, Notice, Outcome, Session, SkipReason,
};

use crate::render;

const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub async fn handle_line<G: Generator>(
    session: &mut Session<G>,
    line: &str,
    out: &mut impl Write,
) -> io::Result<Flow> {
    match Input::parse(line) {
        Input::Command(command) => run_command(session, command, out),
        Input::Text(text) => {
            submit(session, text, out).await?;
            Ok(Flow::Continue)
        }
    }
}

fn write_notice(out: &mut impl Write, notice: &Notice) -> io::Result<()> {
    writeln!(out, "{}", notice.to_string().yellow())
}

fn write_settings_error(out: &mut impl Write, err: &ConfigError) -> io::Result<()> {
    tracing::warn!("Settings change failed: {err}");
    write_notice(out, &Notice::from(err))
}

fn run_command<G: Generator>(
    session: &mut Session<G>,
    command: Command<'_>,
    out: &mut impl Write,
) -> io::Result<Flow> {
    if let Some(usage) = render::usage(&command) {
        writeln!(out, "usage: {usage}")?;
        return Ok(Flow::Continue);
    }

    match command {
        Command::Actions => {
            let selected = session.config().llm.action.clone();
            render::write_actions(out, &session.list_actions(), &selected)?;
        }
        Command::Action(Some(name)) => match session.select_action(name) {
            Ok(action) => {
                writeln!(out, "Action: {}", action.name.label())?;
                render::write_view(out, &session.view())?;
            }
            Err(err) => write_settings_error(out, &err)?,
        },
        Command::Set(Some(args)) => {
            match session.update_setting(args.section, args.key, args.value) {
                Ok(()) => writeln!(out, "{}.{} = {}", args.section, args.key, args.value)?,
                Err(err) => write_settings_error(out, &err)?,
            }
        }
        Command::Add(Some((name, prompt))) => match session.add_action(name, prompt, false) {
            Ok(()) => writeln!(out, "Added action '{}'", name.trim().to_ascii_lowercase())?,
            Err(err) => write_settings_error(out, &err)?,
        },
        Command::Remove(Some(name)) => match session.remove_action(name) {
            Ok(()) => writeln!(out, "Removed action '{}'", name.trim().to_ascii_lowercase())?,
            Err(err) => write_settings_error(out, &err)?,
        },
        Command::Config => render::write_config(out, session.config())?,
        Command::Restore => match session.restore_defaults() {
            Ok(_) => writeln!(out, "Restored default settings")?,
            Err(err) => write_settings_error(out, &err)?,
        },
        Command::Reload => match session.reload() {
            Ok(_) => writeln!(out, "Reloaded settings")?,
            Err(err) => write_settings_error(out, &err)?,
        },
        Command::Clear => session.clear(),
        Command::Help => render::write_help(out)?,
        Command::Quit => return Ok(Flow::Quit),
        Command::Unknown(name) => writeln!(out, "Unknown command ':{name}'. Try :help")?,
        Command::Empty
        | Command::Action(None)
        | Command::Set(None)
        | Command::Add(None)
        | Command::Remove(None) => {}
    }
    Ok(Flow::Continue)
}

async fn submit<G: Generator>(
    session: &mut Session<G>,
    input: &str,
    out: &mut impl Write,
) -> io::Result<()> {
    let outcome = if session.config().ui.show_spinner {
        let pending = session.submit(input);
        tokio::pin!(pending);
        let mut ticker = tokio::time::interval(SPINNER_INTERVAL);
        let mut tick = 0usize;
        let outcome = loop {
            tokio::select! {
                outcome = &mut pending => break outcome,
                _ = ticker.tick() => {
                    write!(out, "\r{} processing", render::spinner_frame(tick))?;
                    out.flush()?;
                    tick = tick.wrapping_add(1);
                }
            }
        };
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        outcome
    } else {
        session.submit(input).await
    };

    match outcome {
        Outcome::Generated => {
            render::write_view(out, &session.view())?;
            if let Some((added, removed)) = session.change_stats() {
                writeln!(out, "{}", format!("+{added} -{removed} words").dim())?;
            }
        }
        Outcome::Skipped(SkipReason::AlreadyProcessed) => {
            writeln!(out, "{}", "unchanged input".dim())?;
        }
        Outcome::Skipped(SkipReason::Blank | SkipReason::Queued) => {}
        Outcome::NoOp(err) => {
            writeln!(out, "{}", format!("{err}; pick one with :action").yellow())?;
        }
        Outcome::Failed(_) => render::write_view(out, &session.view())?,
    }
    out.flush()
}
