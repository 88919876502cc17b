//! Terminal output for the line-oriented front end.
//!
//! Changed spans are bold green, deletion placeholders print nothing.

use std::io::{self, Write};

use crossterm::style::Stylize;

use checkr_engine::{ActionName, Command, Config, ConfigLayer, Segment, View, command_specs};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[must_use]
pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

pub fn write_segments(out: &mut impl Write, segments: &[Segment]) -> io::Result<()> {
    let mut first = true;
    for segment in segments.iter().filter(|segment| !segment.is_placeholder()) {
        if !first {
            write!(out, " ")?;
        }
        first = false;
        match segment {
            Segment::Unchanged(text) => write!(out, "{text}")?,
            Segment::Changed(text) => write!(out, "{}", text.as_str().bold().green())?,
        }
    }
    writeln!(out)
}

pub fn write_view(out: &mut impl Write, view: &View) -> io::Result<()> {
    match view {
        View::Empty => Ok(()),
        View::Plain(text) => writeln!(out, "{text}"),
        View::Diff(segments) => write_segments(out, segments),
        View::Error(message) => writeln!(out, "{}", format!("error: {message}").red()),
    }
}

pub fn write_actions(
    out: &mut impl Write,
    actions: &[&ActionName],
    selected: &ActionName,
) -> io::Result<()> {
    for action in actions {
        if *action == selected {
            writeln!(out, "{} {}", "▸".green(), action.label().bold())?;
        } else {
            writeln!(out, "  {}", action.label())?;
        }
    }
    Ok(())
}

pub fn write_config(out: &mut impl Write, config: &Config) -> io::Result<()> {
    let text = ConfigLayer::from_config(config).to_document().render()?;
    write!(out, "{text}")
}

pub fn write_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Type text to rewrite it with the selected action.")?;
    writeln!(out, "Start the line with :: to rewrite text that begins with ':'.")?;
    let width = command_specs()
        .iter()
        .map(|spec| spec.usage.len())
        .max()
        .unwrap_or(0);
    for spec in command_specs() {
        writeln!(out, "  {:<width$}  {}", spec.usage, spec.description)?;
    }
    Ok(())
}

/// Usage line for a command given without its arguments.
#[must_use]
pub fn usage(command: &Command<'_>) -> Option<&'static str> {
    let prefix = match command {
        Command::Action(None) => ":action ",
        Command::Set(None) => ":set ",
        Command::Add(None) => ":add ",
        Command::Remove(None) => ":remove ",
        _ => return None,
    };
    command_specs()
        .iter()
        .find(|spec| spec.usage.starts_with(prefix))
        .map(|spec| spec.usage)
}
