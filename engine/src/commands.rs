//! Commands understood by the interactive front end.
//!
//! A command line starts with `:`; everything else is text to rewrite.

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub usage: &'static str,
    pub description: &'static str,
}

const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec {
        usage: ":actions",
        description: "List the available actions",
    },
    CommandSpec {
        usage: ":action <name>",
        description: "Select the action used for rewriting",
    },
    CommandSpec {
        usage: ":set <SECTION>.<key> <value>",
        description: "Change a setting, e.g. :set LLM.max_length 128",
    },
    CommandSpec {
        usage: ":add <name> <prompt>",
        description: "Add an action with its prompt",
    },
    CommandSpec {
        usage: ":remove <name>",
        description: "Remove an action",
    },
    CommandSpec {
        usage: ":config",
        description: "Show the current settings",
    },
    CommandSpec {
        usage: ":restore",
        description: "Restore the default settings",
    },
    CommandSpec {
        usage: ":reload",
        description: "Re-read the settings file",
    },
    CommandSpec {
        usage: ":clear",
        description: "Clear the last result",
    },
    CommandSpec {
        usage: ":help",
        description: "Show this help",
    },
    CommandSpec {
        usage: ":quit",
        description: "Exit",
    },
];

#[must_use]
pub fn command_specs() -> &'static [CommandSpec] {
    COMMAND_SPECS
}

/// Arguments of `:set SECTION.key value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetArgs<'a> {
    pub section: &'a str,
    pub key: &'a str,
    pub value: &'a str,
}

/// Parsed command with typed arguments.
///
/// `None` arguments mean the command was given without the arguments it
/// needs; the front end answers with its usage line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Actions,
    Action(Option<&'a str>),
    Set(Option<SetArgs<'a>>),
    Add(Option<(&'a str, &'a str)>),
    Remove(Option<&'a str>),
    Config,
    Restore,
    Reload,
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

/// Split off the first whitespace-separated word.
fn split_word(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.trim_start();
    if raw.is_empty() {
        return None;
    }
    match raw.split_once(char::is_whitespace) {
        Some((word, rest)) => Some((word, rest.trim())),
        None => Some((raw, "")),
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    (!raw.is_empty()).then_some(raw)
}

/// A line typed at the prompt.
///
/// Text that itself starts with `:` is entered with a doubled `::`; one
/// colon is dropped before the text is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Command(Command<'a>),
    Text(&'a str),
}

impl<'a> Input<'a> {
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        if let Some(text) = line.trim_start().strip_prefix(':')
            && text.starts_with(':')
        {
            return Input::Text(text);
        }
        Command::parse_line(line).map_or(Input::Text(line), Input::Command)
    }
}

impl<'a> Command<'a> {
    /// Parse a command line. Returns `None` for lines that are not commands,
    /// including lines escaped with `::`.
    #[must_use]
    pub fn parse_line(line: &'a str) -> Option<Self> {
        let rest = line.trim_start().strip_prefix(':')?;
        if rest.starts_with(':') {
            return None;
        }
        Some(Self::parse(rest))
    }

    /// Parse the text after the leading `:`.
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        let Some((name, rest)) = split_word(raw) else {
            return Command::Empty;
        };

        match name {
            "actions" | "a" => Command::Actions,
            "action" => Command::Action(non_empty(rest)),
            "set" => Command::Set(split_word(rest).and_then(|(target, value)| {
                let (section, key) = target.split_once('.')?;
                Some(SetArgs {
                    section,
                    key,
                    value: non_empty(value)?,
                })
            })),
            "add" => Command::Add(
                split_word(rest)
                    .and_then(|(action, prompt)| Some((action, non_empty(prompt)?))),
            ),
            "remove" | "rm" => Command::Remove(non_empty(rest)),
            "config" => Command::Config,
            "restore" => Command::Restore,
            "reload" => Command::Reload,
            "clear" => Command::Clear,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => Command::Unknown(other),
        }
    }
}
