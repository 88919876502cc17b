//! Resolved configuration types shared across crates.
//!
//! These types represent fully-validated configuration state. The settings
//! file stores every value as text; the config loader parses that text into
//! these types once, at the load boundary, and nothing downstream re-parses
//! strings.
//!
//! The action table owns both the prompt template and the diff-display flag
//! of every action, so the `PROMPTS` and `DIFFS` sections can never disagree
//! about which actions exist.

use std::fmt;
use std::num::NonZeroU32;
use std::slice;

use thiserror::Error;

/// Generation length used when no valid `max_length` is available.
pub const DEFAULT_MAX_LENGTH: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldValueError {
    #[error("expected a positive integer, got {0:?}")]
    NotPositiveInteger(String),
    #[error("expected True or False, got {0:?}")]
    NotBoolean(String),
    #[error("value must not be empty")]
    Empty,
    #[error("value must fit on a single line")]
    MultiLine,
    #[error("{0:?} contains a reserved character (one of = : [ ])")]
    ReservedCharacter(String),
    #[error("{0:?} starts with a comment marker (# or ;)")]
    CommentMarker(String),
}

/// Parse the canonical boolean encoding of the settings file.
pub fn parse_flag(raw: &str) -> Result<bool, FieldValueError> {
    match raw.trim() {
        "True" => Ok(true),
        "False" => Ok(false),
        other => Err(FieldValueError::NotBoolean(other.to_string())),
    }
}

#[must_use]
pub const fn format_flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn single_line(raw: &str) -> Result<&str, FieldValueError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(FieldValueError::Empty);
    }
    if value.contains(['\n', '\r']) {
        return Err(FieldValueError::MultiLine);
    }
    Ok(value)
}

// ============================================================================
// Scalar field types
// ============================================================================

/// Name of an editing action, e.g. `grammar`.
///
/// Names are case-insensitive: they are stored ASCII-lowercased, which is
/// also how they appear as keys in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionName(String);

impl ActionName {
    pub fn parse(raw: &str) -> Result<Self, FieldValueError> {
        let name = single_line(raw)?;
        if name.contains(['=', ':', '[', ']']) {
            return Err(FieldValueError::ReservedCharacter(name.to_string()));
        }
        // a key line starting with one of these reads back as a comment
        if name.starts_with(['#', ';']) {
            return Err(FieldValueError::CommentMarker(name.to_string()));
        }
        Ok(Self(name.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title-cased label for selection surfaces: `"fix tone"` becomes `"Fix Tone"`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut at_word_start = true;
        for ch in self.0.chars() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = !ch.is_alphabetic();
        }
        out
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of the text-to-text model, passed through to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId(String);

impl ModelId {
    pub fn parse(raw: &str) -> Result<Self, FieldValueError> {
        single_line(raw).map(|value| Self(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upper bound on the generated output length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaxLength(NonZeroU32);

impl MaxLength {
    pub const FALLBACK: Self = Self(NonZeroU32::new(DEFAULT_MAX_LENGTH).unwrap());

    pub fn parse(raw: &str) -> Result<Self, FieldValueError> {
        let value = raw.trim();
        value
            .parse::<NonZeroU32>()
            .map(Self)
            .map_err(|_| FieldValueError::NotPositiveInteger(value.to_string()))
    }

    #[must_use]
    pub const fn new(value: NonZeroU32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for MaxLength {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for MaxLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instruction text placed in front of the user's input.
///
/// Normalized on construction: every line is trimmed and blank lines are
/// dropped. A normalized template survives a write/read cycle through the
/// settings file unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(raw: &str) -> Result<Self, FieldValueError> {
        let normalized = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if normalized.is_empty() {
            Err(FieldValueError::Empty)
        } else {
            Ok(Self(normalized))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full model prompt: the template, one space, then the raw input.
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        format!("{} {input}", self.0)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Action table
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    name: ActionName,
    prompt: PromptTemplate,
    show_diff: bool,
}

impl ActionEntry {
    #[must_use]
    pub fn new(name: ActionName, prompt: PromptTemplate, show_diff: bool) -> Self {
        Self {
            name,
            prompt,
            show_diff,
        }
    }

    #[must_use]
    pub fn name(&self) -> &ActionName {
        &self.name
    }

    #[must_use]
    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    #[must_use]
    pub fn show_diff(&self) -> bool {
        self.show_diff
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionTableError {
    #[error("action '{0}' already exists")]
    Duplicate(ActionName),
    #[error("unknown action '{0}'")]
    Missing(ActionName),
}

/// Ordered set of actions, kept in insertion order.
///
/// Insertion order is the order of the settings file, so selection surfaces
/// list actions identically across reloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTable {
    entries: Vec<ActionEntry>,
}

impl ActionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &ActionName) -> Option<&ActionEntry> {
        self.entries.iter().find(|entry| &entry.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &ActionName) -> bool {
        self.get(name).is_some()
    }

    fn get_mut(&mut self, name: &ActionName) -> Result<&mut ActionEntry, ActionTableError> {
        self.entries
            .iter_mut()
            .find(|entry| &entry.name == name)
            .ok_or_else(|| ActionTableError::Missing(name.clone()))
    }

    pub fn insert(&mut self, entry: ActionEntry) -> Result<(), ActionTableError> {
        if self.contains(&entry.name) {
            return Err(ActionTableError::Duplicate(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, name: &ActionName) -> Result<ActionEntry, ActionTableError> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.name == name)
            .ok_or_else(|| ActionTableError::Missing(name.clone()))?;
        Ok(self.entries.remove(index))
    }

    pub fn set_prompt(
        &mut self,
        name: &ActionName,
        prompt: PromptTemplate,
    ) -> Result<(), ActionTableError> {
        self.get_mut(name)?.prompt = prompt;
        Ok(())
    }

    pub fn set_show_diff(&mut self, name: &ActionName, show: bool) -> Result<(), ActionTableError> {
        self.get_mut(name)?.show_diff = show;
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &ActionName> {
        self.entries.iter().map(ActionEntry::name)
    }

    pub fn iter(&self) -> slice::Iter<'_, ActionEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ActionTable {
    type Item = &'a ActionEntry;
    type IntoIter = slice::Iter<'a, ActionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    /// Last selected action. May name an action that no longer exists;
    /// lookups treat that as a stale selection.
    pub action: ActionName,
    pub model: ModelId,
    pub max_length: MaxLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiSettings {
    pub show_spinner: bool,
}

/// One complete configuration layer (`Defaults` or `Active`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub llm: LlmSettings,
    pub ui: UiSettings,
    pub actions: ActionTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetFieldError {
    #[error("invalid value for {field}: {source}")]
    InvalidValue {
        field: FieldKey,
        #[source]
        source: FieldValueError,
    },
    #[error("unknown action '{0}'")]
    UnknownAction(ActionName),
}

impl Config {
    /// Validate `raw` for `field` and store it.
    ///
    /// The value is fully parsed before anything is assigned, so a rejected
    /// value leaves the config untouched. `LLM.action` and the per-action
    /// fields must name an action that is already in the table.
    pub fn set_field(&mut self, field: &FieldKey, raw: &str) -> Result<(), SetFieldError> {
        let invalid = |source| SetFieldError::InvalidValue {
            field: field.clone(),
            source,
        };
        match field {
            FieldKey::Action => {
                let name = ActionName::parse(raw).map_err(invalid)?;
                if !self.actions.contains(&name) {
                    return Err(SetFieldError::UnknownAction(name));
                }
                self.llm.action = name;
            }
            FieldKey::Model => self.llm.model = ModelId::parse(raw).map_err(invalid)?,
            FieldKey::MaxLength => self.llm.max_length = MaxLength::parse(raw).map_err(invalid)?,
            FieldKey::ShowSpinner => self.ui.show_spinner = parse_flag(raw).map_err(invalid)?,
            FieldKey::Prompt(name) => {
                let prompt = PromptTemplate::new(raw).map_err(invalid)?;
                self.actions
                    .set_prompt(name, prompt)
                    .map_err(|_| SetFieldError::UnknownAction(name.clone()))?;
            }
            FieldKey::ShowDiff(name) => {
                let show = parse_flag(raw).map_err(invalid)?;
                self.actions
                    .set_show_diff(name, show)
                    .map_err(|_| SetFieldError::UnknownAction(name.clone()))?;
            }
        }
        Ok(())
    }

    /// Current value of `field` in its on-disk text form.
    #[must_use]
    pub fn field_value(&self, field: &FieldKey) -> Option<String> {
        match field {
            FieldKey::Action => Some(self.llm.action.to_string()),
            FieldKey::Model => Some(self.llm.model.to_string()),
            FieldKey::MaxLength => Some(self.llm.max_length.to_string()),
            FieldKey::ShowSpinner => Some(format_flag(self.ui.show_spinner).to_string()),
            FieldKey::Prompt(name) => self
                .actions
                .get(name)
                .map(|entry| entry.prompt.to_string()),
            FieldKey::ShowDiff(name) => self
                .actions
                .get(name)
                .map(|entry| format_flag(entry.show_diff).to_string()),
        }
    }
}

// ============================================================================
// Field addressing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Llm,
    Ui,
    Prompts,
    Diffs,
}

impl Section {
    pub const ALL: [Self; 4] = [Self::Llm, Self::Ui, Self::Prompts, Self::Diffs];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "LLM",
            Self::Ui => "UI",
            Self::Prompts => "PROMPTS",
            Self::Diffs => "DIFFS",
        }
    }

    /// Match a section header, ignoring ASCII case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldKeyError {
    #[error("unknown section [{0}]")]
    UnknownSection(String),
    #[error("unknown key '{key}' in [{section}]")]
    UnknownKey { section: Section, key: String },
    #[error("invalid action name: {0}")]
    InvalidActionName(#[source] FieldValueError),
}

/// Address of one editable setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Action,
    Model,
    MaxLength,
    ShowSpinner,
    Prompt(ActionName),
    ShowDiff(ActionName),
}

impl FieldKey {
    pub fn parse(section: &str, key: &str) -> Result<Self, FieldKeyError> {
        let section = Section::parse(section)
            .ok_or_else(|| FieldKeyError::UnknownSection(section.trim().to_string()))?;
        Self::in_section(section, key)
    }

    pub fn in_section(section: Section, key: &str) -> Result<Self, FieldKeyError> {
        let normalized = key.trim().to_ascii_lowercase();
        let unknown = || FieldKeyError::UnknownKey {
            section,
            key: normalized.clone(),
        };
        match section {
            Section::Llm => match normalized.as_str() {
                "action" => Ok(Self::Action),
                "model" => Ok(Self::Model),
                "max_length" => Ok(Self::MaxLength),
                _ => Err(unknown()),
            },
            Section::Ui => match normalized.as_str() {
                "show_spinner" => Ok(Self::ShowSpinner),
                _ => Err(unknown()),
            },
            Section::Prompts => ActionName::parse(key)
                .map(Self::Prompt)
                .map_err(FieldKeyError::InvalidActionName),
            Section::Diffs => ActionName::parse(key)
                .map(Self::ShowDiff)
                .map_err(FieldKeyError::InvalidActionName),
        }
    }

    #[must_use]
    pub fn section(&self) -> Section {
        match self {
            Self::Action | Self::Model | Self::MaxLength => Section::Llm,
            Self::ShowSpinner => Section::Ui,
            Self::Prompt(_) => Section::Prompts,
            Self::ShowDiff(_) => Section::Diffs,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Action => "action",
            Self::Model => "model",
            Self::MaxLength => "max_length",
            Self::ShowSpinner => "show_spinner",
            Self::Prompt(name) | Self::ShowDiff(name) => name.as_str(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key())
    }
}
