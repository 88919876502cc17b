//! One settings file as a partial configuration.
//!
//! A file may leave any field out. [`ConfigLayer::compose`] fills the gaps
//! from a complete base config, which is how `Active` falls back to
//! `Defaults` field by field.

use std::collections::HashSet;

use checkr_types::{
    ActionEntry, ActionName, ActionTable, Config, FieldKey, FieldKeyError, FieldValueError,
    LlmSettings, MaxLength, ModelId, PromptTemplate, Section, UiSettings, format_flag, parse_flag,
};

use crate::error::ParseReason;
use crate::document::IniDocument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub action: Option<ActionName>,
    pub model: Option<ModelId>,
    pub max_length: Option<MaxLength>,
    pub show_spinner: Option<bool>,
    /// `PROMPTS` entries in file order.
    pub prompts: Vec<(ActionName, PromptTemplate)>,
    /// `DIFFS` entries in file order.
    pub diffs: Vec<(ActionName, bool)>,
}

fn value_error(field: &FieldKey) -> impl Fn(FieldValueError) -> ParseReason + '_ {
    move |source| ParseReason::Value {
        field: field.to_string(),
        source,
    }
}

impl ConfigLayer {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate a parsed document into a layer.
    ///
    /// Unknown sections, unknown `LLM`/`UI` keys and malformed values are
    /// errors. The one exception is `max_length`: a value that is not a
    /// positive integer is replaced by the fallback length with a warning.
    pub fn from_document(doc: &IniDocument) -> Result<Self, ParseReason> {
        let mut layer = Self::default();
        let mut seen = HashSet::new();

        for ini_section in doc.sections() {
            let section = Section::parse(ini_section.name()).ok_or_else(|| {
                FieldKeyError::UnknownSection(ini_section.name().to_string())
            })?;
            if !seen.insert(section) {
                return Err(ParseReason::DuplicateSection(section));
            }

            for (key, raw) in ini_section.entries() {
                let field = FieldKey::in_section(section, key)?;
                let invalid = value_error(&field);
                match &field {
                    FieldKey::Action => {
                        layer.action = Some(ActionName::parse(raw).map_err(&invalid)?);
                    }
                    FieldKey::Model => layer.model = Some(ModelId::parse(raw).map_err(&invalid)?),
                    FieldKey::MaxLength => {
                        let max_length = MaxLength::parse(raw).unwrap_or_else(|err| {
                            tracing::warn!(
                                value = raw,
                                fallback = MaxLength::FALLBACK.get(),
                                "Ignoring invalid max_length: {err}"
                            );
                            MaxLength::FALLBACK
                        });
                        layer.max_length = Some(max_length);
                    }
                    FieldKey::ShowSpinner => {
                        layer.show_spinner = Some(parse_flag(raw).map_err(&invalid)?);
                    }
                    FieldKey::Prompt(name) => {
                        let prompt = PromptTemplate::new(raw).map_err(&invalid)?;
                        layer.prompts.push((name.clone(), prompt));
                    }
                    FieldKey::ShowDiff(name) => {
                        let show = parse_flag(raw).map_err(&invalid)?;
                        layer.diffs.push((name.clone(), show));
                    }
                }
            }
        }

        Ok(layer)
    }

    /// Layer holding every field of `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            action: Some(config.llm.action.clone()),
            model: Some(config.llm.model.clone()),
            max_length: Some(config.llm.max_length),
            show_spinner: Some(config.ui.show_spinner),
            prompts: config
                .actions
                .iter()
                .map(|entry| (entry.name().clone(), entry.prompt().clone()))
                .collect(),
            diffs: config
                .actions
                .iter()
                .map(|entry| (entry.name().clone(), entry.show_diff()))
                .collect(),
        }
    }

    #[must_use]
    pub fn to_document(&self) -> IniDocument {
        let mut doc = IniDocument::new();

        let llm = doc.section_mut(Section::Llm.as_str());
        if let Some(action) = &self.action {
            llm.set("action", action.as_str());
        }
        if let Some(model) = &self.model {
            llm.set("model", model.as_str());
        }
        if let Some(max_length) = self.max_length {
            llm.set("max_length", max_length.to_string());
        }

        let ui = doc.section_mut(Section::Ui.as_str());
        if let Some(show_spinner) = self.show_spinner {
            ui.set("show_spinner", format_flag(show_spinner));
        }

        let prompts = doc.section_mut(Section::Prompts.as_str());
        for (name, prompt) in &self.prompts {
            prompts.set(name.as_str(), prompt.as_str());
        }

        let diffs = doc.section_mut(Section::Diffs.as_str());
        for (name, show) in &self.diffs {
            diffs.set(name.as_str(), format_flag(*show));
        }

        doc
    }

    /// Fill every field this layer leaves out from `base`.
    ///
    /// The action list comes from this layer's `PROMPTS` when it has any,
    /// otherwise from `base`. Each action's diff flag is looked up in this
    /// layer's `DIFFS`, then in `base`, then defaults to off. `DIFFS`
    /// entries for actions without a prompt are dropped.
    #[must_use]
    pub fn compose(&self, base: &Config) -> Config {
        let prompts: Vec<(ActionName, PromptTemplate)> = if self.prompts.is_empty() {
            base.actions
                .iter()
                .map(|entry| (entry.name().clone(), entry.prompt().clone()))
                .collect()
        } else {
            self.prompts.clone()
        };

        let mut actions = ActionTable::new();
        for (name, prompt) in prompts {
            let show_diff = self
                .diffs
                .iter()
                .find(|(diff_name, _)| *diff_name == name)
                .map(|(_, show)| *show)
                .or_else(|| base.actions.get(&name).map(ActionEntry::show_diff))
                .unwrap_or(false);
            // Names are unique per section, so insert cannot collide.
            let _ = actions.insert(ActionEntry::new(name, prompt, show_diff));
        }

        for (name, _) in &self.diffs {
            if !actions.contains(name) {
                tracing::warn!(action = %name, "Dropping diff setting for action without a prompt");
            }
        }

        Config {
            llm: LlmSettings {
                action: self
                    .action
                    .clone()
                    .unwrap_or_else(|| base.llm.action.clone()),
                model: self.model.clone().unwrap_or_else(|| base.llm.model.clone()),
                max_length: self.max_length.unwrap_or(base.llm.max_length),
            },
            ui: UiSettings {
                show_spinner: self.show_spinner.unwrap_or(base.ui.show_spinner),
            },
            actions,
        }
    }

    /// Build a config from this layer alone; every scalar field must be set.
    pub fn complete(&self) -> Result<Config, ParseReason> {
        let action = self
            .action
            .clone()
            .ok_or(ParseReason::Incomplete("LLM.action"))?;
        let model = self
            .model
            .clone()
            .ok_or(ParseReason::Incomplete("LLM.model"))?;
        let max_length = self.max_length.unwrap_or_default();
        let show_spinner = self
            .show_spinner
            .ok_or(ParseReason::Incomplete("UI.show_spinner"))?;

        let base = Config {
            llm: LlmSettings {
                action,
                model,
                max_length,
            },
            ui: UiSettings { show_spinner },
            actions: ActionTable::new(),
        };
        Ok(self.compose(&base))
    }
}
