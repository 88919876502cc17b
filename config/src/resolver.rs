//! Action lookup over the active configuration.

use checkr_types::{ActionName, Config, PromptTemplate};
use thiserror::Error;

/// Lookup of an action that is not in `PROMPTS`.
///
/// Only a stale selection can produce this, so callers treat it as "do
/// nothing" rather than as a failure to report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub name: ActionName,
    pub prompt_template: PromptTemplate,
    pub show_diff: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionPromptResolver<'a> {
    config: &'a Config,
}

impl<'a> ActionPromptResolver<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Resolve `action_name` case-insensitively.
    pub fn resolve(&self, action_name: &str) -> Result<ResolvedAction, UnknownAction> {
        let unknown = || UnknownAction(action_name.trim().to_string());
        let name = ActionName::parse(action_name).map_err(|_| unknown())?;
        let entry = self.config.actions.get(&name).ok_or_else(unknown)?;
        Ok(ResolvedAction {
            name,
            prompt_template: entry.prompt().clone(),
            show_diff: entry.show_diff(),
        })
    }

    /// Resolve the action currently selected in `LLM.action`.
    pub fn selected(&self) -> Result<ResolvedAction, UnknownAction> {
        self.resolve(self.config.llm.action.as_str())
    }

    /// Action names in settings-file order.
    #[must_use]
    pub fn list_actions(&self) -> Vec<&'a ActionName> {
        self.config.actions.names().collect()
    }
}
