//! Per-session context.
//!
//! A [`Session`] owns everything one user's session needs: the settings
//! store, the regeneration gate and the generator. Nothing is shared
//! between sessions except the settings file on disk.

use std::fmt;

use checkr_config::{
    ActionPromptResolver, ConfigError, ConfigStore, ResolvedAction, UnknownAction,
};
use checkr_providers::{GenerationError, GenerationRequest, Generator};
use checkr_types::{ActionName, Config, FieldKey, Segment};
use checkr_utils::{annotate_revision, word_change_stats};
use tracing::{debug, info, warn};

use crate::gate::{Decision, ProcessingState, RegenerationGate, SkipReason};

/// A message for the user. The session stays usable after any notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Settings(String),
    Generation(GenerationError),
}

impl From<&ConfigError> for Notice {
    fn from(err: &ConfigError) -> Self {
        Self::Settings(err.to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(message) => write!(f, "Settings: {message}"),
            Self::Generation(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// New output is available through [`Session::view`].
    Generated,
    Skipped(SkipReason),
    /// The selected action is not configured; nothing was attempted.
    NoOp(UnknownAction),
    Failed(Notice),
}

/// What the output area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Empty,
    Plain(String),
    Diff(Vec<Segment>),
    Error(String),
}

pub struct Session<G> {
    store: ConfigStore,
    gate: RegenerationGate,
    generator: G,
    last_error: Option<String>,
}

impl<G: Generator> Session<G> {
    pub fn new(store: ConfigStore, generator: G) -> Self {
        Self {
            store,
            gate: RegenerationGate::new(),
            generator,
            last_error: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        self.store.active()
    }

    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }

    #[must_use]
    pub fn processing(&self) -> &ProcessingState {
        self.gate.state()
    }

    #[must_use]
    pub fn list_actions(&self) -> Vec<&ActionName> {
        ActionPromptResolver::new(self.store.active()).list_actions()
    }

    /// The selected action, or `None` when the selection is stale.
    #[must_use]
    pub fn selected_action(&self) -> Option<ResolvedAction> {
        ActionPromptResolver::new(self.store.active())
            .selected()
            .ok()
    }

    /// Rewrite `input` with the selected action, unless the gate says the
    /// work has already been done.
    pub async fn submit(&mut self, input: &str) -> Outcome {
        let mut pending = input.to_string();
        let mut last = None;

        loop {
            let resolved = match ActionPromptResolver::new(self.store.active()).selected() {
                Ok(resolved) => resolved,
                Err(err) => {
                    debug!("Skipping generation: {err}");
                    return last.unwrap_or(Outcome::NoOp(err));
                }
            };

            let ticket = match self.gate.observe(&pending) {
                Decision::Generate(ticket) => ticket,
                Decision::Skip(reason) => return last.unwrap_or(Outcome::Skipped(reason)),
            };

            let config = self.store.active();
            let request = GenerationRequest {
                model: config.llm.model.clone(),
                prompt_template: resolved.prompt_template,
                input: ticket.input().to_string(),
                max_length: config.llm.max_length,
            };

            info!(
                action = %resolved.name,
                model = %request.model,
                "Generating"
            );

            let next = match self.generator.generate(&request).await {
                Ok(output) => {
                    info!(output_chars = output.chars().count(), "Generation finished");
                    self.last_error = None;
                    last = Some(Outcome::Generated);
                    self.gate.complete(ticket, output)
                }
                Err(err) => {
                    warn!("Generation failed: {err}");
                    self.last_error = Some(err.to_string());
                    last = Some(Outcome::Failed(Notice::Generation(err)));
                    self.gate.fail(ticket)
                }
            };

            match next {
                Some(queued) => pending = queued,
                None => return last.unwrap_or(Outcome::Skipped(SkipReason::AlreadyProcessed)),
            }
        }
    }

    /// The output area for the current state and the selected action's
    /// diff setting.
    #[must_use]
    pub fn view(&self) -> View {
        if let Some(message) = &self.last_error {
            return View::Error(message.clone());
        }

        let state = self.gate.state();
        if !state.has_output() {
            return View::Empty;
        }

        let show_diff = self.selected_action().is_some_and(|action| action.show_diff);
        if show_diff {
            View::Diff(annotate_revision(state.last_input(), state.last_output()))
        } else {
            View::Plain(state.last_output().to_string())
        }
    }

    /// Words added and removed by the last generation.
    #[must_use]
    pub fn change_stats(&self) -> Option<(u32, u32)> {
        let state = self.gate.state();
        state
            .has_output()
            .then(|| word_change_stats(state.last_input(), state.last_output()))
    }

    /// Select the action used for the next generation and persist it.
    ///
    /// Selecting does not regenerate: the gate only looks at the input text.
    pub fn select_action(&mut self, name: &str) -> Result<ResolvedAction, ConfigError> {
        let resolved = ActionPromptResolver::new(self.store.active()).resolve(name)?;
        self.store.set_field(&FieldKey::Action, resolved.name.as_str())?;
        self.store.persist()?;
        info!(action = %resolved.name, "Selected action");
        Ok(resolved)
    }

    pub fn update_setting(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        self.store.set_field_str(section, key, value)?;
        self.store.persist()
    }

    pub fn add_action(
        &mut self,
        name: &str,
        prompt: &str,
        show_diff: bool,
    ) -> Result<(), ConfigError> {
        self.store.add_action(name, prompt, show_diff)?;
        self.store.persist()
    }

    pub fn remove_action(&mut self, name: &str) -> Result<(), ConfigError> {
        self.store.remove_action(name)?;
        self.store.persist()
    }

    pub fn restore_defaults(&mut self) -> Result<&Config, ConfigError> {
        self.store.restore_defaults()
    }

    pub fn reload(&mut self) -> Result<&Config, ConfigError> {
        self.store.reload()
    }

    /// Drop the last result so the next input generates even if unchanged.
    pub fn clear(&mut self) {
        let _ = self.gate.reset();
        self.last_error = None;
    }
}
