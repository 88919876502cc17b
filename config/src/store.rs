//! The two configuration layers and their persistence.
//!
//! `Defaults` is read once at open and never written. `Active` is the user's
//! state: it starts as the active file composed over `Defaults`, is changed
//! only through the setters here, and is written back with
//! [`ConfigStore::persist`]. Every failure leaves the in-memory `Active`
//! exactly as it was.

use std::fs;
use std::io;
use std::path::Path;

use checkr_types::{
    ActionEntry, ActionName, Config, FieldKey, FieldKeyError, PromptTemplate, SetFieldError,
};
use checkr_utils::{AtomicWriteOptions, PersistMode, atomic_write_with_options, recover_bak_file};
use tracing::{debug, info, warn};

use crate::SHIPPED_DEFAULTS;
use crate::error::ConfigError;
use crate::document::IniDocument;
use crate::layer::ConfigLayer;
use crate::paths::ConfigPaths;
use crate::resolver::UnknownAction;

const SHIPPED_DEFAULTS_PATH: &str = "<built-in defaults>";

/// Which settings file an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Active,
    Defaults,
}

/// Result of [`ConfigStore::open`].
///
/// Malformed files do not prevent the store from opening; the errors they
/// produced are kept here so the caller can show them.
#[derive(Debug)]
pub struct OpenedStore {
    pub store: ConfigStore,
    pub recovered: Vec<ConfigError>,
}

#[derive(Debug)]
pub struct ConfigStore {
    paths: ConfigPaths,
    defaults: Config,
    active: Config,
    dirty: bool,
}

/// The defaults compiled into the binary.
pub fn shipped_defaults() -> Result<Config, ConfigError> {
    let path = Path::new(SHIPPED_DEFAULTS_PATH);
    parse_layer(path, SHIPPED_DEFAULTS)?
        .complete()
        .map_err(|reason| ConfigError::parse(path, reason))
}

fn parse_layer(path: &Path, text: &str) -> Result<ConfigLayer, ConfigError> {
    let doc = IniDocument::parse(text).map_err(|err| ConfigError::parse(path, err))?;
    ConfigLayer::from_document(&doc).map_err(|reason| ConfigError::parse(path, reason))
}

/// Read one settings file. A missing file is an empty layer.
fn read_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Settings file not found");
            return Ok(ConfigLayer::default());
        }
        Err(source) => {
            warn!(path = %path.display(), "Failed to read settings: {source}");
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    parse_layer(path, &text).inspect_err(|err| {
        warn!("Failed to parse settings: {err}");
    })
}

impl ConfigStore {
    /// Load both layers.
    ///
    /// A malformed defaults file falls back to the built-in defaults, and a
    /// malformed active file falls back to `Defaults`. Only the built-in
    /// defaults failing to parse is an error.
    pub fn open(paths: ConfigPaths) -> Result<OpenedStore, ConfigError> {
        recover_bak_file(&paths.active);

        let shipped = shipped_defaults()?;
        let mut recovered = Vec::new();

        let defaults = match read_layer(&paths.defaults) {
            Ok(layer) => layer.compose(&shipped),
            Err(err) => {
                recovered.push(err);
                shipped
            }
        };

        let active = match read_layer(&paths.active) {
            Ok(layer) => layer.compose(&defaults),
            Err(err) => {
                recovered.push(err);
                defaults.clone()
            }
        };

        info!(
            path = %paths.active.display(),
            action = %active.llm.action,
            model = %active.llm.model,
            actions = active.actions.len(),
            "Loaded settings"
        );

        Ok(OpenedStore {
            store: Self {
                paths,
                defaults,
                active,
                dirty: false,
            },
            recovered,
        })
    }

    /// Parse one settings file on its own, without composing it.
    pub fn load(&self, layer: Layer) -> Result<ConfigLayer, ConfigError> {
        let path = match layer {
            Layer::Active => &self.paths.active,
            Layer::Defaults => &self.paths.defaults,
        };
        read_layer(path)
    }

    #[must_use]
    pub fn active(&self) -> &Config {
        &self.active
    }

    #[must_use]
    pub fn defaults(&self) -> &Config {
        &self.defaults
    }

    #[must_use]
    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Validate and store one field of `Active`.
    pub fn set_field(&mut self, field: &FieldKey, value: &str) -> Result<(), ConfigError> {
        self.active
            .set_field(field, value)
            .map_err(|err| match err {
                SetFieldError::InvalidValue { field, source } => {
                    ConfigError::InvalidField { field, source }
                }
                SetFieldError::UnknownAction(name) => {
                    ConfigError::UnknownAction(UnknownAction(name.to_string()))
                }
            })?;
        debug!(%field, "Updated setting");
        self.mark_dirty();
        Ok(())
    }

    /// [`ConfigStore::set_field`] addressed by section and key as they
    /// appear in the settings file.
    pub fn set_field_str(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let field = FieldKey::parse(section, key)?;
        self.set_field(&field, value)
    }

    /// Add an action with its prompt and diff flag.
    pub fn add_action(
        &mut self,
        name: &str,
        prompt: &str,
        show_diff: bool,
    ) -> Result<(), ConfigError> {
        let name = ActionName::parse(name).map_err(FieldKeyError::InvalidActionName)?;
        let prompt = PromptTemplate::new(prompt).map_err(|source| ConfigError::InvalidField {
            field: FieldKey::Prompt(name.clone()),
            source,
        })?;
        self.active
            .actions
            .insert(ActionEntry::new(name.clone(), prompt, show_diff))?;
        debug!(action = %name, "Added action");
        self.mark_dirty();
        Ok(())
    }

    /// Remove an action. The selected action cannot be removed.
    pub fn remove_action(&mut self, name: &str) -> Result<(), ConfigError> {
        let name = ActionName::parse(name)
            .map_err(|_| UnknownAction(name.trim().to_string()))?;
        if name == self.active.llm.action {
            return Err(ConfigError::ActionInUse(name.to_string()));
        }
        self.active.actions.remove(&name)?;
        debug!(action = %name, "Removed action");
        self.mark_dirty();
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the whole of `Active` to the active file.
    ///
    /// On failure the previous file is left in place and the store stays
    /// dirty.
    pub fn persist(&mut self) -> Result<(), ConfigError> {
        let path = &self.paths.active;
        let persist_error = |source| ConfigError::Persist {
            path: path.clone(),
            source,
        };

        let text = ConfigLayer::from_config(&self.active)
            .to_document()
            .render()
            .map_err(persist_error)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(persist_error)?;
        }

        let options = AtomicWriteOptions {
            mode: PersistMode::of_existing(path),
            ..AtomicWriteOptions::default()
        };
        atomic_write_with_options(path, text.as_bytes(), options).map_err(|source| {
            warn!(path = %path.display(), "Failed to persist settings: {source}");
            persist_error(source)
        })?;

        debug!(path = %path.display(), "Persisted settings");
        self.dirty = false;
        Ok(())
    }

    /// Replace `Active` with a copy of `Defaults` and persist it.
    pub fn restore_defaults(&mut self) -> Result<&Config, ConfigError> {
        self.active = self.defaults.clone();
        self.mark_dirty();
        self.persist()?;
        info!("Restored default settings");
        Ok(&self.active)
    }

    /// Re-read the active file. On error the current `Active` is kept.
    pub fn reload(&mut self) -> Result<&Config, ConfigError> {
        let layer = read_layer(&self.paths.active)?;
        self.active = layer.compose(&self.defaults);
        self.dirty = false;
        Ok(&self.active)
    }
}
