use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "CHECKR_CONFIG";
const DEFAULTS_ENV: &str = "CHECKR_DEFAULTS";

const ACTIVE_FILE: &str = "checkr.ini";
const DEFAULTS_FILE: &str = "checkr_defaults.ini";

/// `~/.checkr`, or `None` when the home directory cannot be determined.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".checkr"))
}

/// Locations of the two settings files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub active: PathBuf,
    pub defaults: PathBuf,
}

impl ConfigPaths {
    /// Both files inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            active: dir.join(ACTIVE_FILE),
            defaults: dir.join(DEFAULTS_FILE),
        }
    }

    /// Resolve paths from `CHECKR_CONFIG` / `CHECKR_DEFAULTS`, falling back to
    /// `~/.checkr` and then to `./.checkr` when there is no home directory.
    #[must_use]
    pub fn discover() -> Self {
        let dir = config_dir().unwrap_or_else(|| {
            tracing::warn!("Home directory unavailable; using ./.checkr for settings");
            PathBuf::from(".checkr")
        });
        let mut paths = Self::in_dir(dir);

        if let Some(active) = env_path(CONFIG_ENV) {
            paths.active = active;
        }
        if let Some(defaults) = env_path(DEFAULTS_ENV) {
            paths.defaults = defaults;
        }
        paths
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
