use std::io;
use std::path::{Path, PathBuf};

use checkr_types::{ActionTableError, FieldKey, FieldKeyError, FieldValueError, Section};
use thiserror::Error;

use crate::document::IniError;
use crate::resolver::UnknownAction;

/// Why a settings file could not be turned into configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseReason {
    #[error(transparent)]
    Syntax(#[from] IniError),
    #[error(transparent)]
    Key(#[from] FieldKeyError),
    #[error("invalid value for {field}: {source}")]
    Value {
        field: String,
        #[source]
        source: FieldValueError,
    },
    #[error("section [{0}] appears twice")]
    DuplicateSection(Section),
    #[error("missing required setting {0}")]
    Incomplete(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        reason: ParseReason,
    },
    #[error("invalid value for {field}: {source}")]
    InvalidField {
        field: FieldKey,
        #[source]
        source: FieldValueError,
    },
    #[error(transparent)]
    UnknownField(#[from] FieldKeyError),
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),
    #[error("action '{0}' already exists")]
    DuplicateAction(String),
    #[error("action '{0}' is selected; select another action before removing it")]
    ActionInUse(String),
    #[error("failed to write {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    /// File the error refers to, for errors that come from disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Persist { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }

    pub(crate) fn parse(path: &Path, reason: impl Into<ParseReason>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl From<ActionTableError> for ConfigError {
    fn from(err: ActionTableError) -> Self {
        match err {
            ActionTableError::Duplicate(name) => Self::DuplicateAction(name.to_string()),
            ActionTableError::Missing(name) => Self::UnknownAction(UnknownAction(name.to_string())),
        }
    }
}
