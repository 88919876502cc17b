//! Settings for Checkr.
//!
//! Two files of the same shape are involved: the defaults file and the
//! active (user) file. [`ConfigStore`] loads both, composes the active file
//! over the defaults field by field, and writes the active file back
//! atomically. [`ActionPromptResolver`] answers which prompt and diff flag
//! belong to an action.

pub mod document;
mod error;
mod layer;
mod paths;
mod resolver;
mod store;

pub use error::{ConfigError, ParseReason};
pub use layer::ConfigLayer;
pub use paths::{ConfigPaths, config_dir};
pub use resolver::{ActionPromptResolver, ResolvedAction, UnknownAction};
pub use store::{ConfigStore, Layer, OpenedStore, shipped_defaults};

/// Defaults compiled into the binary, used when no defaults file exists.
pub const SHIPPED_DEFAULTS: &str = include_str!("../assets/checkr_defaults.ini");
