//! Core engine for Checkr.
//!
//! This crate ties settings, generation and diffing together behind a
//! [`Session`], without any terminal or UI dependencies.

mod commands;
mod gate;
mod session;

pub use commands::{Command, CommandSpec, Input, SetArgs, command_specs};
pub use gate::{
    Decision, GatePhase, GenerationTicket, ProcessingState, RegenerationGate, SkipReason,
};
pub use session::{Notice, Outcome, Session, View};

// Re-export from crates for public API
pub use checkr_config::{
    ActionPromptResolver, ConfigError, ConfigLayer, ConfigPaths, ConfigStore, OpenedStore,
    ResolvedAction, UnknownAction, config_dir,
};
pub use checkr_providers::{self, GenerationError, GenerationRequest, Generator, OllamaGenerator};
pub use checkr_types::{ActionName, Config, Segment};
