//! Core domain types for Checkr.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod segment;
mod settings;

pub use segment::{Segment, reconstruct};
pub use settings::{
    ActionEntry, ActionName, ActionTable, ActionTableError, Config, DEFAULT_MAX_LENGTH, FieldKey,
    FieldKeyError, FieldValueError, LlmSettings, MaxLength, ModelId, PromptTemplate, Section,
    SetFieldError, UiSettings, format_flag, parse_flag,
};
