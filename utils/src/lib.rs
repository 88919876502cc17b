//! Shared infrastructure utilities for Checkr.
//!
//! This crate provides cross-cutting utilities that multiple Checkr crates need
//! but that don't belong in the domain-pure `checkr-types` crate:
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`diff`**: Word-level diff annotation and stats

pub mod atomic_write;
pub mod diff;

pub use atomic_write::{
    AtomicWriteOptions, FileSyncPolicy, ParentDirSyncPolicy, PersistMode,
    atomic_write_with_options, recover_bak_file,
};
pub use diff::{OpTag, Opcode, annotate_revision, tokenize, word_change_stats, word_opcodes};
