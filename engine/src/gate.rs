//! Regeneration gate.
//!
//! Decides, for every observed input, whether the generator has to run.
//! The gate is a plain state machine with no IO: it is told what the user
//! typed and what the generation produced, and answers with a [`Decision`].
//!
//! ```text
//!            observe(x), x new           complete / fail
//!   Idle  ───────────────────────▶ Processing ───────────────▶ Idle
//!    │ ▲                              │
//!    └─┘ x blank or x == last_input   └─ observe(y): y queued
//! ```
//!
//! Only the immediately preceding successful input is remembered, so
//! `x, y, x` generates three times while `x, x` generates once.

use std::mem;

/// Input and output of the last successful generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingState {
    last_input: String,
    last_output: String,
}

impl ProcessingState {
    #[must_use]
    pub fn last_input(&self) -> &str {
        &self.last_input
    }

    #[must_use]
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    #[must_use]
    pub fn has_output(&self) -> bool {
        !self.last_output.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty or whitespace-only input.
    Blank,
    /// Same input as the last successful generation.
    AlreadyProcessed,
    /// A generation is in flight; the input is kept for re-evaluation.
    Queued,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Generate(GenerationTicket),
    Skip(SkipReason),
}

/// Admission of one generation, handed back to [`RegenerationGate::complete`]
/// or [`RegenerationGate::fail`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be completed or failed, or the gate stays in Processing"]
pub struct GenerationTicket {
    id: u64,
    input: String,
}

impl GenerationTicket {
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

#[derive(Debug, Default)]
pub struct RegenerationGate {
    state: ProcessingState,
    in_flight: Option<u64>,
    queued: Option<String>,
    next_id: u64,
}

impl RegenerationGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> GatePhase {
        if self.in_flight.is_some() {
            GatePhase::Processing
        } else {
            GatePhase::Idle
        }
    }

    #[must_use]
    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// Newest input observed while a generation was in flight.
    #[must_use]
    pub fn queued(&self) -> Option<&str> {
        self.queued.as_deref()
    }

    pub fn observe(&mut self, input: &str) -> Decision {
        if input.trim().is_empty() {
            tracing::debug!("Gate: blank input");
            return Decision::Skip(SkipReason::Blank);
        }

        if self.in_flight.is_some() {
            tracing::debug!("Gate: generation in flight, queueing input");
            self.queued = Some(input.to_string());
            return Decision::Skip(SkipReason::Queued);
        }

        if input == self.state.last_input {
            tracing::debug!("Gate: input already processed");
            return Decision::Skip(SkipReason::AlreadyProcessed);
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.in_flight = Some(id);
        tracing::debug!(ticket = id, "Gate: admitting generation");
        Decision::Generate(GenerationTicket {
            id,
            input: input.to_string(),
        })
    }

    /// Record a successful generation and return to `Idle`.
    ///
    /// Returns the input queued while the generation ran, which the caller
    /// should observe next.
    pub fn complete(&mut self, ticket: GenerationTicket, output: String) -> Option<String> {
        if !self.release(&ticket) {
            return None;
        }
        self.state = ProcessingState {
            last_input: ticket.input,
            last_output: output,
        };
        self.queued.take()
    }

    /// Return to `Idle` after a failed generation.
    ///
    /// `last_input` is left as it was, so the same input is generated again
    /// the next time it is observed.
    pub fn fail(&mut self, ticket: GenerationTicket) -> Option<String> {
        if !self.release(&ticket) {
            return None;
        }
        self.queued.take()
    }

    fn release(&mut self, ticket: &GenerationTicket) -> bool {
        if self.in_flight != Some(ticket.id) {
            tracing::warn!(ticket = ticket.id, "Gate: ignoring stale ticket");
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Forget the last generation. The next non-blank input generates.
    pub fn reset(&mut self) -> ProcessingState {
        mem::take(&mut self.state)
    }
}
