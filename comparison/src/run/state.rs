//! Run state machine: legal transitions, progress monotonicity, and a
//! transition log.
//!
//! Every snapshot the controller receives goes through [`RunStateMachine::observe`]
//! before it is accepted. A snapshot that moves the run backwards, either in
//! status or in its progress counters, is a protocol violation.
//!
//! ```text
//! Queued  → Running | Completed | Failed | Cancelled
//! Running → Completed | Failed | Cancelled
//! ```
//!
//! Same-state observations (`Running → Running`) only update progress and
//! are not recorded as transitions.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::run::types::{RunProgress, RunStatus};

fn is_legal_transition(from: RunStatus, to: RunStatus) -> bool {
    use RunStatus::*;

    if from.is_terminal() {
        return false;
    }

    matches!(
        (from, to),
        (Queued, Running)
            // Short runs can finish between two polls.
            | (Queued, Completed)
            | (Queued, Failed)
            | (Queued, Cancelled)
            | (Running, Completed)
            | (Running, Failed)
            | (Running, Cancelled)
    )
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: RunStatus,
    pub to: RunStatus,
    /// Milliseconds since the run was started.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: RunStatus,
    pub to: RunStatus,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal status transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Why an incoming snapshot was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Transition(IllegalTransition),
    ModelsCompletedDecreased { previous: u32, reported: u32 },
    DocumentsEmbeddedDecreased { previous: u64, reported: u64 },
    ModelsCompletedExceedsTotal { reported: u32, total: u32 },
    TotalModelsMismatch { reported: u32, selected: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transition(t) => write!(f, "{t}"),
            Self::ModelsCompletedDecreased { previous, reported } => write!(
                f,
                "models_completed decreased from {previous} to {reported}"
            ),
            Self::DocumentsEmbeddedDecreased { previous, reported } => write!(
                f,
                "documents_embedded decreased from {previous} to {reported}"
            ),
            Self::ModelsCompletedExceedsTotal { reported, total } => write!(
                f,
                "models_completed {reported} exceeds {total} selected models"
            ),
            Self::TotalModelsMismatch { reported, selected } => write!(
                f,
                "total_models {reported} does not match {selected} selected models"
            ),
        }
    }
}

/// Progress counters must never move backwards within one run.
///
/// `documents_embedded` counts the documents of the model being embedded
/// and restarts when that model finishes, so it may only drop in a snapshot
/// where `models_completed` has advanced. A reported `total_models` of 0 means
/// the backend did not fill it in; any other value must equal the selection.
pub fn check_progress(
    previous: &RunProgress,
    next: &RunProgress,
    total_models: u32,
) -> Result<(), Violation> {
    if next.total_models != 0 && next.total_models != total_models {
        return Err(Violation::TotalModelsMismatch {
            reported: next.total_models,
            selected: total_models,
        });
    }
    if next.models_completed < previous.models_completed {
        return Err(Violation::ModelsCompletedDecreased {
            previous: previous.models_completed,
            reported: next.models_completed,
        });
    }
    if next.models_completed == previous.models_completed
        && next.documents_embedded < previous.documents_embedded
    {
        return Err(Violation::DocumentsEmbeddedDecreased {
            previous: previous.documents_embedded,
            reported: next.documents_embedded,
        });
    }
    if next.models_completed > total_models {
        return Err(Violation::ModelsCompletedExceedsTotal {
            reported: next.models_completed,
            total: total_models,
        });
    }
    Ok(())
}

/// Tracks the current status of one run and its transition history.
#[derive(Debug)]
pub struct RunStateMachine {
    current: RunStatus,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl RunStateMachine {
    /// Create a new state machine starting at `Queued`.
    pub fn new() -> Self {
        Self {
            current: RunStatus::Queued,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> RunStatus {
        self.current
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Move to `to`. Staying in the same non-terminal state is a no-op.
    pub fn advance(&mut self, to: RunStatus, reason: Option<&str>) -> Result<(), IllegalTransition> {
        if to == self.current && !self.current.is_terminal() {
            return Ok(());
        }
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(from = %self.current, to = %to, "Run status transition");

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    /// Transition to `Failed` from any non-terminal state.
    pub fn fail(&mut self, reason: &str) -> Result<(), IllegalTransition> {
        self.advance(RunStatus::Failed, Some(reason))
    }

    /// Validate an incoming snapshot against the current state and progress,
    /// then apply its status.
    pub fn observe(
        &mut self,
        previous: &RunProgress,
        status: RunStatus,
        next: &RunProgress,
        total_models: u32,
    ) -> Result<(), Violation> {
        if status != self.current && !is_legal_transition(self.current, status) {
            return Err(Violation::Transition(IllegalTransition {
                from: self.current,
                to: status,
            }));
        }
        check_progress(previous, next, total_models)?;
        self.advance(status, None).map_err(Violation::Transition)
    }

    /// Status history as a short string, e.g. `Queued → Running → Completed`.
    pub fn summary(&self) -> String {
        let mut states = vec![RunStatus::Queued.to_string()];
        states.extend(self.transitions.iter().map(|t| t.to.to_string()));
        format!(
            "{} ({}ms, {} transitions)",
            states.join(" → "),
            self.created_at.elapsed().as_millis(),
            self.transitions.len()
        )
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
