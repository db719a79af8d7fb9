//! Run lifecycle error types
//!
//! Every lifecycle and transport failure is surfaced to the caller as a
//! [`RunError`]. Callers that need a machine-readable form (for a UI or an
//! API response) can convert it with [`RunError::to_structured`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::run::types::RunStatus;

/// Result type alias for run lifecycle operations
pub type RunResult<T> = Result<T, RunError>;

/// Machine-readable error with a recovery hint.
///
/// # Example
/// ```json
/// {
///   "code": "CONNECTION_LOST",
///   "message": "Connection lost during poll: operation timed out",
///   "recovery_action": "Keep polling; the remote run is unaffected",
///   "retryable": true,
///   "context": { "run_id": "ab12cd34" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code (e.g., "RUN_ALREADY_ACTIVE")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// What the caller should do next
    pub recovery_action: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// Whether repeating the same call may succeed
    #[serde(default)]
    pub retryable: bool,
}

impl StructuredError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        recovery_action: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            recovery_action: recovery_action.into(),
            context: HashMap::new(),
            retryable: false,
        }
    }

    pub fn with_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for StructuredError {}

/// Errors that can occur while driving a benchmark run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    /// Model selection cannot be started as given
    #[error("Invalid model selection: {reason}")]
    InvalidSelection { reason: String },

    /// The run slot already holds a run that has not finished
    #[error("Run {run_id} is still active; wait for it to finish or cancel it first")]
    RunAlreadyActive { run_id: String },

    /// The backend rejected the request or could not accept it
    #[error("Benchmark service unavailable during {operation}: {message}")]
    UpstreamUnavailable { operation: String, message: String },

    /// The request did not complete; the remote run is unaffected
    #[error("Connection lost during {operation}: {message}")]
    ConnectionLost { operation: String, message: String },

    /// A snapshot broke the lifecycle rules; the run is treated as failed
    #[error("Protocol violation on run {run_id}: {detail}")]
    ProtocolViolation { run_id: String, detail: String },

    /// The id does not match the run held by this controller
    #[error("Unknown run: {run_id}")]
    UnknownRun { run_id: String },

    /// Results exist only for completed runs
    #[error("Results unavailable for run {run_id} in state {status}")]
    ResultsUnavailable { run_id: String, status: RunStatus },
}

impl RunError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSelection { .. } => "INVALID_SELECTION",
            Self::RunAlreadyActive { .. } => "RUN_ALREADY_ACTIVE",
            Self::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            Self::ConnectionLost { .. } => "CONNECTION_LOST",
            Self::ProtocolViolation { .. } => "PROTOCOL_VIOLATION",
            Self::UnknownRun { .. } => "UNKNOWN_RUN",
            Self::ResultsUnavailable { .. } => "RESULTS_UNAVAILABLE",
        }
    }

    /// Whether the caller may repeat the call as-is. Nothing is retried
    /// internally.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::ConnectionLost { .. }
        )
    }

    pub fn to_structured(&self) -> StructuredError {
        let recovery = match self {
            Self::InvalidSelection { .. } => "Select between 1 and 6 distinct models",
            Self::RunAlreadyActive { .. } => "Wait for the active run to finish or cancel it",
            Self::UpstreamUnavailable { .. } => "Check the benchmark service and retry",
            Self::ConnectionLost { .. } => "Keep polling or abandon; the remote run is unaffected",
            Self::ProtocolViolation { .. } => "Discard this run and start a new one",
            Self::UnknownRun { .. } => "Use the run id returned by start",
            Self::ResultsUnavailable { .. } => "Poll until the run reports Completed",
        };

        let mut err = StructuredError::new(self.code(), self.to_string(), recovery);
        match self {
            Self::RunAlreadyActive { run_id }
            | Self::ProtocolViolation { run_id, .. }
            | Self::UnknownRun { run_id } => {
                err = err.with_context("run_id", run_id.clone());
            }
            Self::ResultsUnavailable { run_id, status } => {
                err = err
                    .with_context("run_id", run_id.clone())
                    .with_context("status", status.to_string());
            }
            Self::UpstreamUnavailable { operation, .. } | Self::ConnectionLost { operation, .. } => {
                err = err.with_context("operation", operation.clone());
            }
            Self::InvalidSelection { .. } => {}
        }
        if self.is_retryable() {
            err = err.retryable();
        }
        err
    }
}
