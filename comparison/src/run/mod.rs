//! Benchmark run lifecycle: data contracts, state machine and controller.

pub mod controller;
pub mod error;
pub mod state;
pub mod types;

pub use controller::RunController;
pub use error::{RunError, RunResult, StructuredError};
pub use state::{check_progress, IllegalTransition, RunStateMachine, TransitionRecord, Violation};
pub use types::{
    BenchmarkRun, CancelMode, CancelOutcome, FailureKind, MetricConfig, RunFailure, RunHandle,
    RunProgress, RunSnapshot, RunStatus, SimilarityMetric, StartAck, StartRequest,
    StatusSnapshot, MAX_MODELS_PER_RUN,
};
