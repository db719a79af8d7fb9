//! Run lifecycle data contracts.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Most models the backend accepts in one run.
pub const MAX_MODELS_PER_RUN: usize = 6;

/// Observable state of a benchmark run.
///
/// The backend calls the initial state `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[serde(rename = "pending", alias = "queued")]
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Whether this is a terminal state (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "Queued"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Vector similarity used by the backend's index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    DotProduct,
    Euclidean,
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::DotProduct => write!(f, "dot_product"),
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl std::str::FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot_product" | "dot" => Ok(Self::DotProduct),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            other => Err(format!("unknown similarity metric: {other}")),
        }
    }
}

/// Metric settings forwarded to the backend at start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricConfig {
    pub top_k_values: Vec<u32>,
    pub similarity_metric: SimilarityMetric,
    pub normalize_embeddings: bool,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            top_k_values: vec![1, 3, 5, 10, 20],
            similarity_metric: SimilarityMetric::Cosine,
            normalize_embeddings: true,
        }
    }
}

/// Body of `POST /benchmark/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    pub dataset_id: String,
    pub model_ids: Vec<String>,
    pub top_k_values: Vec<u32>,
    pub similarity_metric: SimilarityMetric,
    pub normalize_embeddings: bool,
}

impl StartRequest {
    pub fn new(dataset_id: &str, model_ids: &[String], config: &MetricConfig) -> Self {
        Self {
            dataset_id: dataset_id.to_string(),
            model_ids: model_ids.to_vec(),
            top_k_values: config.top_k_values.clone(),
            similarity_metric: config.similarity_metric,
            normalize_embeddings: config.normalize_embeddings,
        }
    }
}

/// Response to a start request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartAck {
    pub run_id: String,
    #[serde(default)]
    pub status: Option<RunStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Progress counters reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RunProgress {
    pub models_completed: u32,
    pub total_models: u32,
    pub documents_embedded: u64,
    pub total_documents: u64,
    pub current_model: Option<String>,
    pub eta_seconds: Option<f64>,
    pub elapsed_seconds: f64,
    /// Restarts at zero for every model.
    pub queries_processed: u64,
    pub total_queries: u64,
}

impl RunProgress {
    /// Fraction of models finished, 0.0 to 1.0.
    pub fn model_fraction(&self) -> f64 {
        if self.total_models == 0 {
            0.0
        } else {
            f64::from(self.models_completed) / f64::from(self.total_models)
        }
    }

    /// Fraction of the current model's documents embedded, 0.0 to 1.0.
    pub fn document_fraction(&self) -> f64 {
        if self.total_documents == 0 {
            0.0
        } else {
            (self.documents_embedded as f64 / self.total_documents as f64).min(1.0)
        }
    }
}

/// Body of `GET /benchmark/status/{run_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub run_id: String,
    pub status: RunStatus,
    #[serde(flatten)]
    pub progress: RunProgress,
    #[serde(default)]
    pub error: Option<String>,
}

/// Why a run ended locally in a non-successful state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend reported the run as failed.
    Remote,
    /// Observed snapshots broke the lifecycle rules and cannot be trusted.
    ProtocolViolation,
    /// Cancelled and abandoned locally without waiting for the backend.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Local view of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BenchmarkRun {
    pub run_id: String,
    pub dataset_id: String,
    pub status: RunStatus,
    /// Selection order; the canonical model index everywhere downstream.
    pub selected_models: Vec<String>,
    pub metric_config: MetricConfig,
    pub progress: RunProgress,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// A cancel was sent and the caller is waiting for the backend.
    #[serde(default)]
    pub cancel_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
}

impl BenchmarkRun {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Index of a model in selection order.
    pub fn model_index(&self, model_id: &str) -> Option<usize> {
        self.selected_models.iter().position(|m| m == model_id)
    }
}

/// Returned by `start`: the optimistic local state of the new run.
pub type RunHandle = BenchmarkRun;

/// Returned by `poll`: the latest known state.
pub type RunSnapshot = BenchmarkRun;

/// How a cancel request treats the local run slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelMode {
    /// Ask the backend to stop; keep polling until a terminal state is seen.
    Wait,
    /// Ask the backend to stop and abandon the run locally right away.
    Forget,
}

/// What a cancel call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Cancel was acknowledged; the run is still tracked.
    Requested,
    /// The run was dropped locally and the slot is free.
    Abandoned,
    /// Nothing to cancel; the run had already ended in this state.
    AlreadyTerminal(RunStatus),
}
