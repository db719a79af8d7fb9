//! Boundary to the external benchmark backend.
//!
//! The backend owns datasets, embedding, indexing and metric computation.
//! The core only needs five calls from it; each is a single round trip bounded by the
//! timeout the caller configured on the implementation.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::cost::DatasetShape;
use crate::results::RunResults;
use crate::run::types::{StartAck, StartRequest, StatusSnapshot};

pub use http::HttpBenchmarkService;

/// Failure of a single service call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The backend answered but refused or could not serve the request.
    #[error("service rejected request: {message}")]
    Rejected { status: Option<u16>, message: String },

    /// The request never completed (connect failure, timeout, broken body).
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Calls the run lifecycle controller makes against the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BenchmarkService: Send + Sync {
    /// Submit a new run. The backend assigns the run id.
    async fn start(&self, request: &StartRequest) -> Result<StartAck, ServiceError>;

    /// Latest progress snapshot of a run.
    async fn status(&self, run_id: &str) -> Result<StatusSnapshot, ServiceError>;

    /// Ask the backend to stop a run. Only receipt is acknowledged.
    async fn cancel(&self, run_id: &str) -> Result<(), ServiceError>;

    /// Per-model results of a completed run.
    async fn results(&self, run_id: &str) -> Result<RunResults, ServiceError>;

    /// Size and shape of a dataset the backend knows.
    async fn dataset(&self, dataset_id: &str) -> Result<DatasetShape, ServiceError>;
}
