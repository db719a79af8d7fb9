//! Embedding Model Comparison Core
//!
//! This library provides:
//! - A run lifecycle controller that starts, polls and cancels benchmark runs
//!   on an external benchmark backend and validates every snapshot it receives
//! - A ranking engine that turns per-model metrics into a weighted 0-100 score
//! - A query agreement classifier that finds the queries models agree or
//!   disagree on
//! - A pre-run cost estimate and a catalog of known embedding models
//! - JSON and Markdown export of a completed comparison
//!
//! The controller never sleeps or retries: the caller owns the polling
//! cadence. Ranking and classification are pure functions over fetched
//! results.
//!
//! # Usage
//!
//! ```no_run
//! use comparison::config::ServiceConfig;
//! use comparison::run::{MetricConfig, RunController};
//! use comparison::service::HttpBenchmarkService;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HttpBenchmarkService::new(&ServiceConfig::default())?;
//! let mut controller = RunController::new(service);
//! let models = vec!["local/all-MiniLM-L6-v2".to_string()];
//! let handle = controller.start("scifact", &models, MetricConfig::default()).await?;
//! let snapshot = controller.poll(&handle.run_id).await?;
//! println!("{} {:.0}%", snapshot.status, snapshot.progress.model_fraction() * 100.0);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod catalog;
pub mod config;
pub mod cost;
pub mod results;
pub mod run;
pub mod service;

pub use catalog::{ModelCatalog, ModelInfo, Provider};
pub use config::{ConfigError, FileConfig, ServiceConfig};
pub use cost::{estimate_cost, CostEstimate, DatasetShape, ModelPricing};
pub use results::{
    classify, filter, rank, summarize, Classification, ExportReport, QueryAgreementRecord,
    Ranking, ReportFormat, RunResults, WeightProfile,
};
pub use run::{
    BenchmarkRun, CancelMode, CancelOutcome, MetricConfig, RunController, RunError, RunResult,
    RunStatus,
};
pub use service::{BenchmarkService, HttpBenchmarkService, ServiceError};
