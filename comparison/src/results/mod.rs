//! Completed-run results and the pure analyses over them.

pub mod agreement;
pub mod ranking;
pub mod report;
pub mod types;

pub use agreement::{
    classify, filter, summarize, view, AgreementCounts, AgreementView, Classification, ModelHit,
    QueryAgreementRecord, AGREEMENT_CUTOFF,
};
pub use ranking::{rank, FeatureVector, MetricKey, RankedModel, Ranking, WeightProfile};
pub use report::{report_schema, ExportReport, ModelSummary, ReportFormat};
pub use types::{
    IrMetrics, KMap, ModelResult, PerformanceMetrics, QueryResult, RetrievedDoc, RunResults,
};
