//! Completed-run result contracts.
//!
//! These mirror what the benchmark backend returns from `GET /results/{run_id}`.
//! Everything here is produced by the backend and treated as immutable once
//! it is attached to a completed run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Score per cutoff `k`. JSON object keys arrive as strings (`"5"`).
pub type KMap = BTreeMap<u32, f64>;

/// Information-retrieval metrics computed by the backend for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IrMetrics {
    pub mrr: f64,
    pub map_score: f64,
    #[serde(default)]
    pub precision_at_k: KMap,
    #[serde(default)]
    pub recall_at_k: KMap,
    #[serde(default)]
    pub ndcg_at_k: KMap,
    #[serde(default)]
    pub hit_rate_at_k: KMap,
}

impl IrMetrics {
    /// Value at cutoff `k`, 0 when the backend did not compute it.
    pub fn at(map: &KMap, k: u32) -> f64 {
        map.get(&k).copied().unwrap_or(0.0)
    }
}

/// Latency, throughput and cost measurements for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceMetrics {
    pub embedding_latency_avg_ms: f64,
    #[serde(default)]
    pub embedding_latency_p50_ms: f64,
    pub embedding_latency_p95_ms: f64,
    #[serde(default)]
    pub embedding_latency_p99_ms: f64,
    pub query_latency_avg_ms: f64,
    pub throughput_docs_per_sec: f64,
    #[serde(default)]
    pub total_embedding_time_sec: f64,
    pub embedding_dimension: u32,
    pub memory_usage_mb: f64,
    pub api_cost_usd: f64,
    #[serde(default)]
    pub cost_per_1k_queries_usd: f64,
}

/// One retrieved document with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RetrievedDoc {
    pub doc_id: String,
    pub score: f64,
}

/// Retrieval output of one model for one dataset query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    #[serde(rename = "query", alias = "query_text")]
    pub query_text: String,
    #[serde(default)]
    pub relevant: BTreeSet<String>,
    /// Sorted descending by score.
    #[serde(default)]
    pub retrieved: Vec<RetrievedDoc>,
}

impl QueryResult {
    /// Doc ids of the first `n` retrieved entries, by position.
    pub fn top_ids(&self, n: usize) -> Vec<String> {
        self.retrieved
            .iter()
            .take(n)
            .map(|hit| hit.doc_id.clone())
            .collect()
    }
}

/// Full result for one model of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelResult {
    pub model_id: String,
    pub ir_metrics: IrMetrics,
    pub performance: PerformanceMetrics,
    /// Same length and query order for every model of a run.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub per_query_results: Vec<QueryResult>,
}

/// Body of `GET /results/{run_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunResults {
    pub run_id: String,
    pub dataset_id: String,
    pub model_results: Vec<ModelResult>,
    #[serde(default)]
    pub top_k_values: Vec<u32>,
    #[serde(default = "default_similarity")]
    pub similarity_metric: String,
}

fn default_similarity() -> String {
    "cosine".to_string()
}

// The backend sends `null` for runs that skipped per-query capture.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<QueryResult>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Vec<QueryResult>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
