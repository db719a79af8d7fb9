//! Export of a completed run as a JSON document or a Markdown report.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::results::agreement::{summarize, AgreementCounts, QueryAgreementRecord};
use crate::results::ranking::Ranking;
use crate::results::types::{IrMetrics, PerformanceMetrics, RunResults};

/// Output format of an exported report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Markdown,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown report format: {other} (json|markdown)")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

/// Metrics of one model as they appear in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelSummary {
    pub model_id: String,
    pub ir_metrics: IrMetrics,
    pub performance: PerformanceMetrics,
}

/// Exported comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportReport {
    pub run_id: String,
    pub dataset_id: String,
    /// When the report was generated.
    pub timestamp: DateTime<Utc>,
    pub similarity_metric: String,
    pub top_k_values: Vec<u32>,
    pub total_models: usize,
    /// Wall-clock duration of the run, one decimal.
    pub elapsed_seconds: f64,
    pub models: Vec<ModelSummary>,
    pub ranking: Ranking,
    pub agreement: AgreementCounts,
}

impl ExportReport {
    pub fn build(
        results: &RunResults,
        elapsed_seconds: f64,
        ranking: Ranking,
        records: &[QueryAgreementRecord],
    ) -> Self {
        Self {
            run_id: results.run_id.clone(),
            dataset_id: results.dataset_id.clone(),
            timestamp: Utc::now(),
            similarity_metric: results.similarity_metric.clone(),
            top_k_values: results.top_k_values.clone(),
            total_models: results.model_results.len(),
            elapsed_seconds: (elapsed_seconds * 10.0).round() / 10.0,
            models: results
                .model_results
                .iter()
                .map(|r| ModelSummary {
                    model_id: r.model_id.clone(),
                    ir_metrics: r.ir_metrics.clone(),
                    performance: r.performance.clone(),
                })
                .collect(),
            ranking,
            agreement: summarize(records),
        }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(self),
            ReportFormat::Markdown => Ok(self.to_markdown()),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut report = String::new();

        report.push_str("# Embedding Model Comparison Report\n\n");
        report.push_str(&format!(
            "**Run ID:** {}  \n\
             **Dataset:** {}  \n\
             **Timestamp:** {}  \n\
             **Similarity Metric:** {}  \n\
             **Duration:** {:.1}s  \n\n",
            self.run_id,
            self.dataset_id,
            self.timestamp.to_rfc3339(),
            self.similarity_metric,
            self.elapsed_seconds
        ));

        report.push_str("## Retrieval Accuracy\n\n");
        report.push_str(
            "| Model | MRR | MAP | P@5 | R@5 | NDCG@10 | HR@1 |\n\
             |-------|-----|-----|-----|-----|---------|------|\n",
        );
        for m in &self.models {
            let ir = &m.ir_metrics;
            report.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} |\n",
                m.model_id,
                ir.mrr,
                ir.map_score,
                IrMetrics::at(&ir.precision_at_k, 5),
                IrMetrics::at(&ir.recall_at_k, 5),
                IrMetrics::at(&ir.ndcg_at_k, 10),
                IrMetrics::at(&ir.hit_rate_at_k, 1)
            ));
        }
        report.push('\n');

        report.push_str("## Performance & Cost\n\n");
        report.push_str(
            "| Model | Embed Avg (ms) | P95 (ms) | Query Avg (ms) | Throughput | Dim | Memory (MB) | Cost ($) |\n\
             |-------|----------------|----------|----------------|------------|-----|-------------|----------|\n",
        );
        for m in &self.models {
            let p = &m.performance;
            report.push_str(&format!(
                "| {} | {:.2} | {:.2} | {:.2} | {:.1}/s | {} | {:.1} | ${:.4} |\n",
                m.model_id,
                p.embedding_latency_avg_ms,
                p.embedding_latency_p95_ms,
                p.query_latency_avg_ms,
                p.throughput_docs_per_sec,
                p.embedding_dimension,
                p.memory_usage_mb,
                p.api_cost_usd
            ));
        }
        report.push('\n');

        if !self.ranking.entries.is_empty() {
            report.push_str("## Ranking\n\n");
            if self.ranking.degenerate_weights {
                report.push_str("_All weights are zero; scores are not meaningful._\n\n");
            }
            report.push_str("| Rank | Model | Score |\n|------|-------|-------|\n");
            for entry in &self.ranking.entries {
                report.push_str(&format!(
                    "| {} | {} | {} |\n",
                    entry.rank, entry.model_id, entry.composite_score
                ));
            }
            report.push('\n');
        }

        report.push_str("## Query Agreement\n\n");
        report.push_str(&format!(
            "| Class | Queries |\n\
             |-------|---------|\n\
             | All correct | {} |\n\
             | All wrong | {} |\n\
             | Disagree | {} |\n\
             | Total | {} |\n\n",
            self.agreement.all_correct,
            self.agreement.all_wrong,
            self.agreement.disagree,
            self.agreement.total
        ));

        report.push_str("---\n*Generated by Embedding Model Comparison*\n");
        report
    }
}

/// JSON Schema of [`ExportReport`].
pub fn report_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ExportReport)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::agreement::classify;
    use crate::results::ranking::{rank, WeightProfile};
    use crate::results::types::{ModelResult, QueryResult, RetrievedDoc};

    fn model(id: &str, mrr: f64, hit: bool) -> ModelResult {
        let mut ir = IrMetrics {
            mrr,
            map_score: mrr / 2.0,
            ..Default::default()
        };
        ir.precision_at_k.insert(5, 0.2);
        ir.ndcg_at_k.insert(10, 0.5);
        ModelResult {
            model_id: id.to_string(),
            ir_metrics: ir,
            performance: PerformanceMetrics {
                embedding_latency_avg_ms: 12.5,
                query_latency_avg_ms: 3.0,
                api_cost_usd: 0.01,
                embedding_dimension: 384,
                ..Default::default()
            },
            per_query_results: vec![QueryResult {
                query_text: "what is rust".into(),
                relevant: ["d1".to_string()].into_iter().collect(),
                retrieved: vec![RetrievedDoc {
                    doc_id: if hit { "d1".into() } else { "d9".into() },
                    score: 0.9,
                }],
            }],
        }
    }

    fn report() -> ExportReport {
        let results = RunResults {
            run_id: "r1".into(),
            dataset_id: "scifact".into(),
            model_results: vec![model("a", 0.8, true), model("b", 0.4, false)],
            top_k_values: vec![1, 5, 10],
            similarity_metric: "cosine".into(),
        };
        let ranking = rank(&results.model_results, &WeightProfile::default());
        let records = classify(&results.model_results);
        ExportReport::build(&results, 42.26, ranking, &records)
    }

    #[test]
    fn test_build_report() {
        let report = report();
        assert_eq!(report.total_models, 2);
        assert_eq!(report.elapsed_seconds, 42.3);
        assert_eq!(report.models[1].model_id, "b");
        assert_eq!(report.agreement.disagree, 1);
        assert_eq!(report.ranking.entries[0].model_id, "a");
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&report().render(ReportFormat::Json).unwrap()).unwrap();
        for key in [
            "run_id",
            "dataset_id",
            "timestamp",
            "similarity_metric",
            "top_k_values",
            "total_models",
            "elapsed_seconds",
            "models",
            "ranking",
            "agreement",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["models"][0]["ir_metrics"]["precision_at_k"]["5"], 0.2);
    }

    #[test]
    fn test_markdown_tables() {
        let md = report().render(ReportFormat::Markdown).unwrap();
        assert!(md.starts_with("# Embedding Model Comparison Report"));
        assert!(md.contains("## Retrieval Accuracy"));
        assert!(md.contains("| a | 0.8000 | 0.4000 | 0.2000 | 0.0000 | 0.5000 | 0.0000 |"));
        assert!(md.contains("## Performance & Cost"));
        assert!(md.contains("| a | 12.50 |"));
        assert!(md.contains("| Disagree | 1 |"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("csv".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_schema_lists_report_fields() {
        let schema = report_schema();
        let props = &schema["properties"];
        assert!(props.get("ranking").is_some());
        assert!(props.get("agreement").is_some());
    }
}
