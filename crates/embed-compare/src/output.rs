//! Rendering and writing of command output.

use anyhow::{Context, Result};
use comparison::catalog::ModelCatalog;
use comparison::cost::CostEstimate;
use comparison::results::{
    classify, rank, view, Classification, ExportReport, QueryAgreementRecord, ReportFormat,
    RunResults, WeightProfile,
};
use serde::Serialize;
use std::path::Path;

/// Rank, classify and assemble the export report for a result set.
pub fn build_report(
    results: &RunResults,
    elapsed_seconds: f64,
    weights: &WeightProfile,
) -> (ExportReport, Vec<QueryAgreementRecord>) {
    let ranking = rank(&results.model_results, weights);
    let records = classify(&results.model_results);
    let report = ExportReport::build(results, elapsed_seconds, ranking, &records);
    (report, records)
}

/// Load a results document saved from the backend's results endpoint.
pub fn load_results(path: &Path) -> Result<RunResults> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results in {}", path.display()))
}

#[derive(Serialize)]
struct ReportWithQueries<'a> {
    report: &'a ExportReport,
    queries: comparison::results::AgreementView<'a>,
}

/// Render a report, optionally followed by the queries of one agreement
/// class (`Some(None)` lists every query).
pub fn render(
    report: &ExportReport,
    records: &[QueryAgreementRecord],
    show: Option<Option<Classification>>,
    format: ReportFormat,
) -> Result<String> {
    let Some(class) = show else {
        return Ok(report.render(format)?);
    };

    let queries = view(records, class);
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(&ReportWithQueries {
            report,
            queries,
        })?),
        ReportFormat::Markdown => {
            let mut out = report.to_markdown();
            let title = class.map_or_else(|| "all".to_string(), |c| c.to_string());
            out.push_str(&format!(
                "\n## Queries: {} ({} of {})\n\n",
                title,
                queries.records.len(),
                queries.counts.total
            ));
            for record in &queries.records {
                out.push_str(&format!("- **{}**\n", record.query_text));
                for hit in &record.per_model {
                    out.push_str(&format!(
                        "  - {} {}: {}\n",
                        if hit.hit { "hit" } else { "miss" },
                        hit.model_id,
                        hit.retrieved_top5.join(", ")
                    ));
                }
            }
            Ok(out)
        }
    }
}

/// Write to `path`, or stdout when no path is given.
pub fn write_output(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "Report written");
        }
        None => println!("{}", text),
    }
    Ok(())
}

pub fn format_catalog(catalog: &ModelCatalog) -> String {
    let mut out = String::new();
    out.push_str("| Model | Provider | Dim | Max Tokens | $/1k tokens | Description |\n");
    out.push_str("|-------|----------|-----|------------|-------------|-------------|\n");
    for m in catalog.models() {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            m.id,
            m.provider,
            m.dimension,
            m.max_tokens,
            if m.is_paid() {
                format!("{:.5}", m.cost_per_1k_tokens)
            } else {
                "free".to_string()
            },
            m.description
        ));
    }
    out
}

pub fn format_estimate(estimate: &CostEstimate) -> String {
    let mut out = format!("Estimated cost: {}\n", estimate.summary());
    for m in &estimate.per_model {
        out.push_str(&format!("  {:<40} ${:.4}\n", m.model_id, m.cost_usd));
    }
    out
}
