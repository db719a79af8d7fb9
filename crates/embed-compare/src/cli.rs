//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use comparison::results::{Classification, MetricKey, ReportFormat};
use comparison::run::SimilarityMetric;

#[derive(Parser, Debug)]
#[command(
    name = "embed-compare",
    version,
    about = "Compare embedding models on a retrieval benchmark",
    long_about = None
)]
pub struct Cli {
    /// TOML config file with [service], [weights] and [pricing] tables
    #[arg(long, global = true, env = "EMBED_COMPARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Benchmark backend base URL (overrides config and EMBED_COMPARE_URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Override one ranking weight, e.g. `--weight latency=0`
    #[arg(long = "weight", global = true, value_parser = parse_weight)]
    pub weights: Vec<(MetricKey, f64)>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the built-in model catalog
    Models,

    /// Estimate API cost before starting a run
    Estimate(EstimateArgs),

    /// Start a run, follow it to completion and export the comparison
    Run(RunArgs),

    /// Rank and classify a saved results file
    Rank(RankArgs),

    /// Print the JSON Schema of the exported report
    Schema,
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Read document count and average length from this backend dataset
    #[arg(long, conflicts_with_all = ["documents", "avg_doc_length"])]
    pub dataset: Option<String>,

    /// Average document length in characters
    #[arg(long, required_unless_present = "dataset", requires = "documents")]
    pub avg_doc_length: Option<f64>,

    /// Number of documents in the dataset
    #[arg(long, required_unless_present = "dataset", requires = "avg_doc_length")]
    pub documents: Option<u64>,

    /// Model id (repeatable)
    #[arg(long = "model", required = true)]
    pub models: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dataset id known to the backend
    #[arg(long)]
    pub dataset: String,

    /// Model id, in display order (repeatable, at most 6)
    #[arg(long = "model", required = true)]
    pub models: Vec<String>,

    /// Cutoffs for the backend's @K metrics
    #[arg(long, value_delimiter = ',', default_value = "1,3,5,10,20")]
    pub top_k: Vec<u32>,

    #[arg(long, value_enum, default_value_t = Similarity::Cosine)]
    pub similarity: Similarity,

    /// Do not L2-normalize embeddings
    #[arg(long, default_value_t = false)]
    pub no_normalize: bool,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// On Ctrl-C, abandon the run immediately instead of waiting for the
    /// backend to confirm the cancel
    #[arg(long, default_value_t = false)]
    pub forget_on_interrupt: bool,
}

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Results JSON as returned by the backend's results endpoint
    #[arg(long)]
    pub results: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Also list the queries in this agreement class
    #[arg(long, value_enum)]
    pub show: Option<Agreement>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Similarity {
    Cosine,
    DotProduct,
    Euclidean,
}

impl From<Similarity> for SimilarityMetric {
    fn from(value: Similarity) -> Self {
        match value {
            Similarity::Cosine => SimilarityMetric::Cosine,
            Similarity::DotProduct => SimilarityMetric::DotProduct,
            Similarity::Euclidean => SimilarityMetric::Euclidean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Markdown,
}

impl From<Format> for ReportFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Json => ReportFormat::Json,
            Format::Markdown => ReportFormat::Markdown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Agreement {
    AllCorrect,
    AllWrong,
    Disagree,
    All,
}

impl Agreement {
    pub fn class(self) -> Option<Classification> {
        match self {
            Self::AllCorrect => Some(Classification::AllCorrect),
            Self::AllWrong => Some(Classification::AllWrong),
            Self::Disagree => Some(Classification::Disagree),
            Self::All => None,
        }
    }
}

/// Parse `key=value` into a ranking weight override.
pub fn parse_weight(s: &str) -> Result<(MetricKey, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))?;
    let key = MetricKey::ALL
        .into_iter()
        .find(|k| k.to_string() == key.trim().to_ascii_lowercase())
        .ok_or_else(|| {
            let names: Vec<String> = MetricKey::ALL.iter().map(|k| k.to_string()).collect();
            format!("unknown weight {key:?} (one of {})", names.join(", "))
        })?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight value {value:?}: {e}"))?;
    Ok((key, value))
}
