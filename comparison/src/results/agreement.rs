//! Cross-model query agreement.
//!
//! For every dataset query, checks whether each model placed at least one
//! relevant document in its first five results, then labels the query by
//! whether the models agree.
//!
//! The five-result cutoff is positional and fixed. It is a coarse
//! agree/disagree signal and is independent of the
//! `top_k_values` the backend uses for its Recall@K/Precision@K metrics.

use crate::results::types::ModelResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Positional cutoff used to decide a hit.
pub const AGREEMENT_CUTOFF: usize = 5;

/// How the models fared on a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Every model hit.
    AllCorrect,
    /// No model hit.
    AllWrong,
    /// Some hit, some missed.
    Disagree,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllCorrect => write!(f, "all correct"),
            Self::AllWrong => write!(f, "all wrong"),
            Self::Disagree => write!(f, "disagree"),
        }
    }
}

/// One model's outcome for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelHit {
    pub model_id: String,
    pub hit: bool,
    pub retrieved_top5: Vec<String>,
}

/// Agreement record for one query index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryAgreementRecord {
    pub query_index: usize,
    pub query_text: String,
    pub relevant: BTreeSet<String>,
    pub per_model: Vec<ModelHit>,
    pub classification: Classification,
}

/// Number of queries per classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AgreementCounts {
    pub total: usize,
    pub all_correct: usize,
    pub all_wrong: usize,
    pub disagree: usize,
}

impl AgreementCounts {
    pub fn get(&self, class: Classification) -> usize {
        match class {
            Classification::AllCorrect => self.all_correct,
            Classification::AllWrong => self.all_wrong,
            Classification::Disagree => self.disagree,
        }
    }
}

/// Classify every query of a completed run, in dataset order.
///
/// The query list of the first model defines the query count. A model that
/// has no entry at some index is counted as a miss for that query.
pub fn classify(model_results: &[ModelResult]) -> Vec<QueryAgreementRecord> {
    let Some(first) = model_results.first() else {
        return Vec::new();
    };

    first
        .per_query_results
        .iter()
        .enumerate()
        .map(|(qi, query)| {
            let per_model: Vec<ModelHit> = model_results
                .iter()
                .map(|result| match result.per_query_results.get(qi) {
                    Some(pqr) => {
                        let top = pqr.top_ids(AGREEMENT_CUTOFF);
                        let hit = top.iter().any(|id| pqr.relevant.contains(id));
                        ModelHit {
                            model_id: result.model_id.clone(),
                            hit,
                            retrieved_top5: top,
                        }
                    }
                    None => ModelHit {
                        model_id: result.model_id.clone(),
                        hit: false,
                        retrieved_top5: Vec::new(),
                    },
                })
                .collect();

            let classification = if per_model.iter().all(|m| m.hit) {
                Classification::AllCorrect
            } else if per_model.iter().all(|m| !m.hit) {
                Classification::AllWrong
            } else {
                Classification::Disagree
            };

            QueryAgreementRecord {
                query_index: qi,
                query_text: query.query_text.clone(),
                relevant: query.relevant.clone(),
                per_model,
                classification,
            }
        })
        .collect()
}

/// Aggregate counts over a classified set.
pub fn summarize(records: &[QueryAgreementRecord]) -> AgreementCounts {
    records
        .iter()
        .fold(AgreementCounts::default(), |mut counts, record| {
            counts.total += 1;
            match record.classification {
                Classification::AllCorrect => counts.all_correct += 1,
                Classification::AllWrong => counts.all_wrong += 1,
                Classification::Disagree => counts.disagree += 1,
            }
            counts
        })
}

/// Records matching `class` (all records for `None`), in query order.
pub fn filter(
    records: &[QueryAgreementRecord],
    class: Option<Classification>,
) -> Vec<&QueryAgreementRecord> {
    records
        .iter()
        .filter(|r| class.map_or(true, |c| r.classification == c))
        .collect()
}

/// Filtered view plus the summary counts over the full set.
#[derive(Debug, Clone, Serialize)]
pub struct AgreementView<'a> {
    pub counts: AgreementCounts,
    pub records: Vec<&'a QueryAgreementRecord>,
}

pub fn view(records: &[QueryAgreementRecord], class: Option<Classification>) -> AgreementView<'_> {
    AgreementView {
        counts: summarize(records),
        records: filter(records, class),
    }
}
