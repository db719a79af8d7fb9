//! Pre-run API cost estimate.
//!
//! The estimate is a rough upper bound, not billed fact. Token counts use a
//! fixed four-characters-per-token heuristic over the dataset's average
//! document length; actual tokenizers and any query-side embedding traffic
//! are not modelled.

use crate::catalog::ModelCatalog;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Characters per token assumed by the estimate.
pub const CHARS_PER_TOKEN: f64 = 4.0;

/// Size and shape of the dataset to embed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DatasetShape {
    pub document_count: u64,
    /// Average document length in characters.
    pub avg_doc_length: f64,
}

/// Unit price of one selected model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelPricing {
    pub model_id: String,
    pub price_per_1k_tokens: f64,
}

impl ModelPricing {
    /// Pricing for `model_ids` looked up in `catalog`, in the given order.
    pub fn from_catalog(catalog: &ModelCatalog, model_ids: &[String]) -> Vec<Self> {
        model_ids
            .iter()
            .map(|id| Self {
                model_id: id.clone(),
                price_per_1k_tokens: catalog.price_of(id),
            })
            .collect()
    }
}

/// Estimated spend for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelCost {
    pub model_id: String,
    pub cost_usd: f64,
}

/// Result of [`estimate_cost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostEstimate {
    /// Tokens per model for one pass over the documents.
    pub estimated_tokens: f64,
    /// Models with a non-zero unit price.
    pub paid_models: usize,
    pub per_model: Vec<ModelCost>,
    pub cost_usd: f64,
}

impl CostEstimate {
    /// One-line summary, e.g. `$0.0100 (100000 tokens x 1 model)`.
    pub fn summary(&self) -> String {
        format!(
            "${:.4} ({} tokens x {} model{})",
            self.cost_usd,
            self.estimated_tokens.round() as u64,
            self.paid_models,
            if self.paid_models == 1 { "" } else { "s" }
        )
    }
}

/// Estimate API spend for embedding `dataset` with every priced model.
///
/// Free models contribute zero. Negative or non-finite inputs are treated
/// as zero.
pub fn estimate_cost(dataset: &DatasetShape, pricing: &[ModelPricing]) -> CostEstimate {
    let avg_len = non_negative(dataset.avg_doc_length);
    let estimated_tokens = (avg_len / CHARS_PER_TOKEN) * dataset.document_count as f64;

    let per_model: Vec<ModelCost> = pricing
        .iter()
        .map(|p| {
            let price = non_negative(p.price_per_1k_tokens);
            let cost_usd = if price > 0.0 {
                (estimated_tokens / 1000.0) * price
            } else {
                0.0
            };
            ModelCost {
                model_id: p.model_id.clone(),
                cost_usd,
            }
        })
        .collect();

    let paid_models = pricing
        .iter()
        .filter(|p| non_negative(p.price_per_1k_tokens) > 0.0)
        .count();
    let cost_usd = per_model.iter().map(|m| m.cost_usd).sum();

    CostEstimate {
        estimated_tokens,
        paid_models,
        per_model,
        cost_usd,
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing(id: &str, price: f64) -> ModelPricing {
        ModelPricing {
            model_id: id.to_string(),
            price_per_1k_tokens: price,
        }
    }

    #[test]
    fn test_single_paid_model() {
        let dataset = DatasetShape {
            document_count: 1000,
            avg_doc_length: 400.0,
        };
        let estimate = estimate_cost(&dataset, &[pricing("paid", 0.0001)]);
        assert_eq!(estimate.estimated_tokens, 100_000.0);
        assert!((estimate.cost_usd - 0.01).abs() < 1e-12);
        assert_eq!(estimate.paid_models, 1);
        assert_eq!(estimate.summary(), "$0.0100 (100000 tokens x 1 model)");
    }

    #[test]
    fn test_free_models_contribute_nothing() {
        let dataset = DatasetShape {
            document_count: 1000,
            avg_doc_length: 400.0,
        };
        let estimate = estimate_cost(
            &dataset,
            &[pricing("free", 0.0), pricing("a", 0.0001), pricing("b", 0.0002)],
        );
        assert_eq!(estimate.paid_models, 2);
        assert_eq!(estimate.per_model[0].cost_usd, 0.0);
        assert!((estimate.cost_usd - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_from_catalog_unknown_is_free() {
        let catalog = ModelCatalog::builtin();
        let ids = vec![
            "openai/text-embedding-ada-002".to_string(),
            "someone/else".to_string(),
        ];
        let prices = ModelPricing::from_catalog(&catalog, &ids);
        assert_eq!(prices[0].price_per_1k_tokens, 0.0001);
        assert_eq!(prices[1].price_per_1k_tokens, 0.0);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = DatasetShape {
            document_count: 0,
            avg_doc_length: f64::NAN,
        };
        let estimate = estimate_cost(&dataset, &[pricing("paid", 1.0)]);
        assert_eq!(estimate.cost_usd, 0.0);
    }
}
