//! Built-in embedding model catalog.
//!
//! Mirrors the model registry the benchmark backend ships with. The catalog
//! only carries what the core needs before a run: identity, shape and list
//! price. Operators can override prices from the config file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Who serves the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Openai,
    Cohere,
    Local,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Openai => write!(f, "openai"),
            Self::Cohere => write!(f, "cohere"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    pub id: String,
    pub provider: Provider,
    pub model_name: String,
    pub dimension: u32,
    pub max_tokens: u32,
    /// USD per 1000 input tokens; 0 for self-hosted models.
    pub cost_per_1k_tokens: f64,
    pub description: String,
}

impl ModelInfo {
    pub fn is_paid(&self) -> bool {
        self.cost_per_1k_tokens > 0.0
    }
}

const BUILTIN: &[(&str, Provider, &str, u32, u32, f64, &str)] = &[
    (
        "openai/text-embedding-3-small",
        Provider::Openai,
        "text-embedding-3-small",
        1536,
        8191,
        0.00002,
        "OpenAI small v3, best value",
    ),
    (
        "openai/text-embedding-3-large",
        Provider::Openai,
        "text-embedding-3-large",
        3072,
        8191,
        0.00013,
        "OpenAI large v3, highest quality",
    ),
    (
        "openai/text-embedding-ada-002",
        Provider::Openai,
        "text-embedding-ada-002",
        1536,
        8191,
        0.0001,
        "OpenAI Ada v2, legacy",
    ),
    (
        "cohere/embed-english-v3.0",
        Provider::Cohere,
        "embed-english-v3.0",
        1024,
        512,
        0.0001,
        "Cohere English v3",
    ),
    (
        "cohere/embed-english-light-v3.0",
        Provider::Cohere,
        "embed-english-light-v3.0",
        384,
        512,
        0.0001,
        "Cohere English Light v3, fast and compact",
    ),
    (
        "cohere/embed-multilingual-v3.0",
        Provider::Cohere,
        "embed-multilingual-v3.0",
        1024,
        512,
        0.0001,
        "Cohere Multilingual v3",
    ),
    (
        "local/all-MiniLM-L6-v2",
        Provider::Local,
        "sentence-transformers/all-MiniLM-L6-v2",
        384,
        256,
        0.0,
        "MiniLM, lightweight 384d",
    ),
    (
        "local/e5-small-v2",
        Provider::Local,
        "intfloat/e5-small-v2",
        384,
        512,
        0.0,
        "E5 Small 384d, needs prefixes",
    ),
    (
        "local/e5-base-v2",
        Provider::Local,
        "intfloat/e5-base-v2",
        768,
        512,
        0.0,
        "E5 Base 768d, needs prefixes",
    ),
    (
        "local/bge-small-en-v1.5",
        Provider::Local,
        "BAAI/bge-small-en-v1.5",
        384,
        512,
        0.0,
        "BGE Small 384d, instruction prefix for queries",
    ),
    (
        "local/bge-base-en-v1.5",
        Provider::Local,
        "BAAI/bge-base-en-v1.5",
        768,
        512,
        0.0,
        "BGE Base 768d, instruction prefix for queries",
    ),
];

/// Lookup table of known models, in catalog order.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    pub fn builtin() -> Self {
        let models = BUILTIN
            .iter()
            .map(
                |(id, provider, name, dimension, max_tokens, price, description)| ModelInfo {
                    id: id.to_string(),
                    provider: *provider,
                    model_name: name.to_string(),
                    dimension: *dimension,
                    max_tokens: *max_tokens,
                    cost_per_1k_tokens: *price,
                    description: description.to_string(),
                },
            )
            .collect();
        Self { models }
    }

    /// Apply per-model price overrides. Unknown ids are ignored with a warning.
    pub fn with_prices(mut self, prices: &HashMap<String, f64>) -> Self {
        for (id, price) in prices {
            match self.models.iter_mut().find(|m| &m.id == id) {
                Some(model) => model.cost_per_1k_tokens = price.max(0.0),
                None => tracing::warn!(model = %id, "Price override for unknown model ignored"),
            }
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    /// Price per 1k tokens for a model; unknown models are treated as free.
    pub fn price_of(&self, id: &str) -> f64 {
        self.get(id).map(|m| m.cost_per_1k_tokens).unwrap_or(0.0)
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.models().len(), 11);
        let small = catalog.get("openai/text-embedding-3-small").unwrap();
        assert_eq!(small.dimension, 1536);
        assert!(small.is_paid());
        assert!(!catalog.get("local/e5-small-v2").unwrap().is_paid());
    }

    #[test]
    fn test_price_overrides() {
        let mut prices = HashMap::new();
        prices.insert("local/e5-base-v2".to_string(), 0.5);
        prices.insert("nope/unknown".to_string(), 1.0);
        let catalog = ModelCatalog::builtin().with_prices(&prices);
        assert_eq!(catalog.price_of("local/e5-base-v2"), 0.5);
        assert_eq!(catalog.price_of("nope/unknown"), 0.0);
    }
}
