use anyhow::{Context, Result};
use comparison::catalog::ModelCatalog;
use comparison::config::{FileConfig, ServiceConfig};
use comparison::results::{MetricKey, WeightProfile};
use std::path::Path;

/// Effective settings for one invocation.
///
/// Precedence, lowest first: built-in defaults, environment, config file,
/// command-line flags.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub service: ServiceConfig,
    pub weights: WeightProfile,
    pub catalog: ModelCatalog,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            weights: WeightProfile::default(),
            catalog: ModelCatalog::builtin(),
        }
    }
}

impl CompareConfig {
    pub fn load(
        path: Option<&Path>,
        url: Option<&str>,
        weight_overrides: &[(MetricKey, f64)],
    ) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => FileConfig::default(),
        };
        Self::from_file(&file, url, weight_overrides)
    }

    pub fn from_file(
        file: &FileConfig,
        url: Option<&str>,
        weight_overrides: &[(MetricKey, f64)],
    ) -> Result<Self> {
        let mut service = file.service_config()?;
        if let Some(url) = url {
            service.base_url = url.to_string();
        }

        let weights = weight_overrides
            .iter()
            .fold(file.weights, |w, (key, value)| w.with(*key, *value));

        Ok(Self {
            service,
            weights,
            catalog: ModelCatalog::builtin().with_prices(&file.pricing),
        })
    }
}
