//! Configuration for talking to the benchmark backend and for ranking.
//!
//! Defaults come from the environment; a TOML file can override them:
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:8000/api"
//! request_timeout_secs = 10
//! poll_interval_ms = 1000
//!
//! [weights]
//! mrr = 30
//! cost = 0
//!
//! [pricing]
//! "openai/text-embedding-3-small" = 0.00002
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::results::WeightProfile;

/// Error types for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Connection settings for the benchmark backend
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Base URL of the backend API (no trailing slash needed)
    pub base_url: String,
    /// Upper bound for one request round trip
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Interval the caller should poll at
    pub poll_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            // EMBED_COMPARE_URL: Base URL of the benchmark backend API
            base_url: std::env::var("EMBED_COMPARE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "http://localhost:8000/api".to_string()),
            // EMBED_COMPARE_TIMEOUT_SECS: Per-request timeout
            request_timeout: env_duration("EMBED_COMPARE_TIMEOUT_SECS", Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(10)),
            // EMBED_COMPARE_CONNECT_TIMEOUT_SECS: TCP connect timeout
            connect_timeout: env_duration(
                "EMBED_COMPARE_CONNECT_TIMEOUT_SECS",
                Duration::from_secs,
            )
            .unwrap_or_else(|| Duration::from_secs(3)),
            // EMBED_COMPARE_POLL_INTERVAL_MS: Milliseconds between status polls
            poll_interval: env_duration("EMBED_COMPARE_POLL_INTERVAL_MS", Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(1000)),
        }
    }
}

/// A positive integer duration from the environment. Zero and unparsable
/// values are ignored so the default applies.
fn env_duration(name: &str, unit: fn(u64) -> Duration) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match positive(raw.trim().parse().ok()) {
        Some(value) => Some(unit(value)),
        None => {
            tracing::warn!(var = name, value = %raw, "Ignoring non-positive or invalid duration");
            None
        }
    }
}

fn positive(value: Option<u64>) -> Option<u64> {
    value.filter(|v| *v > 0)
}

/// `[service]` table of the config file. Unset keys keep the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl ServiceSection {
    /// Durations must be positive: a zero timeout fails every request and a
    /// zero poll interval cannot be scheduled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("service.request_timeout_secs", self.request_timeout_secs),
            ("service.connect_timeout_secs", self.connect_timeout_secs),
            ("service.poll_interval_ms", self.poll_interval_ms),
        ];
        for (key, value) in durations {
            if value == Some(0) {
                return Err(ConfigError::Invalid {
                    key,
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn apply(&self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        config
    }
}

/// Contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub service: ServiceSection,
    pub weights: WeightProfile,
    /// Price per 1k tokens, by model id.
    pub pricing: HashMap<String, f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        config.service.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Service settings: environment defaults overlaid with the file.
    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        self.service.validate()?;
        Ok(self.service.apply(ServiceConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_file() {
        let config = FileConfig::parse(
            r#"
[service]
base_url = "http://bench:9000/api"
request_timeout_secs = 5
poll_interval_ms = 250

[weights]
mrr = 40
latency = 0

[pricing]
"local/e5-base-v2" = 0.001
"#,
        )
        .unwrap();

        let service = config.service_config().unwrap();
        assert_eq!(service.base_url, "http://bench:9000/api");
        assert_eq!(service.request_timeout, Duration::from_secs(5));
        assert_eq!(service.poll_interval, Duration::from_millis(250));
        assert_eq!(config.weights.mrr, 40.0);
        assert_eq!(config.weights.latency, 0.0);
        assert_eq!(config.weights.map, 20.0);
        assert_eq!(config.pricing["local/e5-base-v2"], 0.001);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config.weights, WeightProfile::default());
        assert!(config.pricing.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[weights]\ncost = 50").unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.weights.cost, 50.0);
    }

    #[test]
    fn test_zero_durations_rejected() {
        let config = FileConfig::parse("[service]\npoll_interval_ms = 0\n").unwrap();
        assert!(matches!(
            config.service_config(),
            Err(ConfigError::Invalid {
                key: "service.poll_interval_ms",
                ..
            })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service]\nrequest_timeout_secs = 0").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("service.request_timeout_secs"));
    }

    #[test]
    fn test_positive_duration_filter() {
        assert_eq!(positive(Some(250)), Some(250));
        assert_eq!(positive(Some(0)), None);
        assert_eq!(positive(None), None);
    }

    #[test]
    fn test_load_errors() {
        let missing = FileConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[weights\nmrr = ").unwrap();
        let bad = FileConfig::load(file.path());
        assert!(matches!(bad, Err(ConfigError::Parse { .. })));
    }
}
