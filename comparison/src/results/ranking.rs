//! Composite ranking of models under an operator weight profile.
//!
//! Six features are pulled from every [`ModelResult`], min-max normalized
//! across the models of the run, weighted, and fused into a 0-100 score.
//! Latency and cost are inverted so that cheaper/faster scores higher.
//!
//! `rank` is a pure function of its inputs, so a new weight profile can be
//! applied to an already-collected result set at any time.

use crate::results::types::{IrMetrics, ModelResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed set of features that take part in the composite score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricKey {
    Mrr,
    Map,
    Ndcg10,
    Recall5,
    Latency,
    Cost,
}

impl MetricKey {
    pub const ALL: [MetricKey; 6] = [
        MetricKey::Mrr,
        MetricKey::Map,
        MetricKey::Ndcg10,
        MetricKey::Recall5,
        MetricKey::Latency,
        MetricKey::Cost,
    ];

    /// Whether a smaller raw value is the better one.
    pub fn lower_is_better(self) -> bool {
        matches!(self, Self::Latency | Self::Cost)
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Mrr => "MRR",
            Self::Map => "MAP",
            Self::Ndcg10 => "NDCG@10",
            Self::Recall5 => "Recall@5",
            Self::Latency => "Latency",
            Self::Cost => "Cost",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mrr => write!(f, "mrr"),
            Self::Map => write!(f, "map"),
            Self::Ndcg10 => write!(f, "ndcg10"),
            Self::Recall5 => write!(f, "recall5"),
            Self::Latency => write!(f, "latency"),
            Self::Cost => write!(f, "cost"),
        }
    }
}

/// Operator-adjustable weight per feature.
///
/// Weights need not sum to anything in particular; [`rank`] divides by the
/// total at use time. Missing keys in a config file take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WeightProfile {
    pub mrr: f64,
    pub map: f64,
    pub ndcg10: f64,
    pub recall5: f64,
    pub latency: f64,
    pub cost: f64,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self {
            mrr: 25.0,
            map: 20.0,
            ndcg10: 20.0,
            recall5: 15.0,
            latency: 10.0,
            cost: 10.0,
        }
    }
}

impl WeightProfile {
    /// Profile with every weight set to zero.
    pub fn zero() -> Self {
        Self {
            mrr: 0.0,
            map: 0.0,
            ndcg10: 0.0,
            recall5: 0.0,
            latency: 0.0,
            cost: 0.0,
        }
    }

    /// Profile that weighs a single feature only.
    pub fn only(key: MetricKey, weight: f64) -> Self {
        Self::zero().with(key, weight)
    }

    /// Replace one weight.
    pub fn with(mut self, key: MetricKey, weight: f64) -> Self {
        *self.slot(key) = weight;
        self
    }

    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::Mrr => self.mrr,
            MetricKey::Map => self.map,
            MetricKey::Ndcg10 => self.ndcg10,
            MetricKey::Recall5 => self.recall5,
            MetricKey::Latency => self.latency,
            MetricKey::Cost => self.cost,
        }
    }

    fn slot(&mut self, key: MetricKey) -> &mut f64 {
        match key {
            MetricKey::Mrr => &mut self.mrr,
            MetricKey::Map => &mut self.map,
            MetricKey::Ndcg10 => &mut self.ndcg10,
            MetricKey::Recall5 => &mut self.recall5,
            MetricKey::Latency => &mut self.latency,
            MetricKey::Cost => &mut self.cost,
        }
    }

    /// Negative and non-finite weights clamped to zero. Weights whose sum
    /// overflows are rescaled against the largest one, keeping their ratios.
    pub fn sanitized(&self) -> Self {
        let mut out = *self;
        for key in MetricKey::ALL {
            let w = out.get(key);
            if !w.is_finite() || w < 0.0 {
                *out.slot(key) = 0.0;
            }
        }
        if !out.total().is_finite() {
            let max = MetricKey::ALL
                .iter()
                .map(|k| out.get(*k))
                .fold(0.0, f64::max);
            for key in MetricKey::ALL {
                *out.slot(key) /= max;
            }
        }
        out
    }

    pub fn total(&self) -> f64 {
        MetricKey::ALL.iter().map(|k| self.get(*k)).sum()
    }
}

/// The six feature values for one model, raw or normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureVector {
    pub mrr: f64,
    pub map: f64,
    pub ndcg10: f64,
    pub recall5: f64,
    pub latency: f64,
    pub cost: f64,
}

impl FeatureVector {
    /// Extract the ranking features from a model result.
    ///
    /// Absent cutoffs and non-finite values count as 0.
    pub fn from_result(result: &ModelResult) -> Self {
        let ir = &result.ir_metrics;
        let perf = &result.performance;
        Self {
            mrr: finite_or_zero(ir.mrr),
            map: finite_or_zero(ir.map_score),
            ndcg10: finite_or_zero(IrMetrics::at(&ir.ndcg_at_k, 10)),
            recall5: finite_or_zero(IrMetrics::at(&ir.recall_at_k, 5)),
            latency: finite_or_zero(perf.embedding_latency_avg_ms),
            cost: finite_or_zero(perf.api_cost_usd),
        }
    }

    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::Mrr => self.mrr,
            MetricKey::Map => self.map,
            MetricKey::Ndcg10 => self.ndcg10,
            MetricKey::Recall5 => self.recall5,
            MetricKey::Latency => self.latency,
            MetricKey::Cost => self.cost,
        }
    }

    fn set(&mut self, key: MetricKey, value: f64) {
        match key {
            MetricKey::Mrr => self.mrr = value,
            MetricKey::Map => self.map = value,
            MetricKey::Ndcg10 => self.ndcg10 = value,
            MetricKey::Recall5 => self.recall5 = value,
            MetricKey::Latency => self.latency = value,
            MetricKey::Cost => self.cost = value,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Observed range of one feature across the models of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FeatureRange {
    min: f64,
    max: f64,
}

impl FeatureRange {
    fn of(features: &[FeatureVector], key: MetricKey) -> Self {
        let (min, max) = features.iter().map(|f| f.get(key)).fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        );
        Self { min, max }
    }

    /// Tied features give every model full credit.
    fn normalize(&self, key: MetricKey, value: f64) -> f64 {
        if self.max == self.min {
            return 1.0;
        }
        let norm = (value - self.min) / (self.max - self.min);
        if key.lower_is_better() {
            1.0 - norm
        } else {
            norm
        }
    }
}

/// One row of the composite ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RankedModel {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub model_id: String,
    /// Weighted score, 0-100.
    pub composite_score: u32,
    /// Feature values as reported by the backend.
    pub raw: FeatureVector,
    /// Feature values after min-max normalization (and inversion).
    pub normalized: FeatureVector,
}

/// Output of [`rank`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ranking {
    pub entries: Vec<RankedModel>,
    /// Profile used, after clamping.
    pub weights: WeightProfile,
    /// All weights summed to zero; every composite score is 0.
    pub degenerate_weights: bool,
}

impl Ranking {
    pub fn leader(&self) -> Option<&RankedModel> {
        self.entries.first()
    }

    pub fn position_of(&self, model_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.model_id == model_id)
            .map(|e| e.rank)
    }
}

/// Rank models by weighted, normalized composite score.
///
/// Ties keep the input order, which callers pass in model selection order.
pub fn rank(model_results: &[ModelResult], weights: &WeightProfile) -> Ranking {
    let weights = weights.sanitized();
    let total_weight = weights.total();
    let degenerate_weights = total_weight == 0.0;
    if degenerate_weights && !model_results.is_empty() {
        tracing::warn!("Weight profile sums to zero; all composite scores collapse to 0");
    }

    let raw: Vec<FeatureVector> = model_results.iter().map(FeatureVector::from_result).collect();
    let ranges: Vec<(MetricKey, FeatureRange)> = MetricKey::ALL
        .iter()
        .map(|key| (*key, FeatureRange::of(&raw, *key)))
        .collect();

    let mut entries: Vec<RankedModel> = model_results
        .iter()
        .zip(raw.iter())
        .map(|(result, features)| {
            let mut normalized = FeatureVector::default();
            let mut score = 0.0;
            for (key, range) in &ranges {
                let norm = range.normalize(*key, features.get(*key));
                normalized.set(*key, norm);
                let share = if degenerate_weights {
                    0.0
                } else {
                    weights.get(*key) / total_weight
                };
                score += norm * share;
            }
            RankedModel {
                rank: 0,
                model_id: result.model_id.clone(),
                composite_score: (score * 100.0).round().clamp(0.0, 100.0) as u32,
                raw: *features,
                normalized,
            }
        })
        .collect();

    // Stable: equal scores keep selection order.
    entries.sort_by(|a, b| b.composite_score.cmp(&a.composite_score));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    tracing::debug!(
        models = entries.len(),
        leader = entries.first().map(|e| e.model_id.as_str()).unwrap_or(""),
        "Ranking computed"
    );

    Ranking {
        entries,
        weights,
        degenerate_weights,
    }
}
