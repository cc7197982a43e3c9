//! Immutable configuration tables for the forecasting engine
//!
//! Every threshold, weight and factor the algorithms consult lives here so it
//! can be tuned and tested without touching algorithm code. All structs accept
//! partial documents: missing keys keep their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::prediction::Tier;
use crate::error::{PredictionError, Result};

/// Number of yearly predictions produced per request
pub const HORIZON_YEARS: u32 = 5;

/// Thickness and probability thresholds used for risk scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Thickness (mm) below which a pipe is considered failed
    pub critical_thickness: f64,
    /// Thickness (mm) below which a pipe needs attention
    pub warning_thickness: f64,
    /// Failure probability at or above which a year is Critical
    pub critical_probability: f64,
    /// Failure probability at or above which a year is Warning
    pub warning_probability: f64,
    /// Upper clamp applied to computed failure probabilities
    pub max_failure_probability: f64,
    /// Floor (mm) applied to predicted thickness
    pub min_thickness: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical_thickness: 14.0,
            warning_thickness: 18.0,
            critical_probability: 0.8,
            warning_probability: 0.3,
            max_failure_probability: 0.99,
            min_thickness: 0.1,
        }
    }
}

/// Blend weights for the full-ensemble tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleWeights {
    pub trend: f64,
    pub sequence: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            trend: 0.4,
            sequence: 0.6,
        }
    }
}

/// Horizon-dependent uncertainty: `scale * (base + per_year * year)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonUncertainty {
    pub scale: f64,
    pub base: f64,
    pub per_year: f64,
    /// Floor (mm) applied to the lower confidence bound
    pub lower_floor: f64,
}

impl HorizonUncertainty {
    /// Uncertainty (mm) for a 1-based year offset
    pub fn at(&self, year: u32) -> f64 {
        self.scale * (self.base + self.per_year * year as f64)
    }
}

/// Uncertainty formula per tier
///
/// Deserializes field by field onto the per-tier defaults, so
/// `{"fallback": {"lower_floor": 0.1}}` only moves the fallback floor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UncertaintyConfig {
    pub full_ensemble: HorizonUncertainty,
    pub trend_only: HorizonUncertainty,
    /// The fallback lower bound is floored at 0.0 mm while the other tiers use
    /// 0.1 mm; kept as observed in production output.
    pub fallback: HorizonUncertainty,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            full_ensemble: HorizonUncertainty {
                scale: 1.0,
                base: 0.5,
                per_year: 0.15,
                lower_floor: 0.1,
            },
            trend_only: HorizonUncertainty {
                scale: 1.0,
                base: 0.6,
                per_year: 0.2,
                lower_floor: 0.1,
            },
            fallback: HorizonUncertainty {
                scale: 0.8,
                base: 1.0,
                per_year: 0.2,
                lower_floor: 0.0,
            },
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct HorizonUncertaintyPatch {
    scale: Option<f64>,
    base: Option<f64>,
    per_year: Option<f64>,
    lower_floor: Option<f64>,
}

impl HorizonUncertaintyPatch {
    fn apply(self, target: &mut HorizonUncertainty) {
        if let Some(scale) = self.scale {
            target.scale = scale;
        }
        if let Some(base) = self.base {
            target.base = base;
        }
        if let Some(per_year) = self.per_year {
            target.per_year = per_year;
        }
        if let Some(lower_floor) = self.lower_floor {
            target.lower_floor = lower_floor;
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct UncertaintyConfigPatch {
    full_ensemble: Option<HorizonUncertaintyPatch>,
    trend_only: Option<HorizonUncertaintyPatch>,
    fallback: Option<HorizonUncertaintyPatch>,
}

impl<'de> Deserialize<'de> for UncertaintyConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let patch = UncertaintyConfigPatch::deserialize(deserializer)?;
        let mut config = Self::default();
        if let Some(p) = patch.full_ensemble {
            p.apply(&mut config.full_ensemble);
        }
        if let Some(p) = patch.trend_only {
            p.apply(&mut config.trend_only);
        }
        if let Some(p) = patch.fallback {
            p.apply(&mut config.fallback);
        }
        Ok(config)
    }
}

impl UncertaintyConfig {
    /// Formula for a tier
    pub fn for_tier(&self, tier: Tier) -> &HorizonUncertainty {
        match tier {
            Tier::FullEnsemble => &self.full_ensemble,
            Tier::TrendOnly => &self.trend_only,
            Tier::Fallback => &self.fallback,
        }
    }
}

/// Minimum normalized-series lengths for each tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
    pub full_ensemble_min_points: usize,
    pub trend_only_min_points: usize,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            full_ensemble_min_points: 5,
            trend_only_min_points: 3,
        }
    }
}

impl TierPolicy {
    /// Tier for a normalized series of `len` points
    pub fn select(&self, len: usize) -> Tier {
        if len >= self.full_ensemble_min_points {
            Tier::FullEnsemble
        } else if len >= self.trend_only_min_points {
            Tier::TrendOnly
        } else {
            Tier::Fallback
        }
    }
}

/// Material-specific corrosion factors used by the fallback tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialFactors {
    /// Lower-case material name to factor
    pub factors: BTreeMap<String, f64>,
    /// Factor for materials missing from the table
    pub default_factor: f64,
}

impl Default for MaterialFactors {
    fn default() -> Self {
        let factors = [
            ("stainless_steel", 0.3),
            ("steel", 1.0),
            ("cast_iron", 1.2),
            ("ductile_iron", 0.9),
            ("pvc", 0.1),
            ("hdp", 0.1),
        ]
        .into_iter()
        .map(|(name, factor)| (name.to_string(), factor))
        .collect();

        Self {
            factors,
            default_factor: 1.0,
        }
    }
}

impl MaterialFactors {
    /// Case-insensitive factor lookup
    pub fn factor(&self, material: &str) -> f64 {
        self.factors
            .get(&material.to_lowercase())
            .copied()
            .unwrap_or(self.default_factor)
    }
}

/// Changepoint trend model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Scale of the Laplace prior on slope changes; smaller is stiffer
    pub changepoint_prior_scale: f64,
    /// Upper bound on candidate changepoints
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Solver iterations before the best iterate is kept
    pub max_iterations: usize,
    /// Relative objective change accepted as converged
    pub tolerance: f64,
    /// Spacing of future timestamps in days
    pub step_days: i64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: 0.05,
            n_changepoints: 25,
            changepoint_range: 0.8,
            max_iterations: 10_000,
            tolerance: 1e-7,
            step_days: 365,
        }
    }
}

/// Recurrent sequence model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub hidden_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// Longest input window; shorter series use `points - 1`
    pub max_window: usize,
    pub min_window: usize,
    pub min_training_pairs: usize,
    /// Added to the standard deviation before z-scoring
    pub std_epsilon: f64,
    /// Fixed RNG seed; `None` draws fresh entropy per request
    pub seed: Option<u64>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            hidden_size: 16,
            epochs: 50,
            learning_rate: 0.01,
            max_window: 3,
            min_window: 2,
            min_training_pairs: 2,
            std_epsilon: 1e-8,
            seed: None,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub thresholds: RiskThresholds,
    pub weights: EnsembleWeights,
    pub uncertainty: UncertaintyConfig,
    pub tiers: TierPolicy,
    pub materials: MaterialFactors,
    pub trend: TrendConfig,
    pub sequence: SequenceConfig,
}

fn invalid(name: &str, reason: &str) -> PredictionError {
    PredictionError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(name, "must be within [0, 1]"));
    }
    Ok(())
}

impl PredictorConfig {
    /// Reject tables that would break the output invariants
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        check_probability("thresholds.critical_probability", t.critical_probability)?;
        check_probability("thresholds.warning_probability", t.warning_probability)?;
        check_probability("thresholds.max_failure_probability", t.max_failure_probability)?;
        if t.warning_probability > t.critical_probability {
            return Err(invalid(
                "thresholds.warning_probability",
                "must not exceed critical_probability",
            ));
        }
        if !t.critical_thickness.is_finite() || t.critical_thickness > t.warning_thickness {
            return Err(invalid(
                "thresholds.critical_thickness",
                "must be finite and not exceed warning_thickness",
            ));
        }
        if !(t.min_thickness > 0.0) {
            return Err(invalid("thresholds.min_thickness", "must be positive"));
        }

        let w = &self.weights;
        if !(w.trend.is_finite() && w.sequence.is_finite()) || w.trend < 0.0 || w.sequence < 0.0 {
            return Err(invalid("weights", "must be finite and non-negative"));
        }
        if w.trend + w.sequence <= 0.0 {
            return Err(invalid("weights", "must not both be zero"));
        }

        for (name, u) in [
            ("uncertainty.full_ensemble", &self.uncertainty.full_ensemble),
            ("uncertainty.trend_only", &self.uncertainty.trend_only),
            ("uncertainty.fallback", &self.uncertainty.fallback),
        ] {
            if !(u.scale > 0.0 && u.per_year > 0.0 && u.base >= 0.0) {
                return Err(invalid(name, "scale and per_year must be positive, base non-negative"));
            }
            if !(u.lower_floor >= 0.0) {
                return Err(invalid(name, "lower_floor must be non-negative"));
            }
        }

        if self.tiers.trend_only_min_points >= self.tiers.full_ensemble_min_points {
            return Err(invalid(
                "tiers.trend_only_min_points",
                "must be below full_ensemble_min_points",
            ));
        }

        if self.materials.factors.values().any(|f| !f.is_finite() || *f < 0.0)
            || !self.materials.default_factor.is_finite()
            || self.materials.default_factor < 0.0
        {
            return Err(invalid("materials", "factors must be finite and non-negative"));
        }
        if self.materials.factors.keys().any(|k| *k != k.to_lowercase()) {
            return Err(invalid("materials.factors", "keys must be lower case"));
        }

        let tr = &self.trend;
        if !(tr.changepoint_prior_scale > 0.0) {
            return Err(invalid("trend.changepoint_prior_scale", "must be positive"));
        }
        if !(tr.changepoint_range > 0.0 && tr.changepoint_range <= 1.0) {
            return Err(invalid("trend.changepoint_range", "must be within (0, 1]"));
        }
        if tr.max_iterations == 0 || tr.step_days <= 0 {
            return Err(invalid(
                "trend",
                "max_iterations and step_days must be positive",
            ));
        }

        let s = &self.sequence;
        if s.hidden_size == 0 || s.epochs == 0 {
            return Err(invalid("sequence", "hidden_size and epochs must be positive"));
        }
        if !(s.learning_rate > 0.0) {
            return Err(invalid("sequence.learning_rate", "must be positive"));
        }
        if s.min_window == 0 || s.min_window > s.max_window {
            return Err(invalid(
                "sequence.min_window",
                "must be positive and not exceed max_window",
            ));
        }
        if s.min_training_pairs == 0 {
            return Err(invalid("sequence.min_training_pairs", "must be positive"));
        }

        Ok(())
    }
}
