//! Ensembling and per-year risk scoring
//!
//! Turns per-age thickness forecasts into the five emitted
//! [`YearlyPrediction`]s. Missing ages fall back to the current thickness.

use pipelife_spi::{
    EnsembleWeights, ForecastPoints, HorizonUncertainty, PredictorConfig, RiskThresholds, Tier,
    YearlyPrediction, HORIZON_YEARS,
};

use crate::risk::{classify, failure_probability, round_to};

/// Weighted blend of trend and sequence forecasts per horizon year
pub fn blend(
    trend: &ForecastPoints,
    sequence: &ForecastPoints,
    weights: &EnsembleWeights,
    current_age: u32,
    current_thickness: f64,
) -> Vec<f64> {
    (1..=HORIZON_YEARS)
        .map(|year| {
            let age = current_age + year;
            weights.trend * trend.get_or(age, current_thickness)
                + weights.sequence * sequence.get_or(age, current_thickness)
        })
        .collect()
}

/// Single forecast per horizon year, missing ages at `current_thickness`
pub fn single(points: &ForecastPoints, current_age: u32, current_thickness: f64) -> Vec<f64> {
    (1..=HORIZON_YEARS)
        .map(|year| points.get_or(current_age + year, current_thickness))
        .collect()
}

/// Deterministic degradation: `current + slope * year`, floored
pub fn linear_decay(current_thickness: f64, slope: f64, floor: f64) -> Vec<f64> {
    (1..=HORIZON_YEARS)
        .map(|year| (current_thickness + slope * year as f64).max(floor))
        .collect()
}

/// Scores predicted thicknesses with a tier's uncertainty formula
#[derive(Debug, Clone)]
pub struct RiskScorer {
    thresholds: RiskThresholds,
    uncertainty: HorizonUncertainty,
}

impl RiskScorer {
    pub fn new(thresholds: RiskThresholds, uncertainty: HorizonUncertainty) -> Self {
        Self {
            thresholds,
            uncertainty,
        }
    }

    pub fn for_tier(config: &PredictorConfig, tier: Tier) -> Self {
        Self::new(
            config.thresholds.clone(),
            config.uncertainty.for_tier(tier).clone(),
        )
    }

    /// One prediction for a 1-based year offset
    ///
    /// Probability and status are computed from unrounded values; rounding
    /// happens only on the emitted fields.
    pub fn score(&self, year: u32, thickness: f64) -> YearlyPrediction {
        let thickness = thickness.max(self.thresholds.min_thickness);
        let uncertainty = self.uncertainty.at(year);
        let lower = (thickness - uncertainty).max(self.uncertainty.lower_floor);
        let upper = thickness + uncertainty;

        let probability = failure_probability(thickness, uncertainty, &self.thresholds);
        let status = classify(probability, thickness, &self.thresholds);

        YearlyPrediction {
            year,
            predicted_thickness: round_to(thickness, 2),
            conf_lower: round_to(lower, 2),
            conf_upper: round_to(upper, 2),
            failure_probability: round_to(probability, 4),
            status,
        }
    }

    /// Predictions for years `1..=n` in order
    pub fn score_all(&self, thicknesses: &[f64]) -> Vec<YearlyPrediction> {
        thicknesses
            .iter()
            .zip(1..)
            .map(|(&thickness, year)| self.score(year, thickness))
            .collect()
    }
}
