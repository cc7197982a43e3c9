//! Per-forecaster output keyed by future pipe age

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::error::PredictionError;

/// Predicted thickness keyed by integer future age in years
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoints {
    by_age: BTreeMap<u32, f64>,
}

impl ForecastPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a predicted thickness for a future age
    pub fn insert(&mut self, age: u32, thickness: f64) {
        self.by_age.insert(age, thickness);
    }

    /// Thickness predicted for `age`, if this forecaster covered it
    pub fn get(&self, age: u32) -> Option<f64> {
        self.by_age.get(&age).copied()
    }

    /// Thickness predicted for `age`, or `fallback` when the age is missing
    pub fn get_or(&self, age: u32, fallback: f64) -> f64 {
        self.get(age).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.by_age.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_age.is_empty()
    }

    /// Iterate `(age, thickness)` pairs in ascending age order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.by_age.iter().map(|(&age, &value)| (age, value))
    }
}

impl FromIterator<(u32, f64)> for ForecastPoints {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self {
            by_age: iter.into_iter().collect(),
        }
    }
}

/// Reason a forecaster produced no points
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastFailure {
    /// Series too short for this forecaster
    #[error("not enough history: need {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Model fitting or training failed
    #[error("fit failed: {0}")]
    FitFailed(String),

    /// Model was fitted but could not produce predictions
    #[error("prediction failed: {0}")]
    PredictFailed(String),
}

impl ForecastFailure {
    /// Classify a fitting error, keeping data shortage distinct from numerical trouble
    pub fn from_fit_error(error: PredictionError) -> Self {
        match error {
            PredictionError::InsufficientData { required, actual } => {
                ForecastFailure::InsufficientData { required, actual }
            }
            other => ForecastFailure::FitFailed(other.to_string()),
        }
    }

    /// Wrap an error raised after a successful fit
    pub fn from_predict_error(error: PredictionError) -> Self {
        ForecastFailure::PredictFailed(error.to_string())
    }

    /// Whether the failure is only a lack of history
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ForecastFailure::InsufficientData { .. })
    }
}

/// Either the points a forecaster produced or why it produced none
pub type ForecastOutcome = std::result::Result<ForecastPoints, ForecastFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_falls_back_for_missing_age() {
        let mut points = ForecastPoints::new();
        points.insert(31, 18.5);

        assert_eq!(points.get_or(31, 20.0), 18.5);
        assert_eq!(points.get_or(32, 20.0), 20.0);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_iter_is_age_ordered() {
        let points: ForecastPoints = vec![(13, 1.0), (11, 3.0), (12, 2.0)].into_iter().collect();
        let ages: Vec<u32> = points.iter().map(|(age, _)| age).collect();
        assert_eq!(ages, vec![11, 12, 13]);
    }

    #[test]
    fn test_failure_from_fit_error_keeps_data_shortage() {
        let failure = ForecastFailure::from_fit_error(PredictionError::InsufficientData {
            required: 5,
            actual: 4,
        });
        assert!(failure.is_insufficient_data());

        let failure =
            ForecastFailure::from_fit_error(PredictionError::ConvergenceFailure { iterations: 7 });
        assert!(!failure.is_insufficient_data());
        assert_eq!(
            failure.to_string(),
            "fit failed: Optimization failed to converge after 7 iterations"
        );
    }

    #[test]
    fn test_failure_from_predict_error() {
        let failure = ForecastFailure::from_predict_error(PredictionError::NotFitted);
        assert_eq!(
            failure,
            ForecastFailure::PredictFailed("Model must be fitted before prediction".to_string())
        );
    }
}
