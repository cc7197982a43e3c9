//! Yearly prediction model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk classification of a predicted year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipeStatus {
    Ok,
    Warning,
    Critical,
}

impl fmt::Display for PipeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipeStatus::Ok => "Ok",
            PipeStatus::Warning => "Warning",
            PipeStatus::Critical => "Critical",
        };
        write!(f, "{}", s)
    }
}

/// Forecasting strategy chosen from the amount of usable history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Trend and sequence forecasters blended by fixed weights
    FullEnsemble,
    /// Trend forecaster alone
    TrendOnly,
    /// Deterministic material-adjusted degradation rate
    Fallback,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::FullEnsemble => "full_ensemble",
            Tier::TrendOnly => "trend_only",
            Tier::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Prediction for a single year of the horizon
///
/// Thickness and bounds are in millimetres, rounded to 2 decimals;
/// the failure probability is rounded to 4 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyPrediction {
    /// Year offset from today, 1..=5
    pub year: u32,
    pub predicted_thickness: f64,
    pub conf_lower: f64,
    pub conf_upper: f64,
    /// Probability that thickness falls below the critical threshold
    pub failure_probability: f64,
    pub status: PipeStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_as_plain_names() {
        assert_eq!(serde_json::to_string(&PipeStatus::Ok).unwrap(), "\"Ok\"");
        assert_eq!(
            serde_json::to_string(&PipeStatus::Critical).unwrap(),
            "\"Critical\""
        );
        let parsed: PipeStatus = serde_json::from_str("\"Warning\"").unwrap();
        assert_eq!(parsed, PipeStatus::Warning);
    }

    #[test]
    fn test_status_rejects_unknown_names() {
        assert!(serde_json::from_str::<PipeStatus>("\"Unknown\"").is_err());
    }

    #[test]
    fn test_tier_display_matches_serde() {
        for tier in [Tier::FullEnsemble, Tier::TrendOnly, Tier::Fallback] {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{}\"", tier));
        }
    }

    #[test]
    fn test_yearly_prediction_roundtrip_fields() {
        let prediction = YearlyPrediction {
            year: 1,
            predicted_thickness: 19.9,
            conf_lower: 18.94,
            conf_upper: 20.86,
            failure_probability: 0.0,
            status: PipeStatus::Ok,
        };

        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json["year"], 1);
        assert_eq!(json["status"], "Ok");
        assert!(prediction.conf_lower <= prediction.predicted_thickness);
        assert!(prediction.predicted_thickness <= prediction.conf_upper);
    }
}
