//! Request and response records exchanged with the API layer

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::measurement::Measurement;
use super::prediction::YearlyPrediction;
use crate::error::{PredictionError, Result};

/// Input record for one pipe segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub pipe_id: Uuid,
    /// Material name, e.g. "steel" or "cast_iron"
    pub material: String,
    /// Current age of the pipe in years
    pub age_years: u32,
    /// Current wall thickness in mm
    pub current_wall_thickness: f64,
    /// Historical average corrosion rate in mm/year
    pub corrosion_rate_historical: f64,
    #[serde(default)]
    pub history_measurements: Vec<Measurement>,
    /// Reserved for environmental risk factors
    #[serde(default)]
    pub soil_type: Option<String>,
    /// Operating pressure in bar, reserved for future risk factors
    #[serde(default)]
    pub operating_pressure: Option<f64>,
}

impl PredictionRequest {
    /// Create a request with no history and no optional fields
    pub fn new(
        pipe_id: Uuid,
        material: &str,
        age_years: u32,
        current_wall_thickness: f64,
        corrosion_rate_historical: f64,
    ) -> Self {
        Self {
            pipe_id,
            material: material.to_string(),
            age_years,
            current_wall_thickness,
            corrosion_rate_historical,
            history_measurements: Vec::new(),
            soil_type: None,
            operating_pressure: None,
        }
    }

    /// Attach historical measurements
    pub fn with_history(mut self, history: Vec<Measurement>) -> Self {
        self.history_measurements = history;
        self
    }

    /// Check the field constraints the forecasting core relies on
    pub fn validate(&self) -> Result<()> {
        if !self.current_wall_thickness.is_finite() || self.current_wall_thickness <= 0.0 {
            return Err(PredictionError::InvalidRequest(format!(
                "current_wall_thickness must be a positive number, got {}",
                self.current_wall_thickness
            )));
        }
        if !self.corrosion_rate_historical.is_finite() || self.corrosion_rate_historical < 0.0 {
            return Err(PredictionError::InvalidRequest(format!(
                "corrosion_rate_historical must be non-negative, got {}",
                self.corrosion_rate_historical
            )));
        }
        if let Some(pressure) = self.operating_pressure {
            if !pressure.is_finite() || pressure <= 0.0 {
                return Err(PredictionError::InvalidRequest(format!(
                    "operating_pressure must be positive, got {}",
                    pressure
                )));
            }
        }
        if let Some(bad) = self
            .history_measurements
            .iter()
            .find(|m| !m.value.is_finite())
        {
            return Err(PredictionError::InvalidRequest(format!(
                "measurement on {} has a non-finite value",
                bad.date
            )));
        }
        Ok(())
    }
}

/// Output record for one pipe segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub pipe_id: Uuid,
    pub predictions: Vec<YearlyPrediction>,
    pub model_version: String,
    /// Overall confidence derived from history volume, in [0.7, 1.0]
    pub confidence_score: f64,
}
