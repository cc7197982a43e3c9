//! Pipe Lifetime Service Provider Interface
//!
//! Defines the data model, configuration tables, error type and the traits
//! behind which forecasters and the sequence-model training loop sit.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{Forecaster, SequenceModel, SequenceTrainer, TrendModel};
pub use error::{PredictionError, Result};
pub use model::{
    EnsembleWeights, ForecastFailure, ForecastOutcome, ForecastPoints, HorizonUncertainty,
    MaterialFactors, Measurement, NormalizedSeries, PipeStatus, PredictionRequest,
    PredictionResponse, PredictorConfig, RiskThresholds, SeriesPoint, SequenceConfig, Tier,
    TierPolicy, TrendConfig, UncertaintyConfig, YearlyPrediction, HORIZON_YEARS,
};
