//! Model module containing data structures

mod config;
mod forecast_points;
mod measurement;
mod prediction;
mod request;

pub use config::{
    EnsembleWeights, HorizonUncertainty, MaterialFactors, PredictorConfig, RiskThresholds,
    SequenceConfig, TierPolicy, TrendConfig, UncertaintyConfig, HORIZON_YEARS,
};
pub use forecast_points::{ForecastFailure, ForecastOutcome, ForecastPoints};
pub use measurement::{Measurement, NormalizedSeries, SeriesPoint};
pub use prediction::{PipeStatus, Tier, YearlyPrediction};
pub use request::{PredictionRequest, PredictionResponse};
