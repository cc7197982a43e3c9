//! Pipelife Facade
//!
//! High-level API for five-year pipe wall-thickness forecasting. Re-exports
//! all public types from the pipelife stack for convenient usage.

// Re-export everything from API (which includes SPI and core)
pub use pipelife_api::*;

// Explicit re-exports for documentation
pub use pipelife_api::prelude;

// Re-export core components for direct access
pub use pipelife_core::{
    classify, failure_probability, normalize_history, production_date, ChangepointTrend,
    LstmNetwork, LstmTrainer, RiskScorer, SequenceForecaster, TrendForecaster,
};

// Re-export SPI traits and model
pub use pipelife_spi::{
    EnsembleWeights, ForecastOutcome, ForecastPoints, Forecaster, HorizonUncertainty,
    MaterialFactors, NormalizedSeries, RiskThresholds, SequenceConfig, SequenceModel,
    SequenceTrainer, SeriesPoint, TierPolicy, TrendConfig, TrendModel, UncertaintyConfig,
    HORIZON_YEARS,
};
