//! Pipelife Consumer API
//!
//! Configuration loading, predictor construction and the request-level
//! service.
//!
//! This crate provides:
//! - JSON configuration loading with validation
//! - A builder for [`PipeLifetimePredictor`]
//! - Single and parallel batch prediction with confidence scoring
//! - Re-exports from SPI and core for convenience

pub mod config;
pub mod service;

pub use config::{config_from_json, config_from_path, PredictorBuilder};
pub use service::{
    confidence_score, DetailedPrediction, PipeLifetimePredictor, ServiceInfo, MODEL_VERSION,
};

// Re-export from core
pub use pipelife_core::{
    dispatcher, ensemble, normalizer, risk, sequence, trend, TieredDispatcher, TieredForecast,
};

// Re-export types from SPI
pub use pipelife_spi::{
    ForecastFailure, Measurement, PipeStatus, PredictionError, PredictionRequest,
    PredictionResponse, PredictorConfig, Result, Tier, YearlyPrediction,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        config_from_json, config_from_path, confidence_score, DetailedPrediction,
        PipeLifetimePredictor, PredictorBuilder, ServiceInfo, MODEL_VERSION,
    };
    pub use pipelife_spi::{
        ForecastFailure, Forecaster, Measurement, PipeStatus, PredictionError, PredictionRequest,
        PredictionResponse, PredictorConfig, Result, Tier, YearlyPrediction,
    };
}
