//! Pipelife Core
//!
//! History normalization, the changepoint trend and LSTM sequence
//! forecasters, risk scoring, ensembling and tiered dispatch.

pub mod dispatcher;
pub mod ensemble;
pub mod normalizer;
pub mod risk;
pub mod sequence;
pub mod trend;

// Re-export SPI traits for implementations
pub use pipelife_spi::{
    ForecastFailure, ForecastOutcome, ForecastPoints, Forecaster, PredictionError, Result,
    SequenceModel, SequenceTrainer, TrendModel,
};

// Re-export main types
pub use dispatcher::{TieredDispatcher, TieredForecast};
pub use ensemble::RiskScorer;
pub use normalizer::{normalize_history, production_date};
pub use risk::{classify, failure_probability};
pub use sequence::{LstmNetwork, LstmTrainer, SequenceForecaster};
pub use trend::{ChangepointTrend, TrendForecaster};
