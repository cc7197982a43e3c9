//! Prediction error types

use thiserror::Error;

/// Errors that can occur while fitting models or computing a forecast
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// Insufficient data points for the operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Model has not been fitted yet
    #[error("Model must be fitted before prediction")]
    NotFitted,

    /// Iterative fit did not settle within its iteration cap
    #[error("Optimization failed to converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Input data violates a contract (e.g. unrepresentable dates)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Request rejected by validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}
