//! Error types for the covid_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the covid_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Series too short for the requested model or seasonal period
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Error from invalid parameters, e.g. multiplicative components on non-positive data
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No candidate model could be fitted
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    Data(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from reading the case count CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from reading or writing JSON configuration and metrics
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from parsing a date label
    #[error("Date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}
