//! # Series Math
//!
//! Numeric building blocks for price forecasting.
//! This crate provides the least-squares solver, Fourier seasonality terms,
//! exponential smoothing and summary statistics used by the forecasting models.

use thiserror::Error;

pub mod fourier;
pub mod regression;
pub mod smoothing;
pub mod stats;

pub use fourier::fourier_terms;
pub use regression::LeastSquares;
pub use smoothing::ExponentialSmoothing;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
