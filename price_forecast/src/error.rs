//! Error types for the price_forecast crate

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

use crate::data::PriceField;

/// Errors raised by a forecasting model during fit, predict or decompose
#[derive(Debug, Error)]
pub enum ModelError {
    /// Not enough observations to fit the model
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Model constructed with an out-of-range parameter
    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),

    /// Numeric failure inside the model
    #[error("Math error: {0}")]
    Math(#[from] series_math::MathError),

    /// Prediction could not be produced for the requested axis
    #[error("Prediction error: {0}")]
    Prediction(String),
}

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The requested range is empty or reversed
    #[error("Invalid date range: start {start} must be before end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The market-data source returned nothing for the request
    #[error("No data returned for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Every row of the selected field was missing or non-numeric
    #[error("No numeric values available for field '{field}'")]
    EmptySeries { field: PriceField },

    /// The forecasting model failed during fit or predict
    #[error("Forecast with {model} failed: {source}")]
    ForecastFailure {
        model: String,
        #[source]
        source: ModelError,
    },

    /// A field label that does not name a price column
    #[error("Unknown price field: {0}")]
    UnknownField(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload from a source could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the CSV reader
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}

impl ForecastError {
    /// Message shown to the user when a run aborts
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::InvalidRange { .. } => {
                "Error: the end date must fall after the start date.".to_string()
            }
            ForecastError::NoData { symbol, .. } => format!(
                "No data found for {}. Check the ticker and the selected date range.",
                symbol
            ),
            ForecastError::EmptySeries { field } => format!(
                "The '{}' column has no numeric values in the selected range.",
                field
            ),
            ForecastError::ForecastFailure { model, source } => {
                format!("The {} forecast could not be produced: {}", model, source)
            }
            ForecastError::UnknownField(label) => format!(
                "'{}' cannot be forecast. Choose one of: {}.",
                label,
                PriceField::ALL
                    .iter()
                    .map(|f| f.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ForecastError::Http(_) => {
                "The market-data service could not be reached. Try again later.".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}
