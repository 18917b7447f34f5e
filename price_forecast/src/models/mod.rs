//! Forecasting models for daily price series
//!
//! A model is fitted once on a [`PreparedSeries`] and the fitted handle is
//! then asked for predictions over an arbitrary axis of dates. The reconciler
//! only depends on these two traits, so models can be swapped or mocked.

use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::data::PreparedSeries;
use crate::error::{ForecastError, ModelError};

pub mod additive;
pub mod exponential_smoothing;

pub use additive::AdditiveModel;
pub use exponential_smoothing::ExponentialSmoothing;

/// Result type for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Model output for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Additive components behind a forecast, aligned with `timestamps`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub timestamps: Vec<NaiveDate>,
    pub trend: Vec<f64>,
    /// `None` when weekly seasonality was not fitted
    pub weekly: Option<Vec<f64>>,
    /// `None` when yearly seasonality was not fitted
    pub yearly: Option<Vec<f64>>,
    pub holidays: Option<Vec<f64>>,
}

/// A model fitted to one series
pub trait FittedModel: Debug {
    /// Point estimate and uncertainty band for each date, in input order
    fn predict(&self, timestamps: &[NaiveDate]) -> ModelResult<Vec<ForecastPoint>>;

    /// Component breakdown for display; models without one return `None`
    fn decompose(&self, _timestamps: &[NaiveDate]) -> ModelResult<Option<Decomposition>> {
        Ok(None)
    }

    fn name(&self) -> &str;
}

/// Forecast model that can be fitted on a prepared series
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    fn fit(&self, series: &PreparedSeries) -> ModelResult<Self::Fitted>;

    fn name(&self) -> &str;
}

/// Models selectable at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Additive,
    ExponentialSmoothing,
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "additive" | "prophet" => Ok(ModelKind::Additive),
            "exponential_smoothing" | "ses" | "es" => Ok(ModelKind::ExponentialSmoothing),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown model: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Additive => f.write_str("additive"),
            ModelKind::ExponentialSmoothing => f.write_str("exponential_smoothing"),
        }
    }
}

/// Half-width multiplier of a central normal interval holding `interval_width`
pub fn band_multiplier(interval_width: f64) -> ModelResult<f64> {
    if !(interval_width > 0.0 && interval_width < 1.0) {
        return Err(ModelError::InvalidParameter(format!(
            "Interval width must be between 0 and 1, got {}",
            interval_width
        )));
    }
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + interval_width / 2.0))
}

/// Reject series too short for a model
pub(crate) fn require_points(series: &PreparedSeries, min: usize) -> ModelResult<()> {
    if series.len() < min {
        return Err(ModelError::InsufficientData(format!(
            "Need at least {} distinct timestamps, got {}",
            min,
            series.len()
        )));
    }
    Ok(())
}
