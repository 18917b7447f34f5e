//! Metrics for evaluating in-sample forecast fit

use std::fmt;

use series_math::stats::{mean, root_mean_square};

use crate::reconcile::ReconciledRow;

/// Forecast accuracy over the days that have an observation
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, `None` if every actual is zero
    pub mape: Option<f64>,
    /// Fraction of actuals inside the uncertainty band
    pub coverage: f64,
    /// Number of observed days compared
    pub samples: usize,
}

impl ForecastAccuracy {
    /// `None` when no row carries an actual value
    pub fn from_rows(rows: &[ReconciledRow]) -> Option<Self> {
        let observed: Vec<(&ReconciledRow, f64)> = rows
            .iter()
            .filter_map(|r| r.actual.map(|a| (r, a)))
            .collect();
        if observed.is_empty() {
            return None;
        }

        let errors: Vec<f64> = observed.iter().map(|(r, a)| a - r.predicted).collect();
        let abs_errors: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
        let pct_errors: Vec<f64> = observed
            .iter()
            .zip(&abs_errors)
            .filter(|((_, a), _)| *a != 0.0)
            .map(|((_, a), e)| e / a.abs() * 100.0)
            .collect();
        let inside = observed.iter().filter(|(r, a)| r.in_band(*a)).count();

        Some(Self {
            mae: mean(&abs_errors).ok()?,
            rmse: root_mean_square(&errors).ok()?,
            mape: mean(&pct_errors).ok(),
            coverage: inside as f64 / observed.len() as f64,
            samples: observed.len(),
        })
    }
}

impl fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Accuracy ({} observed days):", self.samples)?;
        writeln!(f, "  MAE:      {:.4}", self.mae)?;
        writeln!(f, "  RMSE:     {:.4}", self.rmse)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:     {:.4}%", mape)?,
            None => writeln!(f, "  MAPE:     undefined")?,
        }
        writeln!(f, "  Coverage: {:.1}%", self.coverage * 100.0)?;
        Ok(())
    }
}
