//! Simple exponential smoothing
//!
//! The level recursion is `level = alpha * value + (1 - alpha) * level`, seeded
//! with the first observation.

use serde::{Deserialize, Serialize};

use crate::{MathError, Result};

/// Streaming simple exponential smoothing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExponentialSmoothing {
    alpha: f64,
    level: Option<f64>,
    values_seen: usize,
}

impl ExponentialSmoothing {
    /// Create a smoother with alpha in (0, 1)
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(MathError::InvalidInput(
                "Alpha must be between 0 and 1 (exclusive)".to_string(),
            ));
        }

        Ok(Self {
            alpha,
            level: None,
            values_seen: 0,
        })
    }

    /// Feed one observation
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Cannot smooth non-finite value {}",
                value
            )));
        }

        self.values_seen += 1;
        self.level = Some(match self.level {
            None => value,
            Some(level) => self.alpha * value + (1.0 - self.alpha) * level,
        });

        Ok(())
    }

    /// Current smoothed level
    pub fn value(&self) -> Result<f64> {
        self.level.ok_or_else(|| {
            MathError::InsufficientData("No data available for exponential smoothing".to_string())
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn values_seen(&self) -> usize {
        self.values_seen
    }

    /// One-step-ahead predictions for a whole series.
    ///
    /// Entry `i` is the level after observing `values[..i]`; the first entry is
    /// the first observation itself. The final level is returned alongside.
    pub fn one_step_predictions(alpha: f64, values: &[f64]) -> Result<(Vec<f64>, f64)> {
        let first = *values.first().ok_or_else(|| {
            MathError::InsufficientData("Cannot smooth an empty series".to_string())
        })?;

        let mut smoother = Self::new(alpha)?;
        let mut predictions = Vec::with_capacity(values.len());
        smoother.update(first)?;
        predictions.push(first);
        for &value in &values[1..] {
            predictions.push(smoother.value()?);
            smoother.update(value)?;
        }

        Ok((predictions, smoother.value()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exponential_smoothing() {
        let mut es = ExponentialSmoothing::new(0.3).unwrap();
        assert!(es.value().is_err());

        es.update(10.0).unwrap(); // level = 10
        assert_relative_eq!(es.value().unwrap(), 10.0);

        es.update(20.0).unwrap(); // level = 0.3*20 + 0.7*10 = 13
        assert_relative_eq!(es.value().unwrap(), 13.0);
        assert_eq!(es.values_seen(), 2);
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(ExponentialSmoothing::new(0.0).is_err());
        assert!(ExponentialSmoothing::new(1.0).is_err());
        assert!(ExponentialSmoothing::new(f64::NAN).is_err());
        assert!(ExponentialSmoothing::new(0.5).is_ok());
    }

    #[test]
    fn test_one_step_predictions_lag_the_series() {
        let (predictions, level) =
            ExponentialSmoothing::one_step_predictions(0.5, &[10.0, 20.0, 30.0]).unwrap();

        assert_eq!(predictions, vec![10.0, 10.0, 15.0]);
        assert_relative_eq!(level, 22.5);
        assert!(ExponentialSmoothing::one_step_predictions(0.5, &[]).is_err());
    }
}
