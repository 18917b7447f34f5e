//! Exponential smoothing model for daily price series

use chrono::NaiveDate;
use series_math::stats::root_mean_square;

use crate::data::PreparedSeries;
use crate::error::ModelError;
use crate::models::{
    band_multiplier, require_points, FittedModel, ForecastModel, ForecastPoint, ModelResult,
};

/// Simple exponential smoothing model
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    /// Name of the model
    name: String,
    /// Smoothing parameter
    alpha: f64,
    interval_width: f64,
}

/// Trained exponential smoothing model
#[derive(Debug, Clone)]
pub struct TrainedExponentialSmoothing {
    /// Name of the model
    name: String,
    /// Smoothing parameter
    alpha: f64,
    /// Historical dates, ascending
    dates: Vec<NaiveDate>,
    /// One-step-ahead prediction for each historical date
    fitted: Vec<f64>,
    /// Level after observing each historical date
    levels: Vec<f64>,
    /// Residual scale of the one-step predictions
    sigma: f64,
    z: f64,
}

impl ExponentialSmoothing {
    /// Create a new exponential smoothing model
    pub fn new(alpha: f64) -> ModelResult<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ModelError::InvalidParameter(
                "Alpha must be between 0 and 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Exponential Smoothing (alpha={})", alpha),
            alpha,
            interval_width: 0.8,
        })
    }

    pub fn with_interval_width(mut self, interval_width: f64) -> ModelResult<Self> {
        band_multiplier(interval_width)?;
        self.interval_width = interval_width;
        Ok(self)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl ForecastModel for ExponentialSmoothing {
    type Fitted = TrainedExponentialSmoothing;

    fn fit(&self, series: &PreparedSeries) -> ModelResult<Self::Fitted> {
        require_points(series, 2)?;

        let values = series.values();
        let (fitted, level) =
            series_math::ExponentialSmoothing::one_step_predictions(self.alpha, &values)?;

        // levels[i] is the prediction for i + 1; the last one is the final level
        let mut levels: Vec<f64> = fitted[1..].to_vec();
        levels.push(level);

        let residuals: Vec<f64> = values[1..]
            .iter()
            .zip(&fitted[1..])
            .map(|(actual, predicted)| actual - predicted)
            .collect();

        Ok(TrainedExponentialSmoothing {
            name: self.name.clone(),
            alpha: self.alpha,
            dates: series.timestamps(),
            fitted,
            levels,
            sigma: root_mean_square(&residuals)?,
            z: band_multiplier(self.interval_width)?,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedExponentialSmoothing {
    /// Final smoothed level, the flat out-of-sample forecast
    pub fn level(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }
}

impl FittedModel for TrainedExponentialSmoothing {
    fn predict(&self, timestamps: &[NaiveDate]) -> ModelResult<Vec<ForecastPoint>> {
        let last = self.dates[self.dates.len() - 1];

        Ok(timestamps
            .iter()
            .map(|&timestamp| {
                // Dates between observations carry the level known at that point
                let predicted = match self.dates.binary_search(&timestamp) {
                    Ok(i) => self.fitted[i],
                    Err(0) => self.fitted[0],
                    Err(i) => self.levels[i - 1],
                };

                let steps = (timestamp - last).num_days().max(1) as f64;
                let half_width =
                    self.z * self.sigma * (1.0 + (steps - 1.0) * self.alpha * self.alpha).sqrt();

                ForecastPoint {
                    timestamp,
                    predicted,
                    lower_bound: predicted - half_width,
                    upper_bound: predicted + half_width,
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PreparedPoint, PriceField};
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn series(values: &[f64]) -> PreparedSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| PreparedPoint::new(start + Duration::days(2 * i as i64), v))
            .collect();
        PreparedSeries::new("TEST", PriceField::Close, points).unwrap()
    }

    #[test]
    fn test_flat_out_of_sample_forecast() {
        let data = series(&[100.0, 102.0, 104.0, 103.0, 105.0]);
        let fitted = ExponentialSmoothing::new(0.7).unwrap().fit(&data).unwrap();

        let last = data.last_date();
        let axis = [last + Duration::days(1), last + Duration::days(30)];
        let forecast = fitted.predict(&axis).unwrap();

        assert_relative_eq!(forecast[0].predicted, fitted.level());
        assert_relative_eq!(forecast[1].predicted, fitted.level());
        let near = forecast[0].upper_bound - forecast[0].lower_bound;
        let far = forecast[1].upper_bound - forecast[1].lower_bound;
        assert!(far > near);
    }

    #[test]
    fn test_gap_days_use_level_known_so_far() {
        let data = series(&[10.0, 20.0, 30.0]);
        let fitted = ExponentialSmoothing::new(0.5).unwrap().fit(&data).unwrap();

        // Observations sit on Jan 2, 4 and 6
        let day = |d| NaiveDate::from_ymd_opt(2023, 1, d).unwrap();
        let forecast = fitted.predict(&[day(2), day(3), day(4), day(5)]).unwrap();
        let values: Vec<f64> = forecast.iter().map(|p| p.predicted).collect();

        assert_eq!(values, vec![10.0, 10.0, 10.0, 15.0]);
    }

    #[test]
    fn test_parameter_validation() {
        assert!(ExponentialSmoothing::new(1.5).is_err());
        assert!(ExponentialSmoothing::new(0.0).is_err());
        assert!(ExponentialSmoothing::new(0.3)
            .unwrap()
            .with_interval_width(0.0)
            .is_err());
    }
}
