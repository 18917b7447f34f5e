//! Additive trend + seasonality regression
//!
//! `y(d) = a + b·t(d) + weekly(d) + yearly(d)` where `t` rescales the history
//! to `[0, 1]` and each seasonality is a truncated Fourier series. Values are
//! divided by their maximum magnitude before fitting. Seasonal coefficients
//! carry a small ridge penalty so short histories stay solvable.

use chrono::{Datelike, NaiveDate};
use series_math::{fourier_terms, LeastSquares};

use crate::data::PreparedSeries;
use crate::error::ModelError;
use crate::models::{
    band_multiplier, require_points, Decomposition, FittedModel, ForecastModel, ForecastPoint,
    ModelResult,
};

const WEEKLY_PERIOD: f64 = 7.0;
const YEARLY_PERIOD: f64 = 365.25;

/// History spans (in days) at which seasonalities switch on automatically
const WEEKLY_MIN_SPAN: f64 = 14.0;
const YEARLY_MIN_SPAN: f64 = 730.0;

/// Additive model
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    name: String,
    /// `None` enables the component from the history span
    weekly: Option<bool>,
    yearly: Option<bool>,
    weekly_order: usize,
    yearly_order: usize,
    seasonality_penalty: f64,
    interval_width: f64,
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            name: "Additive (trend + seasonality)".to_string(),
            weekly: None,
            yearly: None,
            weekly_order: 3,
            yearly_order: 10,
            seasonality_penalty: 0.01,
            interval_width: 0.8,
        }
    }
}

impl AdditiveModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probability mass inside the uncertainty band, in (0, 1)
    pub fn with_interval_width(mut self, interval_width: f64) -> ModelResult<Self> {
        band_multiplier(interval_width)?;
        self.interval_width = interval_width;
        Ok(self)
    }

    pub fn with_weekly(mut self, enabled: bool) -> Self {
        self.weekly = Some(enabled);
        self
    }

    pub fn with_yearly(mut self, enabled: bool) -> Self {
        self.yearly = Some(enabled);
        self
    }

    /// Fourier orders for the weekly and yearly components
    pub fn with_orders(mut self, weekly: usize, yearly: usize) -> ModelResult<Self> {
        if weekly == 0 || yearly == 0 {
            return Err(ModelError::InvalidParameter(
                "Fourier orders must be positive".to_string(),
            ));
        }
        self.weekly_order = weekly;
        self.yearly_order = yearly;
        Ok(self)
    }
}

/// Fitted additive model
#[derive(Debug, Clone)]
pub struct TrainedAdditive {
    name: String,
    origin: NaiveDate,
    last_date: NaiveDate,
    span_days: f64,
    scale: f64,
    weekly_order: usize,
    yearly_order: usize,
    regression: LeastSquares,
    sigma: f64,
    z: f64,
}

/// Components of one prediction in scaled units
struct Components {
    trend: f64,
    weekly: f64,
    yearly: f64,
}

impl TrainedAdditive {
    fn features(&self, date: NaiveDate) -> Vec<f64> {
        feature_row(
            date,
            self.origin,
            self.span_days,
            self.weekly_order,
            self.yearly_order,
        )
    }

    fn components(&self, date: NaiveDate) -> Components {
        let row = self.features(date);
        let coef = self.regression.coefficients();
        let dot = |range: std::ops::Range<usize>| -> f64 {
            range.map(|i| row[i] * coef[i]).sum()
        };

        let weekly_end = 2 + 2 * self.weekly_order;
        let yearly_end = weekly_end + 2 * self.yearly_order;
        Components {
            trend: dot(0..2),
            weekly: dot(2..weekly_end),
            yearly: dot(weekly_end..yearly_end),
        }
    }

    pub fn weekly_enabled(&self) -> bool {
        self.weekly_order > 0
    }

    pub fn yearly_enabled(&self) -> bool {
        self.yearly_order > 0
    }

    /// In-sample residual standard deviation in price units
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

fn feature_row(
    date: NaiveDate,
    origin: NaiveDate,
    span_days: f64,
    weekly_order: usize,
    yearly_order: usize,
) -> Vec<f64> {
    let t = (date - origin).num_days() as f64 / span_days;
    let day = date.num_days_from_ce() as f64;

    let mut row = Vec::with_capacity(2 + 2 * (weekly_order + yearly_order));
    row.push(1.0);
    row.push(t);
    row.extend(fourier_terms(day, WEEKLY_PERIOD, weekly_order));
    row.extend(fourier_terms(day, YEARLY_PERIOD, yearly_order));
    row
}

impl ForecastModel for AdditiveModel {
    type Fitted = TrainedAdditive;

    fn fit(&self, series: &PreparedSeries) -> ModelResult<Self::Fitted> {
        require_points(series, 2)?;

        let origin = series.first_date();
        let last_date = series.last_date();
        let span_days = (last_date - origin).num_days() as f64;

        let weekly_order = if self.weekly.unwrap_or(span_days >= WEEKLY_MIN_SPAN) {
            self.weekly_order
        } else {
            0
        };
        let yearly_order = if self.yearly.unwrap_or(span_days >= YEARLY_MIN_SPAN) {
            self.yearly_order
        } else {
            0
        };

        let values = series.values();
        let max_abs = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let scale = if max_abs > 0.0 { max_abs } else { 1.0 };
        let targets: Vec<f64> = values.iter().map(|v| v / scale).collect();

        let design: Vec<Vec<f64>> = series
            .timestamps()
            .into_iter()
            .map(|d| feature_row(d, origin, span_days, weekly_order, yearly_order))
            .collect();
        let columns = 2 + 2 * (weekly_order + yearly_order);
        let mut penalties = vec![self.seasonality_penalty; columns];
        penalties[0] = 0.0;
        penalties[1] = 0.0;

        let regression = LeastSquares::fit(&design, &targets, &penalties)?;

        Ok(TrainedAdditive {
            name: self.name.clone(),
            origin,
            last_date,
            span_days,
            scale,
            weekly_order,
            yearly_order,
            sigma: regression.residual_std() * scale,
            regression,
            z: band_multiplier(self.interval_width)?,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedModel for TrainedAdditive {
    fn predict(&self, timestamps: &[NaiveDate]) -> ModelResult<Vec<ForecastPoint>> {
        let mut points = Vec::with_capacity(timestamps.len());
        for &timestamp in timestamps {
            let row = self.features(timestamp);
            let predicted = self.regression.predict(&row)? * self.scale;

            // Band widens with distance past the history
            let ahead = (timestamp - self.last_date).num_days().max(0) as f64;
            let half_width = self.z * self.sigma * (1.0 + ahead / self.span_days).sqrt();

            points.push(ForecastPoint {
                timestamp,
                predicted,
                lower_bound: predicted - half_width,
                upper_bound: predicted + half_width,
            });
        }
        Ok(points)
    }

    fn decompose(&self, timestamps: &[NaiveDate]) -> ModelResult<Option<Decomposition>> {
        let parts: Vec<Components> = timestamps.iter().map(|&d| self.components(d)).collect();
        let scaled = |f: fn(&Components) -> f64| -> Vec<f64> {
            parts.iter().map(|c| f(c) * self.scale).collect()
        };

        Ok(Some(Decomposition {
            timestamps: timestamps.to_vec(),
            trend: scaled(|c| c.trend),
            weekly: self.weekly_enabled().then(|| scaled(|c| c.weekly)),
            yearly: self.yearly_enabled().then(|| scaled(|c| c.yearly)),
            holidays: None,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PreparedPoint, PriceField};
    use approx::assert_abs_diff_eq;
    use chrono::Duration;

    fn linear_series(days: i64) -> PreparedSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let points = (0..days)
            .map(|i| PreparedPoint::new(start + Duration::days(i), 100.0 + 0.5 * i as f64))
            .collect();
        PreparedSeries::new("TEST", PriceField::Close, points).unwrap()
    }

    #[test]
    fn test_recovers_linear_trend() {
        let series = linear_series(10);
        let fitted = AdditiveModel::new().fit(&series).unwrap();

        assert!(!fitted.weekly_enabled());
        assert!(!fitted.yearly_enabled());

        let next = series.last_date() + Duration::days(1);
        let forecast = fitted.predict(&[next]).unwrap();
        assert_abs_diff_eq!(forecast[0].predicted, 105.0, epsilon = 1e-6);
    }

    #[test]
    fn test_weekly_component_switches_on_with_span() {
        let fitted = AdditiveModel::new().fit(&linear_series(30)).unwrap();
        assert!(fitted.weekly_enabled());
        assert!(!fitted.yearly_enabled());

        let forced = AdditiveModel::new()
            .with_weekly(false)
            .fit(&linear_series(30))
            .unwrap();
        assert!(!forced.weekly_enabled());
    }

    #[test]
    fn test_decomposition_sums_to_prediction() {
        let series = linear_series(60);
        let fitted = AdditiveModel::new().fit(&series).unwrap();
        let axis = series.timestamps();

        let points = fitted.predict(&axis).unwrap();
        let parts = fitted.decompose(&axis).unwrap().unwrap();
        let weekly = parts.weekly.as_ref().unwrap();

        assert!(parts.yearly.is_none());
        for (i, p) in points.iter().enumerate() {
            assert_abs_diff_eq!(p.predicted, parts.trend[i] + weekly[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rejects_single_point() {
        let series = PreparedSeries::new(
            "TEST",
            PriceField::Close,
            vec![PreparedPoint::new(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(), 1.0)],
        )
        .unwrap();
        assert!(matches!(
            AdditiveModel::new().fit(&series),
            Err(ModelError::InsufficientData(_))
        ));
    }
}
