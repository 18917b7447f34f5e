//! Reconciling a model forecast with the observed series
//!
//! The model is fitted once, asked for predictions over the daily axis from
//! the first observation through the horizon end, and every predicted day is
//! left-joined against the observations on exact date equality.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::PreparedSeries;
use crate::error::{ForecastError, ModelError, Result};
use crate::horizon::{daily_axis, Horizon};
use crate::models::{Decomposition, FittedModel, ForecastModel};

/// Relative difference between a prediction and the observed value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentChange {
    Defined(f64),
    /// The actual value is zero or the ratio is not finite
    Undefined,
}

impl PercentChange {
    pub fn value(&self) -> Option<f64> {
        match self {
            PercentChange::Defined(v) => Some(*v),
            PercentChange::Undefined => None,
        }
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentChange::Defined(v) => write!(f, "{:.2}%", v),
            PercentChange::Undefined => f.write_str("undefined"),
        }
    }
}

/// `(predicted - actual) / actual * 100`
pub fn percent_change(actual: f64, predicted: f64) -> PercentChange {
    if actual == 0.0 {
        return PercentChange::Undefined;
    }
    let change = (predicted - actual) / actual * 100.0;
    if change.is_finite() {
        PercentChange::Defined(change)
    } else {
        PercentChange::Undefined
    }
}

/// One day of the reconciled view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub timestamp: NaiveDate,
    /// `None` for days without an observation
    pub actual: Option<f64>,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ReconciledRow {
    /// `None` when there is no observation for this day
    pub fn percent_change(&self) -> Option<PercentChange> {
        self.actual.map(|a| percent_change(a, self.predicted))
    }

    pub fn in_band(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }
}

/// The row for the run date, if the reconciled range covers it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentView {
    Available(ReconciledRow),
    NotAvailable,
}

impl fmt::Display for CurrentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentView::Available(row) => {
                write!(f, "{}: predicted {:.2}", row.timestamp, row.predicted)?;
                match row.actual {
                    Some(actual) => write!(
                        f,
                        ", actual {:.2}, change {}",
                        actual,
                        percent_change(actual, row.predicted)
                    ),
                    None => f.write_str(", actual not available"),
                }
            }
            CurrentView::NotAvailable => f.write_str("not available"),
        }
    }
}

/// Joined output of one reconciliation
#[derive(Debug, Clone)]
pub struct Reconciliation {
    model: String,
    rows: Vec<ReconciledRow>,
    decomposition: Option<Decomposition>,
    history_end: NaiveDate,
    horizon_end: NaiveDate,
}

impl Reconciliation {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn rows(&self) -> &[ReconciledRow] {
        &self.rows
    }

    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.decomposition.as_ref()
    }

    /// Last observed day
    pub fn history_end(&self) -> NaiveDate {
        self.history_end
    }

    pub fn horizon_end(&self) -> NaiveDate {
        self.horizon_end
    }

    /// Rows past the last observed day
    pub fn future_rows(&self) -> &[ReconciledRow] {
        let split = self.rows.partition_point(|r| r.timestamp <= self.history_end);
        &self.rows[split..]
    }

    /// Look up the row for `today`; absent dates are not an error
    pub fn current_view(&self, today: NaiveDate) -> CurrentView {
        self.rows
            .binary_search_by_key(&today, |r| r.timestamp)
            .map(|i| CurrentView::Available(self.rows[i]))
            .unwrap_or(CurrentView::NotAvailable)
    }
}

/// Fits a model and reconciles its forecast against the history
#[derive(Debug, Clone)]
pub struct ForecastReconciler<M> {
    model: M,
}

impl<M: ForecastModel> ForecastReconciler<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn failure(&self, source: ModelError) -> ForecastError {
        ForecastError::ForecastFailure {
            model: self.model.name().to_string(),
            source,
        }
    }

    #[tracing::instrument(skip_all, fields(symbol = series.symbol(), %horizon))]
    pub fn reconcile(&self, series: &PreparedSeries, horizon: Horizon) -> Result<Reconciliation> {
        let first = series.first_date();
        let history_end = series.last_date();
        let horizon_end = horizon.end_date(history_end)?;
        let axis = daily_axis(first, horizon_end);

        let fitted = self.model.fit(series).map_err(|e| self.failure(e))?;
        debug!(model = fitted.name(), "model fitted");

        let forecast = fitted.predict(&axis).map_err(|e| self.failure(e))?;
        if forecast.len() != axis.len() {
            return Err(self.failure(ModelError::Prediction(format!(
                "Expected {} predictions, got {}",
                axis.len(),
                forecast.len()
            ))));
        }

        // Components are display-only; the rows stand without them
        let decomposition = match fitted.decompose(&axis) {
            Ok(parts) => parts,
            Err(err) => {
                warn!(model = fitted.name(), error = %err, "decomposition unavailable");
                None
            }
        };

        let actuals: HashMap<NaiveDate, f64> = series
            .points()
            .iter()
            .map(|p| (p.timestamp, p.value))
            .collect();
        let mut rows: Vec<ReconciledRow> = forecast
            .into_iter()
            .map(|p| ReconciledRow {
                timestamp: p.timestamp,
                actual: actuals.get(&p.timestamp).copied(),
                predicted: p.predicted,
                lower_bound: p.lower_bound,
                upper_bound: p.upper_bound,
            })
            .collect();
        rows.sort_by_key(|r| r.timestamp);

        info!(
            rows = rows.len(),
            observed = actuals.len(),
            %horizon_end,
            "forecast reconciled"
        );
        Ok(Reconciliation {
            model: self.model.name().to_string(),
            rows,
            decomposition,
            history_end,
            horizon_end,
        })
    }
}
