//! One forecast run: load, prepare, reconcile
//!
//! Runs are independent. Nothing is cached between them and a failure at any
//! stage aborts the run; callers show [`ForecastError::user_message`].

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::ForecastConfig;
use crate::data::{PreparedSeries, PriceField, PriceTable};
use crate::error::{ForecastError, Result};
use crate::horizon::Horizon;
use crate::loader::Loader;
use crate::metrics::ForecastAccuracy;
use crate::models::{AdditiveModel, ExponentialSmoothing, ModelKind};
use crate::prepare::prepare_series;
use crate::reconcile::{CurrentView, ForecastReconciler, Reconciliation};
use crate::source::MarketDataSource;

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub field: PriceField,
    pub horizon: Horizon,
    pub model: ModelKind,
}

impl RunRequest {
    /// Request for `symbol` using the configured defaults
    pub fn from_config(symbol: impl Into<String>, config: &ForecastConfig) -> Self {
        Self {
            symbol: symbol.into(),
            start: config.start,
            end: config.end,
            field: config.field,
            horizon: Horizon::Days(config.horizon_days),
            model: config.model,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: PriceTable,
    pub series: PreparedSeries,
    pub reconciliation: Reconciliation,
    pub current: CurrentView,
    pub accuracy: Option<ForecastAccuracy>,
}

/// Composes the loader, the preparer and the reconciler
#[derive(Debug)]
pub struct ForecastPipeline<S> {
    loader: Loader<S>,
    config: ForecastConfig,
}

impl<S: MarketDataSource> ForecastPipeline<S> {
    pub fn new(source: S, config: ForecastConfig) -> Self {
        Self {
            loader: Loader::new(source),
            config,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Execute one run; `today` selects the current view
    #[tracing::instrument(skip_all, fields(symbol = %request.symbol, model = %request.model))]
    pub fn run(&self, request: &RunRequest, today: NaiveDate) -> Result<RunReport> {
        let table = self
            .loader
            .load(&request.symbol, request.start, request.end)?;
        let series = prepare_series(&table, request.field)?;

        let reconciliation = match request.model {
            ModelKind::Additive => {
                let model = AdditiveModel::new()
                    .with_interval_width(self.config.interval_width)
                    .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
                ForecastReconciler::new(model).reconcile(&series, request.horizon)?
            }
            ModelKind::ExponentialSmoothing => {
                let model = ExponentialSmoothing::new(self.config.alpha)
                    .and_then(|m| m.with_interval_width(self.config.interval_width))
                    .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
                ForecastReconciler::new(model).reconcile(&series, request.horizon)?
            }
        };

        let current = reconciliation.current_view(today);
        if current == CurrentView::NotAvailable {
            info!(%today, "run date outside the reconciled range");
        }
        let accuracy = ForecastAccuracy::from_rows(reconciliation.rows());

        Ok(RunReport {
            table,
            series,
            reconciliation,
            current,
            accuracy,
        })
    }

    /// Execute one run, logging and converting a failure into the user message
    pub fn run_for_display(
        &self,
        request: &RunRequest,
        today: NaiveDate,
    ) -> std::result::Result<RunReport, String> {
        self.run(request, today).map_err(|err| {
            warn!(error = %err, symbol = %request.symbol, "forecast run failed");
            err.user_message()
        })
    }
}
