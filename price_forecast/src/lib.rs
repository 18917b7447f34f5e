//! # Price Forecast
//!
//! Fetch daily stock prices, prepare one column as a time series, fit a
//! forecasting model and reconcile its forecast against the history.
//!
//! ## Pipeline
//!
//! - **Loader**: one call to a [`MarketDataSource`] for `[start, end)`, rows
//!   normalised to one per date; an empty answer is `NoData`
//! - **Series preparation**: project a [`PriceField`], drop missing values,
//!   sort and de-duplicate
//! - **Reconciliation**: fit a [`ForecastModel`], predict one row per day from
//!   the first observation through the [`Horizon`], left-join the observations
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::{Local, NaiveDate};
//! use price_forecast::{ForecastConfig, ForecastPipeline, Horizon, PriceField, RunRequest};
//! use price_forecast::models::ModelKind;
//! use price_forecast::source::YahooChartSource;
//!
//! let config = ForecastConfig::default();
//! let source = YahooChartSource::new(&config.source)?;
//! let pipeline = ForecastPipeline::new(source, config);
//!
//! let request = RunRequest {
//!     symbol: "AAPL".to_string(),
//!     start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
//!     end: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
//!     field: PriceField::Close,
//!     horizon: Horizon::Days(365),
//!     model: ModelKind::Additive,
//! };
//! let report = pipeline.run(&request, Local::now().date_naive())?;
//! println!("{} rows, today: {}", report.reconciliation.rows().len(), report.current);
//! # Ok::<(), price_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod horizon;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod prepare;
pub mod reconcile;
pub mod source;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::data::{PreparedPoint, PreparedSeries, PriceField, PriceTable, RawPriceRow};
pub use crate::error::{ForecastError, ModelError, Result};
pub use crate::horizon::Horizon;
pub use crate::loader::Loader;
pub use crate::models::{FittedModel, ForecastModel, ForecastPoint};
pub use crate::pipeline::{ForecastPipeline, RunReport, RunRequest};
pub use crate::prepare::{prepare_series, SeriesPreparer};
pub use crate::reconcile::{
    percent_change, CurrentView, ForecastReconciler, PercentChange, Reconciliation, ReconciledRow,
};
pub use crate::source::MarketDataSource;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
