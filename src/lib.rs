//! # Stock Forecast
//!
//! Workspace facade for the stock price forecasting pipeline.
//!
//! - [`price_forecast`]: loading, series preparation, models and reconciliation
//! - [`series_math`]: numeric kernels used by the models
//!
//! ## Example
//!
//! ```
//! use stock_forecast_workspace::price_forecast::{percent_change, PercentChange};
//!
//! assert_eq!(percent_change(100.0, 105.0).to_string(), "5.00%");
//! assert_eq!(percent_change(0.0, 105.0), PercentChange::Undefined);
//! ```

pub use price_forecast;
pub use series_math;
