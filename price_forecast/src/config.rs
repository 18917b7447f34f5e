//! Run configuration
//!
//! Defaults mirror the dashboard: a fixed ticker list, calendar year 2020,
//! the close price and a one-year horizon. Values can come from a JSON file
//! and/or `FORECAST_*` environment variables (a `.env` file is honoured).

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::PriceField;
use crate::error::{ForecastError, Result};
use crate::horizon::MAX_HORIZON_DAYS;
use crate::logging::LogFormat;
use crate::models::ModelKind;

pub const DEFAULT_TICKERS: [&str; 13] = [
    "AAPL", "MSFT", "GOOG", "GOOGL", "META", "TSLA", "NVDA", "ADBE", "PYPL", "INTC", "CMCSA",
    "NFLX", "PEP",
];

/// Connection settings for the HTTP market-data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 30,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

/// Settings for a forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Symbols offered for selection
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub field: PriceField,
    /// Days forecast past the last historical day
    pub horizon_days: u32,
    pub model: ModelKind,
    /// Smoothing factor for the exponential smoothing model
    pub alpha: f64,
    /// Probability mass inside the uncertainty band
    pub interval_width: f64,
    pub log_format: LogFormat,
    pub source: SourceConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or(NaiveDate::MAX),
            field: PriceField::Close,
            horizon_days: 365,
            model: ModelKind::Additive,
            alpha: 0.5,
            interval_width: 0.8,
            log_format: LogFormat::Pretty,
            source: SourceConfig::default(),
        }
    }
}

fn env_override<T>(key: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = env::var(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| ForecastError::Config(format!("{}={}: {}", key, raw, e)))?;
    }
    Ok(())
}

impl ForecastConfig {
    /// Load a JSON file; missing keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `FORECAST_*` environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FORECAST_*` environment variables on top of the current values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = env::var("FORECAST_TICKERS") {
            self.tickers = raw
                .split(',')
                .map(|t| t.trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        env_override("FORECAST_START", &mut self.start)?;
        env_override("FORECAST_END", &mut self.end)?;
        env_override("FORECAST_FIELD", &mut self.field)?;
        env_override("FORECAST_HORIZON_DAYS", &mut self.horizon_days)?;
        env_override("FORECAST_MODEL", &mut self.model)?;
        env_override("FORECAST_ALPHA", &mut self.alpha)?;
        env_override("FORECAST_INTERVAL_WIDTH", &mut self.interval_width)?;
        env_override("FORECAST_LOG_FORMAT", &mut self.log_format)?;
        env_override("FORECAST_BASE_URL", &mut self.source.base_url)?;
        env_override("FORECAST_TIMEOUT_SECS", &mut self.source.timeout_secs)?;
        env_override("FORECAST_USER_AGENT", &mut self.source.user_agent)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            return Err(ForecastError::Config(
                "At least one ticker is required".to_string(),
            ));
        }
        if self.start >= self.end {
            return Err(ForecastError::Config(format!(
                "Default start {} must be before end {}",
                self.start, self.end
            )));
        }
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(ForecastError::Config(format!(
                "horizon_days must be at most {}",
                MAX_HORIZON_DAYS
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::Config(
                "interval_width must be between 0 and 1".to_string(),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ForecastError::Config(
                "alpha must be between 0 and 1".to_string(),
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(ForecastError::Config(
                "source.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
