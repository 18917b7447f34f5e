//! Forecast horizon policy
//!
//! Every horizon resolves to an end date relative to the last historical day:
//! a day count, a year count (365 days each) or an explicit date. An explicit
//! date earlier than the history collapses to the history itself. The
//! prediction axis always has one entry per calendar day from the first
//! historical day through the horizon end. Horizons past
//! [`MAX_HORIZON_DAYS`] are rejected.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Longest horizon accepted, in days (100 years)
pub const MAX_HORIZON_DAYS: u32 = 36_500;

/// How far past the history to forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Days(u32),
    Years(u32),
    Until(NaiveDate),
}

impl Horizon {
    /// Last day of the forecast given the last historical day
    pub fn end_date(&self, last_historical: NaiveDate) -> Result<NaiveDate> {
        let days = match *self {
            Horizon::Days(days) => i64::from(days),
            Horizon::Years(years) => 365 * i64::from(years),
            Horizon::Until(date) => (date - last_historical).num_days().max(0),
        };
        if days > i64::from(MAX_HORIZON_DAYS) {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon of {} days exceeds the maximum of {} days",
                days, MAX_HORIZON_DAYS
            )));
        }

        last_historical
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Horizon of {} days overflows the calendar",
                    days
                ))
            })
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon::Days(365)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizon::Days(days) => write!(f, "{} days", days),
            Horizon::Years(years) => write!(f, "{} years", years),
            Horizon::Until(date) => write!(f, "until {}", date),
        }
    }
}

/// One date per calendar day in `first..=end`
pub fn daily_axis(first: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    first.iter_days().take_while(|d| *d <= end).collect()
}
