//! Loading historical rows from a market-data source

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::{PriceTable, RawPriceRow};
use crate::error::{ForecastError, Result};
use crate::source::MarketDataSource;

/// Fetches and normalises price tables
#[derive(Debug)]
pub struct Loader<S> {
    source: S,
}

impl<S: MarketDataSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load rows for `symbol` covering `[start, end)`.
    ///
    /// The result is ascending by date with one row per date (a repeated date
    /// keeps its last row). An empty answer from the source is `NoData`.
    #[tracing::instrument(skip(self), fields(source = self.source.name()))]
    pub fn load(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        if start >= end {
            return Err(ForecastError::InvalidRange { start, end });
        }

        let fetched = self.source.download(symbol, start, end)?;
        let received = fetched.len();

        let mut rows: Vec<RawPriceRow> = fetched
            .into_rows()
            .into_iter()
            .filter(|r| r.date >= start && r.date < end)
            .collect();
        // Stable sort keeps source order among equal dates, so the last one wins
        rows.sort_by_key(|r| r.date);
        let mut deduped: Vec<RawPriceRow> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(prev) if prev.date == row.date => *prev = row,
                _ => deduped.push(row),
            }
        }

        if deduped.is_empty() {
            return Err(ForecastError::NoData {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        if deduped.len() != received {
            debug!(
                received,
                kept = deduped.len(),
                "dropped out-of-range or repeated rows"
            );
        }

        info!(rows = deduped.len(), "loaded price history");
        Ok(PriceTable::new(symbol, deduped))
    }
}
