//! Market-data sources
//!
//! A source answers one question: the daily rows for a symbol between two
//! dates. Sources may answer an unknown symbol with an empty table instead of
//! an error; the [`Loader`](crate::loader::Loader) turns that into `NoData`.

use std::cell::Cell;

use chrono::NaiveDate;

use crate::data::PriceTable;
use crate::error::Result;

pub mod csv;
pub mod yahoo;

pub use self::csv::{read_price_csv, CsvSource};
pub use self::yahoo::{parse_chart_response, YahooChartSource};

/// Provider of historical daily price rows
pub trait MarketDataSource {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch rows for `symbol` covering `[start, end)`
    fn download(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable>;
}

impl<S: MarketDataSource + ?Sized> MarketDataSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn download(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        (**self).download(symbol, start, end)
    }
}

/// In-memory source serving a fixed table
#[derive(Debug)]
pub struct StaticSource {
    table: PriceTable,
    calls: Cell<usize>,
}

impl StaticSource {
    pub fn new(table: PriceTable) -> Self {
        Self {
            table,
            calls: Cell::new(0),
        }
    }

    /// Number of `download` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MarketDataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn download(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        self.calls.set(self.calls.get() + 1);

        if !self.table.symbol().eq_ignore_ascii_case(symbol) {
            return Ok(PriceTable::new(symbol, Vec::new()));
        }
        let rows = self
            .table
            .rows()
            .iter()
            .filter(|r| r.date >= start && r.date < end)
            .cloned()
            .collect();
        Ok(PriceTable::new(symbol, rows))
    }
}
