//! CSV price files
//!
//! Accepts the layouts produced by common download tools: a single header row
//! (`Date,Open,High,Low,Close,Adj Close,Volume`) or a multi-level export where
//! the header is followed by `Ticker` / `Date` rows before the data starts.
//! Header levels are joined per column and flattened into price fields.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::data::{
    flatten_label, split_label, ColumnLabel, LabelParts, PriceField, PriceTable, RawPriceRow,
};
use crate::error::{ForecastError, Result};
use crate::source::MarketDataSource;

fn parse_date(cell: &str) -> Option<NaiveDate> {
    let head = cell.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok()
}

/// Read a price CSV for `symbol`.
///
/// Unparseable numeric cells become `None`; rows whose date cell does not
/// parse are skipped. When several columns flatten to the same field (a
/// multi-symbol export), the column whose labels mention `symbol` wins. A
/// multi-level export whose price columns all name other tickers reads as an
/// empty table.
pub fn read_price_csv<R: Read>(symbol: &str, reader: R) -> Result<PriceTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let records = rdr
        .records()
        .collect::<std::result::Result<Vec<StringRecord>, _>>()?;

    let Some((header, body)) = records.split_first() else {
        return Ok(PriceTable::new(symbol, Vec::new()));
    };

    let date_hint = header
        .iter()
        .position(|l| flatten_label(l) == Some(ColumnLabel::Date))
        .unwrap_or(0);

    // Extra header levels sit between the header and the first dated row
    let levels = body
        .iter()
        .take_while(|r| r.get(date_hint).and_then(parse_date).is_none())
        .count();
    let (extra, data) = body.split_at(levels);

    let labels: Vec<String> = (0..header.len())
        .map(|i| {
            std::iter::once(header)
                .chain(extra)
                .map(|r| r.get(i).unwrap_or(""))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let parts: Vec<LabelParts> = labels
        .iter()
        .map(|l| split_label(l, Some(symbol)))
        .collect();
    let date_col = parts
        .iter()
        .position(|p| p.label == Some(ColumnLabel::Date))
        .unwrap_or(date_hint);

    let mut columns: HashMap<PriceField, usize> = HashMap::new();
    for (i, part) in parts.iter().enumerate() {
        if i == date_col {
            continue;
        }
        let Some(ColumnLabel::Field(field)) = part.label else {
            continue;
        };
        match columns.get(&field) {
            Some(&existing) if parts[existing].names(symbol) || !part.names(symbol) => {}
            _ => {
                columns.insert(field, i);
            }
        }
    }

    // A multi-level export tags every price column with its ticker
    let tagged = levels > 0 || header.iter().any(|cell| cell.starts_with('('));
    if tagged
        && !columns.is_empty()
        && columns.values().all(|&i| !parts[i].qualifiers.is_empty())
        && !columns.values().any(|&i| parts[i].names(symbol))
    {
        debug!(symbol, "file holds other tickers only");
        return Ok(PriceTable::new(symbol, Vec::new()));
    }

    if columns.is_empty() {
        return Err(ForecastError::Parse(format!(
            "No price columns recognised in header: {}",
            labels.join(", ")
        )));
    }

    let mut rows = Vec::with_capacity(data.len());
    let mut skipped = 0usize;
    for record in data {
        let Some(date) = record.get(date_col).and_then(parse_date) else {
            skipped += 1;
            continue;
        };
        let mut row = RawPriceRow::empty(date);
        for (&field, &col) in &columns {
            row.set(field, record.get(col).and_then(parse_number));
        }
        rows.push(row);
    }
    if skipped > 0 {
        debug!(skipped, "skipped CSV rows without a parseable date");
    }

    Ok(PriceTable::new(symbol, rows))
}

#[derive(Debug, Clone)]
enum CsvLocation {
    File(PathBuf),
    Directory(PathBuf),
}

/// Source reading CSV files from disk
#[derive(Debug, Clone)]
pub struct CsvSource {
    location: CsvLocation,
}

impl CsvSource {
    /// Serve every symbol from a single file
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            location: CsvLocation::File(path.as_ref().to_path_buf()),
        }
    }

    /// Serve `{dir}/{SYMBOL}.csv`
    pub fn directory<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            location: CsvLocation::Directory(dir.as_ref().to_path_buf()),
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        match &self.location {
            CsvLocation::File(path) => path.clone(),
            CsvLocation::Directory(dir) => dir.join(format!("{}.csv", symbol.to_ascii_uppercase())),
        }
    }
}

impl MarketDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    #[tracing::instrument(skip(self), fields(source = "csv"))]
    fn download(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        let path = self.path_for(symbol);
        if matches!(self.location, CsvLocation::Directory(_)) && !path.exists() {
            debug!(path = %path.display(), "no file for symbol");
            return Ok(PriceTable::new(symbol, Vec::new()));
        }

        let table = read_price_csv(symbol, File::open(&path)?)?;
        let rows = table
            .into_rows()
            .into_iter()
            .filter(|r| r.date >= start && r.date < end)
            .collect();
        Ok(PriceTable::new(symbol, rows))
    }
}
