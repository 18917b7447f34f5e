//! Data frames and CSV output for the presentation layer

use std::fs::File;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::data::{PriceField, PriceTable};
use crate::error::Result;
use crate::reconcile::ReconciledRow;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_series(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Series> {
    let days: Vec<i32> = dates
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}

/// Loaded rows as a frame: `date` plus one column per price field
pub fn table_to_dataframe(table: &PriceTable) -> Result<DataFrame> {
    let mut columns = vec![date_series("date", table.rows().iter().map(|r| r.date))?];
    for field in PriceField::ALL {
        columns.push(Series::new(field.as_str(), table.column(field)));
    }
    Ok(DataFrame::new(columns)?)
}

/// Reconciled rows as `ds, actual, predicted, lower, upper`
pub fn rows_to_dataframe(rows: &[ReconciledRow]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        date_series("ds", rows.iter().map(|r| r.timestamp))?,
        Series::new("actual", rows.iter().map(|r| r.actual).collect::<Vec<_>>()),
        Series::new(
            "predicted",
            rows.iter().map(|r| r.predicted).collect::<Vec<_>>(),
        ),
        Series::new(
            "lower",
            rows.iter().map(|r| r.lower_bound).collect::<Vec<_>>(),
        ),
        Series::new(
            "upper",
            rows.iter().map(|r| r.upper_bound).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

/// Write reconciled rows to a CSV file with a header row
pub fn write_rows_csv<P: AsRef<Path>>(rows: &[ReconciledRow], path: P) -> Result<()> {
    let mut df = rows_to_dataframe(rows)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
    Ok(())
}
