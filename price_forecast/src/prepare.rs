//! Turning a price table into a model-ready series

use tracing::debug;

use crate::data::{PreparedPoint, PreparedSeries, PriceField, PriceTable};
use crate::error::{ForecastError, Result};

/// Project `table` onto one field.
///
/// Missing and non-finite values are dropped rather than failing the run; the
/// remaining points are sorted by date and a repeated date keeps its last
/// value. Fails with `EmptySeries` when nothing survives.
pub fn prepare_series(table: &PriceTable, field: PriceField) -> Result<PreparedSeries> {
    let mut points: Vec<PreparedPoint> = table
        .rows()
        .iter()
        .filter_map(|row| {
            row.get(field)
                .filter(|v| v.is_finite())
                .map(|value| PreparedPoint::new(row.date, value))
        })
        .collect();

    let dropped = table.len() - points.len();
    if points.is_empty() {
        return Err(ForecastError::EmptySeries { field });
    }

    points.sort_by_key(|p| p.timestamp);
    let mut unique: Vec<PreparedPoint> = Vec::with_capacity(points.len());
    for point in points {
        match unique.last_mut() {
            Some(prev) if prev.timestamp == point.timestamp => *prev = point,
            _ => unique.push(point),
        }
    }

    debug!(
        symbol = table.symbol(),
        %field,
        kept = unique.len(),
        dropped,
        "prepared series"
    );
    PreparedSeries::new(table.symbol(), field, unique)
}

/// Series preparer bound to one target field
#[derive(Debug, Clone, Copy)]
pub struct SeriesPreparer {
    field: PriceField,
}

impl SeriesPreparer {
    pub fn new(field: PriceField) -> Self {
        Self { field }
    }

    /// Build a preparer from a user-facing label; date-axis labels are rejected
    pub fn for_label(label: &str) -> Result<Self> {
        Ok(Self::new(label.parse()?))
    }

    pub fn field(&self) -> PriceField {
        self.field
    }

    pub fn prepare(&self, table: &PriceTable) -> Result<PreparedSeries> {
        prepare_series(table, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawPriceRow;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn table(closes: &[(u32, Option<f64>)]) -> PriceTable {
        let rows = closes
            .iter()
            .map(|&(day, close)| {
                let mut row = RawPriceRow::empty(d(day));
                row.close = close;
                row
            })
            .collect();
        PriceTable::new("AAPL", rows)
    }

    #[test]
    fn test_drops_missing_and_non_finite_values() {
        let t = table(&[
            (4, Some(1.0)),
            (5, None),
            (6, Some(f64::NAN)),
            (7, Some(f64::INFINITY)),
            (8, Some(2.0)),
        ]);
        let series = prepare_series(&t, PriceField::Close).unwrap();

        assert_eq!(series.timestamps(), vec![d(4), d(8)]);
        assert_eq!(series.values(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_resorts_and_deduplicates() {
        let t = table(&[(8, Some(3.0)), (4, Some(1.0)), (8, Some(4.0))]);
        let series = prepare_series(&t, PriceField::Close).unwrap();

        assert_eq!(series.timestamps(), vec![d(4), d(8)]);
        assert_eq!(series.values(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_all_missing_is_empty_series() {
        let t = table(&[(4, None), (5, Some(f64::NAN))]);
        assert!(matches!(
            prepare_series(&t, PriceField::Close),
            Err(ForecastError::EmptySeries {
                field: PriceField::Close
            })
        ));
        assert!(matches!(
            prepare_series(&t, PriceField::Volume),
            Err(ForecastError::EmptySeries { .. })
        ));
    }

    #[test]
    fn test_date_label_cannot_be_selected() {
        assert!(SeriesPreparer::for_label("Date_").is_err());
        assert_eq!(
            SeriesPreparer::for_label("Adj Close").unwrap().field(),
            PriceField::AdjClose
        );
    }
}
