use chrono::NaiveDate;
use price_forecast::data::{flatten_label, ColumnLabel};
use price_forecast::source::{CsvSource, StaticSource};
use price_forecast::{
    prepare_series, ForecastError, Loader, MarketDataSource, PriceField, PriceTable, RawPriceRow,
    SeriesPreparer,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn row(date: NaiveDate, close: Option<f64>) -> RawPriceRow {
    let mut row = RawPriceRow::empty(date);
    row.set(PriceField::Close, close);
    row.set(PriceField::Open, close.map(|c| c - 1.0));
    row
}

// Helper function to write a simple price file
fn create_price_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();

    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    writeln!(file, "2021-01-04,133.5,133.6,126.8,129.4,127.2,143301900").unwrap();
    writeln!(file, "2021-01-05,128.9,131.7,128.4,131.0,128.7,97664900").unwrap();
    writeln!(file, "2021-01-06,127.7,131.1,126.4,126.6,124.4,155088000").unwrap();
    writeln!(file, "2021-01-07,128.4,131.6,127.9,130.9,128.6,109578200").unwrap();
    writeln!(file, "2021-01-08,132.4,132.6,130.2,132.1,129.8,105158200").unwrap();

    file
}

#[rstest]
#[case("Close", Some(ColumnLabel::Field(PriceField::Close)))]
#[case("Adj Close", Some(ColumnLabel::Field(PriceField::AdjClose)))]
#[case("('Close', 'AAPL')", Some(ColumnLabel::Field(PriceField::Close)))]
#[case("Volume_AAPL", Some(ColumnLabel::Field(PriceField::Volume)))]
#[case("Date_", Some(ColumnLabel::Date))]
#[case("('Date', '')", Some(ColumnLabel::Date))]
#[case("('LOW', 'Close')", Some(ColumnLabel::Field(PriceField::Close)))]
#[case("('Close', 'LOW')", Some(ColumnLabel::Field(PriceField::Close)))]
#[case("Dividends", None)]
fn test_flatten_label(#[case] label: &str, #[case] expected: Option<ColumnLabel>) {
    assert_eq!(flatten_label(label), expected);
}

#[test]
fn test_price_field_from_label() {
    assert_eq!("adj_close".parse::<PriceField>().unwrap(), PriceField::AdjClose);
    assert_eq!("Close".parse::<PriceField>().unwrap(), PriceField::Close);
    assert!(matches!(
        "Date".parse::<PriceField>(),
        Err(ForecastError::UnknownField(_))
    ));
}

#[test]
fn test_csv_file_source_filters_range() {
    let file = create_price_file();
    let source = CsvSource::file(file.path());

    let table = source
        .download("AAPL", day(2021, 1, 5), day(2021, 1, 8))
        .unwrap();

    assert_eq!(table.symbol(), "AAPL");
    assert_eq!(
        table.dates(),
        vec![day(2021, 1, 5), day(2021, 1, 6), day(2021, 1, 7)]
    );
    assert_eq!(table.rows()[0].adj_close, Some(128.7));
}

#[test]
fn test_csv_directory_source() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("MSFT.csv"),
        "Date,Close\n2021-01-04,217.7\n2021-01-05,217.9\n",
    )
    .unwrap();
    let source = CsvSource::directory(dir.path());

    let table = source
        .download("msft", day(2021, 1, 1), day(2021, 2, 1))
        .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.available_fields(), vec![PriceField::Close]);

    // Unknown tickers have no file and come back empty
    let missing = source
        .download("ZZZZ", day(2021, 1, 1), day(2021, 2, 1))
        .unwrap();
    assert!(missing.is_empty());
}

#[test]
fn test_csv_file_source_checks_ticker() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Ticker,LOW,LOW").unwrap();
    writeln!(file, "Price,Close,Open").unwrap();
    writeln!(file, "Date,,").unwrap();
    writeln!(file, "2021-01-04,240.1,238.0").unwrap();
    writeln!(file, "2021-01-05,242.3,240.5").unwrap();
    let source = CsvSource::file(file.path());

    let table = source
        .download("LOW", day(2021, 1, 1), day(2021, 2, 1))
        .unwrap();
    assert_eq!(table.column(PriceField::Close), vec![Some(240.1), Some(242.3)]);

    let loader = Loader::new(source);
    assert!(matches!(
        loader.load("AAPL", day(2021, 1, 1), day(2021, 2, 1)),
        Err(ForecastError::NoData { .. })
    ));
}

#[test]
fn test_loader_normalises_rows() {
    let table = PriceTable::new(
        "AAPL",
        vec![
            row(day(2021, 1, 6), Some(103.0)),
            row(day(2021, 1, 4), Some(100.0)),
            row(day(2021, 1, 5), Some(101.0)),
            row(day(2021, 1, 5), Some(102.0)),
        ],
    );
    let loader = Loader::new(StaticSource::new(table));

    let loaded = loader
        .load("AAPL", day(2021, 1, 1), day(2021, 1, 31))
        .unwrap();

    assert_eq!(loader.source().calls(), 1);
    assert_eq!(
        loaded.dates(),
        vec![day(2021, 1, 4), day(2021, 1, 5), day(2021, 1, 6)]
    );
    // Later duplicate wins
    assert_eq!(loaded.rows()[1].close, Some(102.0));
}

#[test]
fn test_loader_rejects_reversed_range_without_fetching() {
    let loader = Loader::new(StaticSource::new(PriceTable::new("AAPL", vec![])));

    let result = loader.load("AAPL", day(2021, 2, 1), day(2021, 1, 1));

    assert!(matches!(result, Err(ForecastError::InvalidRange { .. })));
    assert_eq!(loader.source().calls(), 0);
}

#[test]
fn test_loader_reports_no_data() {
    let table = PriceTable::new("AAPL", vec![row(day(2021, 1, 4), Some(100.0))]);
    let loader = Loader::new(StaticSource::new(table));

    match loader.load("MSFT", day(2021, 1, 1), day(2021, 1, 31)) {
        Err(ForecastError::NoData { symbol, .. }) => assert_eq!(symbol, "MSFT"),
        other => panic!("expected NoData, got {:?}", other),
    }
}

#[test]
fn test_prepare_series_skips_missing_values() {
    let table = PriceTable::new(
        "AAPL",
        vec![
            row(day(2021, 1, 4), Some(100.0)),
            row(day(2021, 1, 5), None),
            row(day(2021, 1, 6), Some(f64::NAN)),
            row(day(2021, 1, 7), Some(103.0)),
        ],
    );

    let series = prepare_series(&table, PriceField::Close).unwrap();

    assert_eq!(series.timestamps(), vec![day(2021, 1, 4), day(2021, 1, 7)]);
    assert_eq!(series.values(), vec![100.0, 103.0]);
    assert_eq!(series.field(), PriceField::Close);
}

#[test]
fn test_prepare_series_empty_column() {
    let table = PriceTable::new("AAPL", vec![row(day(2021, 1, 4), Some(100.0))]);

    let result = prepare_series(&table, PriceField::Volume);

    assert!(matches!(
        result,
        Err(ForecastError::EmptySeries {
            field: PriceField::Volume
        })
    ));
}

#[test]
fn test_series_preparer_from_label() {
    let table = PriceTable::new("AAPL", vec![row(day(2021, 1, 4), Some(100.0))]);

    let preparer = SeriesPreparer::for_label("Open").unwrap();
    let series = preparer.prepare(&table).unwrap();
    assert_eq!(series.values(), vec![99.0]);

    assert!(SeriesPreparer::for_label("Dividends").is_err());
}
