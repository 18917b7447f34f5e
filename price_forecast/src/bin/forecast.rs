use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser};
use price_forecast::export::write_rows_csv;
use price_forecast::horizon::MAX_HORIZON_DAYS;
use price_forecast::logging::init_logging;
use price_forecast::models::ModelKind;
use price_forecast::source::{CsvSource, MarketDataSource, YahooChartSource};
use price_forecast::{
    ForecastConfig, ForecastPipeline, Horizon, PriceField, ReconciledRow, RunReport, RunRequest,
};
use tracing::warn;

/// Forecast a daily stock price series and reconcile it with the history
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about)]
#[command(group(ArgGroup::new("horizon").args(["days", "years", "until"])))]
struct Cli {
    /// Ticker to forecast (default: first configured ticker)
    #[arg(long)]
    symbol: Option<String>,

    /// First day of history
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = NaiveDate::from_str)]
    start: Option<NaiveDate>,

    /// Day after the last day of history
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = NaiveDate::from_str)]
    end: Option<NaiveDate>,

    /// open, high, low, close, adj_close or volume
    #[arg(long, value_parser = PriceField::from_str)]
    field: Option<PriceField>,

    /// Forecast N days past the history
    #[arg(long, value_name = "N",
          value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_HORIZON_DAYS)))]
    days: Option<u32>,

    /// Forecast N years (365 days each) past the history
    #[arg(long, value_name = "N",
          value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_HORIZON_DAYS / 365)))]
    years: Option<u32>,

    /// Forecast through a date
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = NaiveDate::from_str)]
    until: Option<NaiveDate>,

    /// additive or exponential_smoothing
    #[arg(long, value_parser = ModelKind::from_str)]
    model: Option<ModelKind>,

    /// Read prices from a CSV file or a directory of SYMBOL.csv
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write the reconciled table to CSV
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Rows shown from each end of the table
    #[arg(long, value_name = "N", default_value_t = 5)]
    rows: usize,

    /// Print the configured tickers and exit
    #[arg(long)]
    list_tickers: bool,
}

impl Cli {
    fn horizon(&self) -> Option<Horizon> {
        self.days
            .map(Horizon::Days)
            .or(self.years.map(Horizon::Years))
            .or(self.until.map(Horizon::Until))
    }
}

fn print_rows(rows: &[ReconciledRow]) {
    println!(
        "  {:<10}  {:>12}  {:>12}  {:>12}  {:>12}",
        "date", "actual", "predicted", "lower", "upper"
    );
    for row in rows {
        let actual = row
            .actual
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<10}  {:>12}  {:>12.2}  {:>12.2}  {:>12.2}",
            row.timestamp, actual, row.predicted, row.lower_bound, row.upper_bound
        );
    }
}

fn print_report(report: &RunReport, preview: usize) {
    let rec = &report.reconciliation;
    let fields: Vec<&str> = report
        .table
        .available_fields()
        .iter()
        .map(|f| f.as_str())
        .collect();

    println!("Stock Price Forecast");
    println!("====================");
    println!("Symbol:   {}", report.table.symbol());
    println!("Model:    {}", rec.model());
    println!(
        "History:  {} rows loaded ({}), {} usable '{}' values",
        report.table.len(),
        fields.join(", "),
        report.series.len(),
        report.series.field()
    );
    println!(
        "Forecast: {} through {} ({} future days)",
        rec.rows().len(),
        rec.horizon_end(),
        rec.future_rows().len()
    );
    println!();

    let rows = rec.rows();
    if rows.len() <= 2 * preview {
        print_rows(rows);
    } else {
        print_rows(&rows[..preview]);
        println!("  ...");
        print_rows(&rows[rows.len() - preview..]);
    }
    println!();

    println!("Today: {}", report.current);
    if let Some(accuracy) = &report.accuracy {
        println!();
        print!("{}", accuracy);
    }

    if let Some(parts) = rec.decomposition() {
        if let (Some(first), Some(last)) = (parts.trend.first(), parts.trend.last()) {
            println!();
            println!("Trend: {:.2} -> {:.2}", first, last);
            println!(
                "Seasonality: weekly {}, yearly {}",
                if parts.weekly.is_some() { "on" } else { "off" },
                if parts.yearly.is_some() { "on" } else { "off" }
            );
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> price_forecast::Result<ForecastConfig> {
    match path {
        Some(path) => {
            let mut config = ForecastConfig::from_json_file(path)?;
            config.apply_env()?;
            config.validate()?;
            Ok(config)
        }
        None => ForecastConfig::from_env(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.user_message());
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_format);

    if cli.list_tickers {
        for ticker in &config.tickers {
            println!("{}", ticker);
        }
        return ExitCode::SUCCESS;
    }

    let symbol = cli
        .symbol
        .as_deref()
        .map(str::to_ascii_uppercase)
        .or_else(|| config.tickers.first().cloned())
        .unwrap_or_default();
    if !config.tickers.contains(&symbol) {
        warn!(%symbol, "symbol is not in the configured ticker list");
    }

    let mut request = RunRequest::from_config(symbol, &config);
    request.start = cli.start.unwrap_or(request.start);
    request.end = cli.end.unwrap_or(request.end);
    request.field = cli.field.unwrap_or(request.field);
    request.horizon = cli.horizon().unwrap_or(request.horizon);
    request.model = cli.model.unwrap_or(request.model);

    let source: Box<dyn MarketDataSource> = match &cli.csv {
        Some(path) if path.is_dir() => Box::new(CsvSource::directory(path)),
        Some(path) => Box::new(CsvSource::file(path)),
        None => match YahooChartSource::new(&config.source) {
            Ok(source) => Box::new(source),
            Err(err) => {
                eprintln!("{}", err.user_message());
                return ExitCode::FAILURE;
            }
        },
    };

    let pipeline = ForecastPipeline::new(source, config);
    let report = match pipeline.run_for_display(&request, Local::now().date_naive()) {
        Ok(report) => report,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    print_report(&report, cli.rows);

    if let Some(out) = &cli.out {
        if let Err(err) = write_rows_csv(report.reconciliation.rows(), out) {
            eprintln!("Failed to write {}: {}", out.display(), err);
            return ExitCode::FAILURE;
        }
        println!();
        println!("Exported forecast to {}", out.display());
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parse_typed_flags() {
        let cli = Cli::try_parse_from([
            "forecast", "--symbol", "aapl", "--start", "2021-01-01", "--field", "adj_close",
            "--years", "2", "--model", "ses",
        ])
        .unwrap();

        assert_eq!(cli.start, NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(cli.field, Some(PriceField::AdjClose));
        assert_eq!(cli.model, Some(ModelKind::ExponentialSmoothing));
        assert_eq!(cli.horizon(), Some(Horizon::Years(2)));
        assert_eq!(cli.rows, 5);
    }

    #[test]
    fn test_horizon_flags_are_exclusive() {
        let err = Cli::try_parse_from(["forecast", "--days", "30", "--years", "1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["forecast", "--days", "90000000"]).is_err());
        assert!(Cli::try_parse_from(["forecast", "--field", "date"]).is_err());
        assert!(Cli::try_parse_from(["forecast", "--until", "tomorrow"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
