//! Yahoo Finance chart endpoint
//!
//! `GET {base}/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d`
//! returns parallel arrays (timestamps plus one array per quote field) that are
//! zipped here into [`RawPriceRow`]s. Timestamps mark the session open in UTC;
//! shifting by the exchange `gmtoffset` recovers the trading date.

use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::data::{PriceTable, RawPriceRow};
use crate::error::{ForecastError, Result};
use crate::source::MarketDataSource;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// Decode a chart response body into a table.
///
/// A `Not Found` error or a null result decodes to an empty table; any other
/// provider error is reported as [`ForecastError::Parse`].
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<PriceTable> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            debug!(symbol, "provider reports symbol not found");
            return Ok(PriceTable::new(symbol, Vec::new()));
        }
        return Err(ForecastError::Parse(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceTable::new(symbol, Vec::new()));
    };

    let empty_quote = QuoteBlock::default();
    let quote = result.indicators.quote.first().unwrap_or(&empty_quote);
    let adjclose = result
        .indicators
        .adjclose
        .first()
        .map(|a| a.adjclose.as_slice())
        .unwrap_or(&[]);

    let mut rows = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let date = Utc
            .timestamp_opt(ts + result.meta.gmtoffset, 0)
            .single()
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ForecastError::Parse(format!("Invalid timestamp {}", ts)))?;

        rows.push(RawPriceRow {
            date,
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close: at(&quote.close, i),
            adj_close: at(adjclose, i),
            volume: at(&quote.volume, i),
        });
    }

    Ok(PriceTable::new(symbol, rows))
}

fn unix_seconds(date: NaiveDate) -> Result<i64> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ForecastError::InvalidParameter(format!("Invalid date {}", date)))?;
    Ok(Utc.from_utc_datetime(&midnight).timestamp())
}

/// Blocking client for the Yahoo Finance chart API
#[derive(Debug, Clone)]
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }
}

impl MarketDataSource for YahooChartSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    #[tracing::instrument(skip(self), fields(source = "yahoo"))]
    fn download(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        let period1 = unix_seconds(start)?.to_string();
        let period2 = unix_seconds(end)?.to_string();

        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("includeAdjustedClose", "true"),
            ])
            .send()?;

        // Unknown symbols come back as 404 with a chart error body
        let response = if response.status() == StatusCode::NOT_FOUND {
            response
        } else {
            response.error_for_status()?
        };
        let body = response.text()?;

        let table = parse_chart_response(symbol, &body)?;
        info!(rows = table.len(), "downloaded price history");
        Ok(table)
    }
}
