//! Price data handling for forecasting
//!
//! The loader hands downstream stages a typed [`PriceTable`]: a named `date`
//! field per row plus one optional numeric value per [`PriceField`]. Source
//! adapters translate whatever column labels a provider uses through
//! [`flatten_label`], so compound labels never leak past the source boundary
//! and the date axis can never be mistaken for a price column.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Numeric columns a source can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl PriceField {
    /// Every field in display order
    pub const ALL: [PriceField; 6] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::AdjClose,
        PriceField::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::AdjClose => "adj_close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceField {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match flatten_label(s) {
            Some(ColumnLabel::Field(field)) => Ok(field),
            _ => Err(ForecastError::UnknownField(s.to_string())),
        }
    }
}

/// What a source column holds once its label has been flattened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLabel {
    /// The row's calendar date (the provider's index)
    Date,
    /// A numeric price column
    Field(PriceField),
}

/// Header words that carry no information about the column
const HEADER_WORDS: [&str; 4] = ["price", "ticker", "attributes", "symbols"];

/// A provider label split into what the column holds and the tokens around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParts {
    pub label: Option<ColumnLabel>,
    /// Lowercased tokens outside the matched label; a ticker for compound labels
    pub qualifiers: Vec<String>,
}

impl LabelParts {
    /// Whether one of the qualifiers is `symbol`
    pub fn names(&self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_ascii_lowercase();
        self.qualifiers.iter().any(|q| *q == symbol)
    }
}

fn label_tokens(label: &str) -> Vec<&str> {
    label
        .split(|c: char| {
            c.is_whitespace()
                || matches!(c, '(' | ')' | '[' | ']' | '\'' | '"' | ',' | '/' | '|' | '_')
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Label starting at `tokens[i]` and the number of tokens it spans
fn match_label(tokens: &[String], i: usize) -> Option<(ColumnLabel, usize)> {
    let next = tokens.get(i + 1).map(String::as_str);
    let (field, len) = match (tokens[i].as_str(), next) {
        ("adj" | "adjusted", Some("close")) => (PriceField::AdjClose, 2),
        ("adjclose" | "adj.close" | "adj-close", _) => (PriceField::AdjClose, 1),
        ("open", _) => (PriceField::Open, 1),
        ("high", _) => (PriceField::High, 1),
        ("low", _) => (PriceField::Low, 1),
        ("close", _) => (PriceField::Close, 1),
        ("volume", _) => (PriceField::Volume, 1),
        ("date" | "datetime" | "timestamp" | "ds", _) => return Some((ColumnLabel::Date, 1)),
        _ => return None,
    };
    Some((ColumnLabel::Field(field), len))
}

/// Split a provider column label for `symbol`.
///
/// Handles flat labels (`Close`, `Adj Close`), tuple-style compound labels in
/// either order (`('Close', 'AAPL')`, `('LOW', 'Close')`), joined compound
/// labels (`Close_AAPL`, `Price/Close`) and date-axis artifacts (`Date_`,
/// `('Date', '')`). When several tokens name a field, a token equal to
/// `symbol` is the last choice and a capitalised word (`Close`) wins over an
/// all-caps one, which is how tickers are written.
pub fn split_label(label: &str, symbol: Option<&str>) -> LabelParts {
    let raw = label_tokens(label);
    let lower: Vec<String> = raw.iter().map(|t| t.to_ascii_lowercase()).collect();
    let symbol = symbol.map(|s| s.trim().to_ascii_lowercase());

    let mut candidates: Vec<(ColumnLabel, usize, usize)> = Vec::new();
    let mut i = 0;
    while i < lower.len() {
        match match_label(&lower, i) {
            Some((label, len)) => {
                candidates.push((label, i, len));
                i += len;
            }
            None => i += 1,
        }
    }

    // Lower rank wins: the symbol itself last, all-caps words after others
    let rank = |start: usize| {
        let is_symbol = symbol.as_deref() == Some(lower[start].as_str());
        let all_caps = raw[start].chars().any(|c| c.is_ascii_alphabetic())
            && !raw[start].chars().any(|c| c.is_ascii_lowercase());
        2 * u8::from(is_symbol) + u8::from(all_caps)
    };
    let chosen = candidates
        .iter()
        .min_by_key(|(_, start, _)| rank(*start))
        .copied();

    let span = chosen.map_or(0..0, |(_, start, len)| start..start + len);
    let qualifiers = lower
        .iter()
        .enumerate()
        .filter(|(i, token)| !span.contains(i) && !HEADER_WORDS.contains(&token.as_str()))
        .map(|(_, token)| token.clone())
        .collect();

    LabelParts {
        label: chosen.map(|(label, _, _)| label),
        qualifiers,
    }
}

/// Flatten a provider column label into a [`ColumnLabel`].
///
/// Same rules as [`split_label`] without a symbol. Labels that name neither
/// the date axis nor a known price column yield `None`.
pub fn flatten_label(label: &str) -> Option<ColumnLabel> {
    split_label(label, None).label
}

/// One trading day for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawPriceRow {
    /// A row with every value missing
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            adj_close: None,
            volume: None,
        }
    }

    /// Value of a field, as delivered by the source (may be NaN)
    pub fn get(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close,
            PriceField::Volume => self.volume,
        }
    }

    pub fn set(&mut self, field: PriceField, value: Option<f64>) {
        let slot = match field {
            PriceField::Open => &mut self.open,
            PriceField::High => &mut self.high,
            PriceField::Low => &mut self.low,
            PriceField::Close => &mut self.close,
            PriceField::AdjClose => &mut self.adj_close,
            PriceField::Volume => &mut self.volume,
        };
        *slot = value;
    }
}

/// Rows fetched for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    symbol: String,
    rows: Vec<RawPriceRow>,
}

impl PriceTable {
    pub fn new(symbol: impl Into<String>, rows: Vec<RawPriceRow>) -> Self {
        Self {
            symbol: symbol.into(),
            rows,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rows(&self) -> &[RawPriceRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RawPriceRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The explicit date field of every row, in row order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// One field as a column aligned with [`PriceTable::dates`]
    pub fn column(&self, field: PriceField) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(field)).collect()
    }

    /// Fields holding at least one finite value
    pub fn available_fields(&self) -> Vec<PriceField> {
        PriceField::ALL
            .iter()
            .copied()
            .filter(|&field| {
                self.rows
                    .iter()
                    .any(|r| r.get(field).map_or(false, f64::is_finite))
            })
            .collect()
    }
}

/// A single observation of the prepared series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreparedPoint {
    pub timestamp: NaiveDate,
    pub value: f64,
}

impl PreparedPoint {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Model-ready series: non-empty, strictly ascending, finite values only
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    symbol: String,
    field: PriceField,
    points: Vec<PreparedPoint>,
}

impl PreparedSeries {
    /// Build a series, checking its invariants
    pub fn new(
        symbol: impl Into<String>,
        field: PriceField,
        points: Vec<PreparedPoint>,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(ForecastError::EmptySeries { field });
        }
        if let Some(p) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Non-finite value {} at {}",
                p.value, p.timestamp
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(ForecastError::InvalidParameter(format!(
                "Timestamps must be strictly ascending: {} is followed by {}",
                w[0].timestamp, w[1].timestamp
            )));
        }

        Ok(Self {
            symbol: symbol.into(),
            field,
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn field(&self) -> PriceField {
        self.field
    }

    pub fn points(&self) -> &[PreparedPoint] {
        &self.points
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// First historical day
    pub fn first_date(&self) -> NaiveDate {
        self.points[0].timestamp
    }

    /// Last historical day
    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].timestamp
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
