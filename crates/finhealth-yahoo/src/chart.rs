//! Chart API payloads and their conversion into an OHLCV frame.

use chrono::{NaiveDate, TimeZone, Utc};
use finhealth_core::{DataError, DataFrequency, Result, Symbol};
use polars::prelude::*;
use serde::Deserialize;

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const SECONDS_PER_DAY: i64 = 86_400;

/// Chart API response.
#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

/// Error object embedded in Yahoo payloads.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub(crate) code: String,
    pub(crate) description: String,
}

impl ApiError {
    /// Maps the embedded error onto a [`DataError`].
    pub(crate) fn into_data_error(self, symbol: &Symbol) -> DataError {
        if self.code == "Not Found" {
            DataError::SymbolNotFound(symbol.to_string())
        } else {
            DataError::Other(format!("{}: {}", self.code, self.description))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Builds the chart API URL for a symbol and inclusive date range.
pub(crate) fn build_chart_url(
    symbol: &Symbol,
    start: NaiveDate,
    end: NaiveDate,
    frequency: DataFrequency,
) -> String {
    let start_ts = start
        .and_hms_opt(0, 0, 0)
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
        .unwrap_or(0);

    let end_ts = end
        .and_hms_opt(23, 59, 59)
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
        .unwrap_or(0);

    let interval = match frequency {
        DataFrequency::Daily => "1d",
        DataFrequency::Weekly => "1wk",
        DataFrequency::Monthly => "1mo",
    };

    format!(
        "{}/{}?period1={}&period2={}&interval={}&includeAdjustedClose=true",
        CHART_API_URL,
        symbol.as_str(),
        start_ts,
        end_ts,
        interval
    )
}

/// Converts a chart response into a frame with columns
/// `symbol, date, open, high, low, close, volume, adjusted_close`.
pub(crate) fn parse_chart_response(symbol: &Symbol, response: ChartResponse) -> Result<DataFrame> {
    if let Some(error) = response.chart.error {
        return Err(error.into_data_error(symbol));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    if timestamps.is_empty() {
        return Err(DataError::unavailable(symbol, "no price history in range"));
    }

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::Parse("Missing quote data".to_string()))?;

    let rows = timestamps.len();
    let columns = [&quote.open, &quote.high, &quote.low, &quote.close];
    if columns.iter().any(|c| c.len() != rows) || quote.volume.len() != rows {
        return Err(DataError::Parse(format!(
            "quote arrays do not match {rows} timestamps"
        )));
    }

    // Exchange timestamps fall inside the trading day, so flooring to whole
    // days yields the session date.
    let dates: Vec<i32> = timestamps
        .iter()
        .map(|&ts| ts.div_euclid(SECONDS_PER_DAY) as i32)
        .collect();

    let adj_close = result
        .indicators
        .adjclose
        .and_then(|ac| ac.into_iter().next())
        .map(|ac| ac.adjclose)
        .filter(|ac| ac.len() == rows)
        .unwrap_or_else(|| quote.close.clone());

    let date_col = Column::new("date".into(), dates)
        .cast(&DataType::Date)
        .map_err(|e| DataError::Other(e.to_string()))?;

    DataFrame::new(vec![
        Column::new("symbol".into(), vec![symbol.as_str(); rows]),
        date_col,
        Column::new("open".into(), quote.open),
        Column::new("high".into(), quote.high),
        Column::new("low".into(), quote.low),
        Column::new("close".into(), quote.close),
        Column::new("volume".into(), quote.volume),
        Column::new("adjusted_close".into(), adj_close),
    ])
    .map_err(|e| DataError::Other(e.to_string()))
}
