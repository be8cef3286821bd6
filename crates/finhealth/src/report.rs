//! Result of one analysis.

use chrono::{Datelike, NaiveDate};
use finhealth_analysis::{HealthVerdict, RatioSeries, RatioSet};
use finhealth_core::{DataError, FinancialSnapshot, Result, Symbol};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Days between 0001-01-01 and 1970-01-01, the polars date epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Everything produced by [`Analyzer::analyze`](crate::Analyzer::analyze).
#[derive(Clone, Debug)]
pub struct HealthReport {
    /// Analyzed ticker.
    pub symbol: Symbol,
    /// Statement snapshots, oldest first.
    pub snapshots: Vec<FinancialSnapshot>,
    /// Ratios of every usable period, oldest first.
    pub trend: RatioSeries,
    /// Ratios of the newest period merged with current market metrics.
    pub latest: RatioSet,
    /// Score of [`latest`](Self::latest) under the configured policy.
    pub verdict: HealthVerdict,
    /// Price history, if it could be fetched.
    pub prices: Option<DataFrame>,
}

impl HealthReport {
    /// Statement chart series: one row per snapshot with revenue, net income,
    /// total assets and total liabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if polars rejects the columns.
    pub fn financials_frame(&self) -> Result<DataFrame> {
        let dates: Vec<Option<i32>> = self
            .snapshots
            .iter()
            .map(|s| s.period_end().map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE))
            .collect();

        let date_col = Column::new("period_end".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Other(e.to_string()))?;

        let series = |name: &str, get: fn(&FinancialSnapshot) -> Option<f64>| {
            let values: Vec<Option<f64>> = self.snapshots.iter().map(get).collect();
            Column::new(name.into(), values)
        };

        DataFrame::new(vec![
            date_col,
            series("revenue", FinancialSnapshot::revenue),
            series("net_income", FinancialSnapshot::net_income),
            series("total_assets", FinancialSnapshot::total_assets),
            series("total_liabilities", FinancialSnapshot::total_liabilities),
        ])
        .map_err(|e| DataError::Other(e.to_string()))
    }

    /// Ratio trend table, one row per usable period.
    ///
    /// # Errors
    ///
    /// Returns an error if polars rejects the columns.
    pub fn ratio_frame(&self) -> Result<DataFrame> {
        self.trend.to_dataframe()
    }

    /// First and last close of the price history, with its range.
    ///
    /// `None` when no prices were fetched or no row has both a date and a
    /// close.
    #[must_use]
    pub fn price_summary(&self) -> Option<PriceSummary> {
        PriceSummary::from_frame(self.prices.as_ref()?).ok().flatten()
    }
}

/// Headline numbers of a price history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// First session with a close.
    pub start: NaiveDate,
    /// Last session with a close.
    pub end: NaiveDate,
    /// Close on `start`.
    pub first_close: f64,
    /// Close on `end`.
    pub last_close: f64,
    /// Lowest close.
    pub low: f64,
    /// Highest close.
    pub high: f64,
    /// Number of sessions with a close.
    pub sessions: usize,
}

impl PriceSummary {
    /// Fractional change from the first to the last close.
    #[must_use]
    pub fn change(&self) -> Option<f64> {
        (self.first_close != 0.0).then(|| self.last_close / self.first_close - 1.0)
    }

    /// Summarises a frame with `date` and `close` columns. Rows missing
    /// either are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if either column is missing or has the wrong type.
    pub fn from_frame(df: &DataFrame) -> Result<Option<Self>> {
        let polars_err = |e: PolarsError| DataError::Other(e.to_string());

        let dates = df
            .column("date")
            .and_then(|c| c.cast(&DataType::Int32))
            .map_err(polars_err)?;
        let dates = dates.as_materialized_series().i32().map_err(polars_err)?;

        let closes = df.column("close").map_err(polars_err)?;
        let closes = closes.as_materialized_series().f64().map_err(polars_err)?;

        let mut points = dates
            .into_iter()
            .zip(closes)
            .filter_map(|(day, close)| {
                let date = NaiveDate::from_num_days_from_ce_opt(day? + UNIX_EPOCH_DAYS_FROM_CE)?;
                Some((date, close.filter(|c| c.is_finite())?))
            })
            .collect::<Vec<_>>();
        points.sort_by_key(|(date, _)| *date);

        let (Some(&(start, first_close)), Some(&(end, last_close))) = (points.first(), points.last())
        else {
            return Ok(None);
        };

        let low = points.iter().map(|(_, c)| *c).fold(f64::INFINITY, f64::min);
        let high = points.iter().map(|(_, c)| *c).fold(f64::NEG_INFINITY, f64::max);

        Ok(Some(Self {
            start,
            end,
            first_close,
            last_close,
            low,
            high,
            sessions: points.len(),
        }))
    }
}
