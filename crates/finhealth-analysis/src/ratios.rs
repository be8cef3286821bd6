//! Ratio definitions and the ratio engine.
//!
//! [`RatioEngine`] turns a [`FinancialSnapshot`] into a [`RatioSet`]. Every
//! division is guarded: a missing or zero denominator, a missing numerator,
//! or a non-finite quotient yields [`RatioValue::Unavailable`].
//!
//! | Ratio | Formula |
//! |---|---|
//! | Net Profit Margin | net income / revenue |
//! | Return on Equity | net income / equity |
//! | Debt to Equity | total liabilities / equity |
//! | Current Ratio | current assets / current liabilities |
//!
//! Valuation and reported fields are passed through, rounded the same way for
//! display. The set also keeps their unrounded values, which threshold rules
//! on provider fields compare against (see [`RatioSet::unrounded`]).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use finhealth_core::{DataError, FinancialSnapshot, Result, Symbol};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of decimal places every ratio is rounded to.
pub const PRECISION: i32 = 2;

/// Days between 0001-01-01 and 1970-01-01, the polars date epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Named ratio reported in a [`RatioSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    /// Net income over revenue.
    NetProfitMargin,
    /// Net income over stockholders' equity.
    ReturnOnEquity,
    /// Total liabilities over stockholders' equity.
    DebtToEquity,
    /// Current assets over current liabilities.
    CurrentRatio,
    /// Trailing price-to-earnings, passed through.
    PriceToEarnings,
    /// Price-to-book, passed through.
    PriceToBook,
    /// Operating margin, passed through.
    OperatingMargin,
    /// Provider-reported profit margin (fraction).
    ReportedProfitMargin,
    /// Provider-reported return on equity (fraction).
    ReportedReturnOnEquity,
    /// Provider-reported debt-to-equity (percent-like raw scale, 150 = 1.5x).
    ReportedDebtToEquity,
}

impl RatioKind {
    /// The four computed ratios. A period joins a trend series only if all are available.
    pub const CORE: [Self; 4] = [
        Self::NetProfitMargin,
        Self::ReturnOnEquity,
        Self::DebtToEquity,
        Self::CurrentRatio,
    ];

    /// Every ratio kind, in report order.
    pub const ALL: [Self; 10] = [
        Self::NetProfitMargin,
        Self::ReturnOnEquity,
        Self::DebtToEquity,
        Self::CurrentRatio,
        Self::PriceToEarnings,
        Self::PriceToBook,
        Self::OperatingMargin,
        Self::ReportedProfitMargin,
        Self::ReportedReturnOnEquity,
        Self::ReportedDebtToEquity,
    ];

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NetProfitMargin => "Net Profit Margin",
            Self::ReturnOnEquity => "Return on Equity",
            Self::DebtToEquity => "Debt to Equity",
            Self::CurrentRatio => "Current Ratio",
            Self::PriceToEarnings => "Price to Earnings",
            Self::PriceToBook => "Price to Book",
            Self::OperatingMargin => "Operating Margin",
            Self::ReportedProfitMargin => "Reported Profit Margin",
            Self::ReportedReturnOnEquity => "Reported Return on Equity",
            Self::ReportedDebtToEquity => "Reported Debt to Equity",
        }
    }

    /// Column name used in tables.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::NetProfitMargin => "net_profit_margin",
            Self::ReturnOnEquity => "return_on_equity",
            Self::DebtToEquity => "debt_to_equity",
            Self::CurrentRatio => "current_ratio",
            Self::PriceToEarnings => "price_to_earnings",
            Self::PriceToBook => "price_to_book",
            Self::OperatingMargin => "operating_margin",
            Self::ReportedProfitMargin => "reported_profit_margin",
            Self::ReportedReturnOnEquity => "reported_return_on_equity",
            Self::ReportedDebtToEquity => "reported_debt_to_equity",
        }
    }

    /// Returns true for the four computed ratios.
    #[must_use]
    pub const fn is_core(self) -> bool {
        matches!(
            self,
            Self::NetProfitMargin | Self::ReturnOnEquity | Self::DebtToEquity | Self::CurrentRatio
        )
    }
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ratio value, or the explicit marker that it could not be computed.
///
/// Serializes as a plain number or `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatioValue {
    /// Computed value, rounded to [`PRECISION`] decimals.
    Value(f64),
    /// Could not be computed. Distinct from zero.
    #[default]
    Unavailable,
}

impl RatioValue {
    /// Rounds a raw value. Non-finite or missing inputs become `Unavailable`.
    #[must_use]
    pub fn from_raw(raw: Option<f64>) -> Self {
        match raw {
            Some(v) if v.is_finite() => Self::Value(round(v)),
            _ => Self::Unavailable,
        }
    }

    /// Guarded division.
    ///
    /// Unavailable when either side is missing or the denominator is zero.
    #[must_use]
    pub fn divide(numerator: Option<f64>, denominator: Option<f64>) -> Self {
        match (numerator, denominator) {
            (Some(n), Some(d)) if d != 0.0 => Self::from_raw(Some(n / d)),
            _ => Self::Unavailable,
        }
    }

    /// Returns the value, or `None` when unavailable.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    /// Returns true if the value was computed.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for RatioValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::Unavailable => f.write_str("N/A"),
        }
    }
}

/// Rounds half away from zero to [`PRECISION`] decimals, folding `-0.0` into `0.0`.
fn round(v: f64) -> f64 {
    let scale = 10f64.powi(PRECISION);
    let rounded = (v * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Ratios derived from one snapshot.
///
/// Every [`RatioKind`] is present; the ones that could not be computed hold
/// [`RatioValue::Unavailable`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    period_end: Option<NaiveDate>,
    values: BTreeMap<RatioKind, RatioValue>,
    #[serde(skip)]
    unrounded: BTreeMap<RatioKind, f64>,
}

impl RatioSet {
    /// Creates a set with every ratio unavailable.
    #[must_use]
    pub fn new(period_end: Option<NaiveDate>) -> Self {
        Self {
            period_end,
            values: RatioKind::ALL
                .iter()
                .map(|&kind| (kind, RatioValue::Unavailable))
                .collect(),
            unrounded: BTreeMap::new(),
        }
    }

    /// Sets a ratio from a raw value, rounding it and keeping the raw value.
    #[must_use]
    pub fn with(mut self, kind: RatioKind, value: f64) -> Self {
        self.set_raw(kind, Some(value));
        self
    }

    /// Replaces the value of one ratio, discarding any unrounded value.
    pub fn set(&mut self, kind: RatioKind, value: RatioValue) {
        self.unrounded.remove(&kind);
        self.values.insert(kind, value);
    }

    /// Sets a ratio from a raw value, rounding it and keeping the raw value.
    ///
    /// Missing or non-finite values leave the ratio unavailable.
    pub fn set_raw(&mut self, kind: RatioKind, raw: Option<f64>) {
        self.set(kind, RatioValue::from_raw(raw));
        if let Some(v) = raw.filter(|v| v.is_finite()) {
            self.unrounded.insert(kind, v);
        }
    }

    /// Returns the value of one ratio.
    #[must_use]
    pub fn get(&self, kind: RatioKind) -> RatioValue {
        self.values.get(&kind).copied().unwrap_or_default()
    }

    /// Returns the value before rounding when it was kept, otherwise the
    /// rounded value. Not serialized.
    #[must_use]
    pub fn unrounded(&self, kind: RatioKind) -> Option<f64> {
        self.unrounded
            .get(&kind)
            .copied()
            .or_else(|| self.get(kind).value())
    }

    /// End of the period these ratios describe.
    #[must_use]
    pub const fn period_end(&self) -> Option<NaiveDate> {
        self.period_end
    }

    /// Returns true if all four core ratios are available.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        RatioKind::CORE.iter().all(|&kind| self.get(kind).is_available())
    }

    /// Iterates over every ratio in report order.
    pub fn iter(&self) -> impl Iterator<Item = (RatioKind, RatioValue)> + '_ {
        self.values.iter().map(|(&kind, &value)| (kind, value))
    }
}

/// Ratio sets for consecutive periods, ordered oldest to newest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSeries {
    periods: Vec<RatioSet>,
}

impl RatioSeries {
    /// Returns the periods, oldest first.
    #[must_use]
    pub fn periods(&self) -> &[RatioSet] {
        &self.periods
    }

    /// Returns the newest period.
    #[must_use]
    pub fn latest(&self) -> Option<&RatioSet> {
        self.periods.last()
    }

    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Returns true if the series holds no period.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Iterates over the periods, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RatioSet> {
        self.periods.iter()
    }

    /// Renders the series as a table for charting.
    ///
    /// One row per period with a `period_end` date column, one column per
    /// core ratio, plus any other ratio available in at least one period.
    /// Unavailable values are nulls.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<Option<i32>> = self
            .periods
            .iter()
            .map(|set| {
                set.period_end
                    .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            })
            .collect();

        let date_col = Column::new("period_end".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Other(e.to_string()))?;

        let mut columns = vec![date_col];
        for kind in RatioKind::ALL {
            let values: Vec<Option<f64>> =
                self.periods.iter().map(|set| set.get(kind).value()).collect();
            if kind.is_core() || values.iter().any(Option::is_some) {
                columns.push(Column::new(kind.key().into(), values));
            }
        }

        DataFrame::new(columns).map_err(|e| DataError::Other(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a RatioSeries {
    type Item = &'a RatioSet;
    type IntoIter = std::slice::Iter<'a, RatioSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}

/// Derives ratios from financial snapshots.
///
/// Stateless and infallible per snapshot. Only [`RatioEngine::compute_series`]
/// can fail, when not a single period is usable.
#[derive(Clone, Copy, Debug, Default)]
pub struct RatioEngine;

impl RatioEngine {
    /// Creates a ratio engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes every ratio for one snapshot.
    #[must_use]
    pub fn compute(&self, snapshot: &FinancialSnapshot) -> RatioSet {
        let mut set = RatioSet::new(snapshot.period_end());

        set.set(
            RatioKind::NetProfitMargin,
            RatioValue::divide(snapshot.net_income(), snapshot.revenue()),
        );
        set.set(
            RatioKind::ReturnOnEquity,
            RatioValue::divide(snapshot.net_income(), snapshot.equity()),
        );
        set.set(
            RatioKind::DebtToEquity,
            RatioValue::divide(snapshot.total_liabilities(), snapshot.equity()),
        );
        set.set(
            RatioKind::CurrentRatio,
            RatioValue::divide(snapshot.current_assets(), snapshot.current_liabilities()),
        );

        for (kind, raw) in [
            (RatioKind::PriceToEarnings, snapshot.trailing_pe()),
            (RatioKind::PriceToBook, snapshot.price_to_book()),
            (RatioKind::OperatingMargin, snapshot.operating_margin()),
            (RatioKind::ReportedProfitMargin, snapshot.profit_margin()),
            (RatioKind::ReportedReturnOnEquity, snapshot.return_on_equity()),
            (RatioKind::ReportedDebtToEquity, snapshot.reported_debt_to_equity()),
        ] {
            set.set_raw(kind, raw);
        }

        set
    }

    /// Computes a trend series, one ratio set per period.
    ///
    /// Snapshots are stable-sorted by period end (undated ones first), so the
    /// result is oldest to newest regardless of input order. A period is kept
    /// only if all four core ratios are available; the others are dropped
    /// whole. Fails with [`DataError::DataUnavailable`] when no period survives.
    pub fn compute_series(
        &self,
        symbol: &Symbol,
        snapshots: &[FinancialSnapshot],
    ) -> Result<RatioSeries> {
        if snapshots.is_empty() {
            return Err(DataError::unavailable(symbol, "no financial periods"));
        }

        let mut ordered: Vec<&FinancialSnapshot> = snapshots.iter().collect();
        ordered.sort_by_key(|s| s.period_end());

        let mut periods = Vec::with_capacity(ordered.len());
        for snapshot in ordered {
            let set = self.compute(snapshot);
            if set.is_complete() {
                periods.push(set);
            } else {
                debug!(
                    symbol = %symbol,
                    period_end = ?snapshot.period_end(),
                    "Dropping period with incomplete core ratios"
                );
            }
        }

        if periods.is_empty() {
            return Err(DataError::unavailable(
                symbol,
                "no period has every field needed for the core ratios",
            ));
        }

        debug!(
            symbol = %symbol,
            kept = periods.len(),
            dropped = snapshots.len() - periods.len(),
            "Computed ratio series"
        );

        Ok(RatioSeries { periods })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finhealth_core::SnapshotField;

    fn date(y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, 12, 31).unwrap()
    }

    fn full_snapshot(year: i32) -> FinancialSnapshot {
        FinancialSnapshot::new(Some(date(year)))
            .with(SnapshotField::Revenue, 1_000.0)
            .with(SnapshotField::NetIncome, 120.0)
            .with(SnapshotField::Equity, 800.0)
            .with(SnapshotField::TotalLiabilities, 960.0)
            .with(SnapshotField::CurrentAssets, 450.0)
            .with(SnapshotField::CurrentLiabilities, 300.0)
    }

    #[test]
    fn test_core_ratios() {
        let set = RatioEngine::new().compute(&full_snapshot(2023));

        assert_eq!(set.get(RatioKind::NetProfitMargin), RatioValue::Value(0.12));
        assert_eq!(set.get(RatioKind::ReturnOnEquity), RatioValue::Value(0.15));
        assert_eq!(set.get(RatioKind::DebtToEquity), RatioValue::Value(1.2));
        assert_eq!(set.get(RatioKind::CurrentRatio), RatioValue::Value(1.5));
        assert!(set.is_complete());
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let snapshot = FinancialSnapshot::new(None)
            .with(SnapshotField::Revenue, 3.0)
            .with(SnapshotField::NetIncome, 1.0)
            .with(SnapshotField::CurrentAssets, 2.0)
            .with(SnapshotField::CurrentLiabilities, 3.0);

        let set = RatioEngine::new().compute(&snapshot);

        assert_eq!(set.get(RatioKind::NetProfitMargin).value(), Some(0.33));
        assert_eq!(set.get(RatioKind::CurrentRatio).value(), Some(0.67));
    }

    #[test]
    fn test_zero_or_missing_revenue_is_unavailable() {
        let engine = RatioEngine::new();

        let zero = full_snapshot(2023).with(SnapshotField::Revenue, 0.0);
        assert_eq!(
            engine.compute(&zero).get(RatioKind::NetProfitMargin),
            RatioValue::Unavailable
        );

        let missing = FinancialSnapshot::new(None).with(SnapshotField::NetIncome, 5.0);
        let set = engine.compute(&missing);
        assert_eq!(set.get(RatioKind::NetProfitMargin), RatioValue::Unavailable);
        assert_eq!(set.get(RatioKind::ReturnOnEquity), RatioValue::Unavailable);
    }

    #[test]
    fn test_zero_equity_guards_both_equity_ratios() {
        let snapshot = full_snapshot(2023).with(SnapshotField::Equity, 0.0);
        let set = RatioEngine::new().compute(&snapshot);

        assert_eq!(set.get(RatioKind::ReturnOnEquity), RatioValue::Unavailable);
        assert_eq!(set.get(RatioKind::DebtToEquity), RatioValue::Unavailable);
        assert_eq!(set.get(RatioKind::NetProfitMargin), RatioValue::Value(0.12));
        assert!(!set.is_complete());
    }

    #[test]
    fn test_pass_through_fields_are_rounded() {
        let snapshot = FinancialSnapshot::new(None)
            .with(SnapshotField::TrailingPe, 28.456)
            .with(SnapshotField::PriceToBook, 45.1)
            .with(SnapshotField::DebtToEquity, 151.862)
            .with(SnapshotField::ReturnOnEquity, 1.4725);

        let set = RatioEngine::new().compute(&snapshot);

        assert_eq!(set.get(RatioKind::PriceToEarnings).value(), Some(28.46));
        assert_eq!(set.get(RatioKind::PriceToBook).value(), Some(45.1));
        assert_eq!(set.get(RatioKind::ReportedDebtToEquity).value(), Some(151.86));
        assert_eq!(set.get(RatioKind::ReportedReturnOnEquity).value(), Some(1.47));
        assert_eq!(set.get(RatioKind::OperatingMargin), RatioValue::Unavailable);
    }

    #[test]
    fn test_pass_through_keeps_unrounded_value() {
        let snapshot = FinancialSnapshot::new(None)
            .with(SnapshotField::ProfitMargin, 0.004)
            .with(SnapshotField::DebtToEquity, 149.996);

        let set = RatioEngine::new().compute(&snapshot);

        assert_eq!(set.get(RatioKind::ReportedProfitMargin).value(), Some(0.0));
        assert_eq!(set.unrounded(RatioKind::ReportedProfitMargin), Some(0.004));
        assert_eq!(set.get(RatioKind::ReportedDebtToEquity).value(), Some(150.0));
        assert_eq!(set.unrounded(RatioKind::ReportedDebtToEquity), Some(149.996));
        assert_eq!(set.unrounded(RatioKind::PriceToBook), None);

        // Unrounded values stay out of the serialized form
        let json = serde_json::to_string(&set).unwrap();
        assert!(!json.contains("149.996"));
    }

    #[test]
    fn test_set_discards_unrounded_value() {
        let mut set = RatioSet::new(None).with(RatioKind::PriceToEarnings, 29.996);
        set.set(RatioKind::PriceToEarnings, RatioValue::Value(12.0));

        assert_eq!(set.unrounded(RatioKind::PriceToEarnings), Some(12.0));
    }

    #[test]
    fn test_negative_zero_is_folded() {
        let snapshot = FinancialSnapshot::new(None)
            .with(SnapshotField::Revenue, 1_000_000.0)
            .with(SnapshotField::NetIncome, -1.0);

        let value = RatioEngine::new()
            .compute(&snapshot)
            .get(RatioKind::NetProfitMargin)
            .value()
            .unwrap();

        assert!(value.is_sign_positive());
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_series_drops_incomplete_period() {
        let mut snapshots: Vec<FinancialSnapshot> = (2019..=2023).map(full_snapshot).collect();
        snapshots[2] = FinancialSnapshot::new(Some(date(2021)))
            .with(SnapshotField::Revenue, 1_000.0)
            .with(SnapshotField::NetIncome, 120.0)
            .with(SnapshotField::Equity, 800.0)
            .with(SnapshotField::TotalLiabilities, 960.0)
            .with(SnapshotField::CurrentAssets, 450.0);

        let series = RatioEngine::new()
            .compute_series(&Symbol::new("TEST"), &snapshots)
            .unwrap();

        let years: Vec<i32> = series
            .iter()
            .map(|s| s.period_end().unwrap().year())
            .collect();
        assert_eq!(years, vec![2019, 2020, 2022, 2023]);
    }

    #[test]
    fn test_series_sorted_oldest_first() {
        let snapshots: Vec<FinancialSnapshot> = (2020..=2023).rev().map(full_snapshot).collect();

        let series = RatioEngine::new()
            .compute_series(&Symbol::new("TEST"), &snapshots)
            .unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series.periods()[0].period_end(), Some(date(2020)));
        assert_eq!(series.latest().unwrap().period_end(), Some(date(2023)));
    }

    #[test]
    fn test_series_empty_input_is_unavailable() {
        let err = RatioEngine::new()
            .compute_series(&Symbol::new("NONE"), &[])
            .unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[test]
    fn test_series_without_usable_period_is_unavailable() {
        let snapshots = vec![
            FinancialSnapshot::new(Some(date(2022))).with(SnapshotField::Revenue, 10.0),
            full_snapshot(2023).with(SnapshotField::CurrentLiabilities, 0.0),
        ];

        let err = RatioEngine::new()
            .compute_series(&Symbol::new("GAPS"), &snapshots)
            .unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { ref symbol, .. } if symbol == "GAPS"));
    }

    #[test]
    fn test_series_to_dataframe() {
        let snapshots: Vec<FinancialSnapshot> = (2021..=2023).map(full_snapshot).collect();
        let series = RatioEngine::new()
            .compute_series(&Symbol::new("TEST"), &snapshots)
            .unwrap();

        let df = series.to_dataframe().unwrap();

        assert_eq!(df.height(), 3);
        // period_end + four core ratios; pass-throughs are absent in every period
        assert_eq!(df.width(), 5);
        let margins = df
            .column("net_profit_margin")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(margins.get(0), Some(0.12));
    }

    #[test]
    fn test_ratio_value_display_and_json() {
        assert_eq!(RatioValue::Value(1.5).to_string(), "1.50");
        assert_eq!(RatioValue::Unavailable.to_string(), "N/A");
        assert_eq!(serde_json::to_string(&RatioValue::Unavailable).unwrap(), "null");
        assert_eq!(serde_json::to_string(&RatioValue::Value(0.12)).unwrap(), "0.12");
    }
}
