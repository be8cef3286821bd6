//! Core data types for financial market data.
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`FinancialStatement`] - One fiscal period of statement rows
//! - [`KeyMetrics`] - Flat snapshot of market and valuation metrics
//! - [`FinancialSnapshot`] - Point-in-time input record for ratio computation

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frequency::PeriodType;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased and trimmed on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Financial statement rows for one fiscal period.
///
/// Merges the income statement, balance sheet, and cash flow statement of a
/// single period end. Any row the provider did not report is `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    /// Stock symbol.
    pub symbol: Symbol,
    /// End date of the reporting period.
    pub period_end: NaiveDate,
    /// Type of period (annual or quarterly).
    pub period_type: PeriodType,

    // Income Statement
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Operating income.
    pub operating_income: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,

    // Balance Sheet
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Current assets.
    pub current_assets: Option<f64>,
    /// Total liabilities (net of minority interest).
    pub total_liabilities: Option<f64>,
    /// Current liabilities.
    pub current_liabilities: Option<f64>,
    /// Stockholders' equity.
    pub stockholders_equity: Option<f64>,

    // Cash Flow Statement
    /// Operating cash flow.
    pub operating_cash_flow: Option<f64>,
    /// Free cash flow.
    pub free_cash_flow: Option<f64>,
}

impl FinancialStatement {
    /// Creates a new financial statement with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, period_end: NaiveDate, period_type: PeriodType) -> Self {
        Self {
            symbol,
            period_end,
            period_type,
            ..Default::default()
        }
    }
}

/// Current market and valuation metrics for a symbol.
///
/// Values keep the provider's own scale. In particular `debt_to_equity` is
/// reported on a percent-like scale (150.0 means 1.5x) while `return_on_equity`,
/// `profit_margin` and `operating_margin` are fractions (0.15 means 15%).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Date of the metrics.
    pub date: NaiveDate,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Trailing price-to-earnings ratio.
    pub pe_ratio: Option<f64>,
    /// Price-to-book ratio.
    pub pb_ratio: Option<f64>,
    /// Debt-to-equity, raw provider scale.
    pub debt_to_equity: Option<f64>,
    /// Net profit margin.
    pub profit_margin: Option<f64>,
    /// Return on equity.
    pub return_on_equity: Option<f64>,
    /// Operating margin.
    pub operating_margin: Option<f64>,
    /// Current ratio.
    pub current_ratio: Option<f64>,
}

impl KeyMetrics {
    /// Creates new key metrics with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, date: NaiveDate) -> Self {
        Self {
            symbol,
            date,
            ..Default::default()
        }
    }
}

/// Named field of a [`FinancialSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotField {
    /// Total revenue.
    Revenue,
    /// Net income.
    NetIncome,
    /// Current assets.
    CurrentAssets,
    /// Current liabilities.
    CurrentLiabilities,
    /// Total liabilities.
    TotalLiabilities,
    /// Stockholders' equity.
    Equity,
    /// Total assets.
    TotalAssets,
    /// Market capitalization.
    MarketCap,
    /// Trailing price-to-earnings.
    TrailingPe,
    /// Price-to-book.
    PriceToBook,
    /// Debt-to-equity as reported by the provider.
    DebtToEquity,
    /// Net profit margin as reported by the provider.
    ProfitMargin,
    /// Return on equity as reported by the provider.
    ReturnOnEquity,
    /// Operating margin as reported by the provider.
    OperatingMargin,
}

impl SnapshotField {
    /// Every snapshot field, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Revenue,
        Self::NetIncome,
        Self::CurrentAssets,
        Self::CurrentLiabilities,
        Self::TotalLiabilities,
        Self::Equity,
        Self::TotalAssets,
        Self::MarketCap,
        Self::TrailingPe,
        Self::PriceToBook,
        Self::DebtToEquity,
        Self::ProfitMargin,
        Self::ReturnOnEquity,
        Self::OperatingMargin,
    ];
}

/// Point-in-time financial and market fields for one ticker.
///
/// Absent fields are simply not stored. Non-finite values (`NaN`, infinities)
/// are treated as absent when inserted, so every accessor returns either a
/// finite number or `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    period_end: Option<NaiveDate>,
    values: BTreeMap<SnapshotField, f64>,
}

impl FinancialSnapshot {
    /// Creates an empty snapshot for the given period end.
    #[must_use]
    pub fn new(period_end: Option<NaiveDate>) -> Self {
        Self {
            period_end,
            values: BTreeMap::new(),
        }
    }

    /// Builds a snapshot from one period of statement rows.
    #[must_use]
    pub fn from_statement(statement: &FinancialStatement) -> Self {
        Self::new(Some(statement.period_end))
            .with_opt(SnapshotField::Revenue, statement.revenue)
            .with_opt(SnapshotField::NetIncome, statement.net_income)
            .with_opt(SnapshotField::CurrentAssets, statement.current_assets)
            .with_opt(SnapshotField::CurrentLiabilities, statement.current_liabilities)
            .with_opt(SnapshotField::TotalLiabilities, statement.total_liabilities)
            .with_opt(SnapshotField::Equity, statement.stockholders_equity)
            .with_opt(SnapshotField::TotalAssets, statement.total_assets)
    }

    /// Overlays market metrics onto this snapshot.
    #[must_use]
    pub fn with_metrics(self, metrics: &KeyMetrics) -> Self {
        self.with_opt(SnapshotField::MarketCap, metrics.market_cap)
            .with_opt(SnapshotField::TrailingPe, metrics.pe_ratio)
            .with_opt(SnapshotField::PriceToBook, metrics.pb_ratio)
            .with_opt(SnapshotField::DebtToEquity, metrics.debt_to_equity)
            .with_opt(SnapshotField::ProfitMargin, metrics.profit_margin)
            .with_opt(SnapshotField::ReturnOnEquity, metrics.return_on_equity)
            .with_opt(SnapshotField::OperatingMargin, metrics.operating_margin)
    }

    /// Sets a field. Non-finite values leave the field absent.
    #[must_use]
    pub fn with(mut self, field: SnapshotField, value: f64) -> Self {
        if value.is_finite() {
            self.values.insert(field, value);
        } else {
            self.values.remove(&field);
        }
        self
    }

    /// Sets a field from an optional value. `None` leaves any existing value in place.
    #[must_use]
    pub fn with_opt(self, field: SnapshotField, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.with(field, v),
            None => self,
        }
    }

    /// Returns the field value, or `None` when absent.
    #[must_use]
    pub fn get(&self, field: SnapshotField) -> Option<f64> {
        self.values.get(&field).copied()
    }

    /// End of the period this snapshot describes.
    #[must_use]
    pub const fn period_end(&self) -> Option<NaiveDate> {
        self.period_end
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total revenue.
    #[must_use]
    pub fn revenue(&self) -> Option<f64> {
        self.get(SnapshotField::Revenue)
    }

    /// Net income.
    #[must_use]
    pub fn net_income(&self) -> Option<f64> {
        self.get(SnapshotField::NetIncome)
    }

    /// Current assets.
    #[must_use]
    pub fn current_assets(&self) -> Option<f64> {
        self.get(SnapshotField::CurrentAssets)
    }

    /// Current liabilities.
    #[must_use]
    pub fn current_liabilities(&self) -> Option<f64> {
        self.get(SnapshotField::CurrentLiabilities)
    }

    /// Total liabilities.
    #[must_use]
    pub fn total_liabilities(&self) -> Option<f64> {
        self.get(SnapshotField::TotalLiabilities)
    }

    /// Stockholders' equity.
    #[must_use]
    pub fn equity(&self) -> Option<f64> {
        self.get(SnapshotField::Equity)
    }

    /// Total assets.
    #[must_use]
    pub fn total_assets(&self) -> Option<f64> {
        self.get(SnapshotField::TotalAssets)
    }

    /// Market capitalization.
    #[must_use]
    pub fn market_cap(&self) -> Option<f64> {
        self.get(SnapshotField::MarketCap)
    }

    /// Trailing price-to-earnings.
    #[must_use]
    pub fn trailing_pe(&self) -> Option<f64> {
        self.get(SnapshotField::TrailingPe)
    }

    /// Price-to-book.
    #[must_use]
    pub fn price_to_book(&self) -> Option<f64> {
        self.get(SnapshotField::PriceToBook)
    }

    /// Debt-to-equity on the provider's raw scale.
    #[must_use]
    pub fn reported_debt_to_equity(&self) -> Option<f64> {
        self.get(SnapshotField::DebtToEquity)
    }

    /// Net profit margin as reported by the provider.
    #[must_use]
    pub fn profit_margin(&self) -> Option<f64> {
        self.get(SnapshotField::ProfitMargin)
    }

    /// Return on equity as reported by the provider.
    #[must_use]
    pub fn return_on_equity(&self) -> Option<f64> {
        self.get(SnapshotField::ReturnOnEquity)
    }

    /// Operating margin as reported by the provider.
    #[must_use]
    pub fn operating_margin(&self) -> Option<f64> {
        self.get(SnapshotField::OperatingMargin)
    }
}
