//! Mock providers shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use finhealth_core::{
    DataError, DataFrequency, DataProvider, FinancialStatement, FundamentalDataProvider,
    KeyMetrics, PeriodType, PriceDataProvider, Result, Symbol,
};
use polars::prelude::*;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn statement(
    period_end: NaiveDate,
    revenue: f64,
    net_income: f64,
    current_assets: f64,
    current_liabilities: f64,
    total_liabilities: f64,
    equity: f64,
) -> FinancialStatement {
    FinancialStatement {
        revenue: Some(revenue),
        net_income: Some(net_income),
        current_assets: Some(current_assets),
        current_liabilities: Some(current_liabilities),
        total_liabilities: Some(total_liabilities),
        stockholders_equity: Some(equity),
        total_assets: Some(total_liabilities + equity),
        ..FinancialStatement::new(Symbol::new("AAPL"), period_end, PeriodType::Annual)
    }
}

/// Three annual periods, newest first, in billions.
pub(crate) fn aapl_statements() -> Vec<FinancialStatement> {
    vec![
        statement(date(2024, 9, 30), 391.035e9, 93.736e9, 152.987e9, 176.392e9, 308.030e9, 56.950e9),
        statement(date(2023, 9, 30), 383.285e9, 96.995e9, 143.566e9, 145.308e9, 290.437e9, 62.146e9),
        statement(date(2022, 9, 30), 394.328e9, 99.803e9, 135.405e9, 153.982e9, 302.083e9, 50.672e9),
    ]
}

pub(crate) fn aapl_metrics(day: NaiveDate) -> KeyMetrics {
    KeyMetrics {
        market_cap: Some(3.45e12),
        pe_ratio: Some(37.8),
        pb_ratio: Some(60.5),
        debt_to_equity: Some(209.059),
        profit_margin: Some(0.2397),
        return_on_equity: Some(1.3652),
        ..KeyMetrics::new(Symbol::new("AAPL"), day)
    }
}

/// Provider answering from fixed data and counting calls.
#[derive(Debug)]
pub(crate) struct MockProvider {
    name: &'static str,
    statements: Vec<FinancialStatement>,
    metrics: bool,
    prices: bool,
    fail: bool,
    pub(crate) financials_calls: AtomicUsize,
    pub(crate) metrics_calls: AtomicUsize,
    pub(crate) ohlcv_calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn new(name: &'static str, statements: Vec<FinancialStatement>) -> Self {
        Self {
            name,
            statements,
            metrics: true,
            prices: true,
            fail: false,
            financials_calls: AtomicUsize::new(0),
            metrics_calls: AtomicUsize::new(0),
            ohlcv_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name, Vec::new())
        }
    }

    pub(crate) fn without_metrics(mut self) -> Self {
        self.metrics = false;
        self
    }

    pub(crate) fn without_prices(mut self) -> Self {
        self.prices = false;
        self
    }
}

impl DataProvider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Mock provider"
    }

    fn supported_frequencies(&self) -> &[DataFrequency] {
        &[DataFrequency::Daily]
    }
}

#[async_trait]
impl FundamentalDataProvider for MockProvider {
    async fn fetch_financials(
        &self,
        symbol: &Symbol,
        _period_type: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<FinancialStatement>> {
        self.financials_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DataError::Network(format!("connection refused for {symbol}")));
        }
        let mut statements = self.statements.clone();
        if let Some(n) = limit {
            statements.truncate(n);
        }
        Ok(statements)
    }

    async fn fetch_metrics(&self, symbol: &Symbol, date: NaiveDate) -> Result<KeyMetrics> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail || !self.metrics {
            return Err(DataError::Network(format!("connection refused for {symbol}")));
        }
        Ok(aapl_metrics(date))
    }
}

#[async_trait]
impl PriceDataProvider for MockProvider {
    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        _start: NaiveDate,
        end: NaiveDate,
        _frequency: DataFrequency,
    ) -> Result<DataFrame> {
        self.ohlcv_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail || !self.prices {
            return Err(DataError::RateLimited {
                provider: self.name.to_string(),
                retry_after: None,
            });
        }

        let last = end.num_days_from_ce() - 719_163;
        let dates = vec![last - 2, last - 1, last];
        let closes = vec![Some(200.0), None, Some(230.0)];

        let date_col = Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Other(e.to_string()))?;
        DataFrame::new(vec![
            Column::new("symbol".into(), vec![symbol.as_str(); 3]),
            date_col,
            Column::new("close".into(), closes),
        ])
        .map_err(|e| DataError::Other(e.to_string()))
    }
}
