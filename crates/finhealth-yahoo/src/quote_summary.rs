//! quoteSummary API payloads.
//!
//! Yahoo wraps every number as `{"raw": 1.0, "fmt": "1.00"}` and sends `{}`
//! for rows it does not have, so each field is an optional [`YahooValue`]
//! whose `raw` is optional too.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use finhealth_core::{
    DataError, FinancialStatement, KeyMetrics, PeriodType, Result, Symbol,
};
use serde::Deserialize;

use crate::chart::ApiError;

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Modules requested for market metrics.
const METRICS_MODULES: &str = "financialData,summaryDetail,defaultKeyStatistics";

/// Builds the quoteSummary URL for the statement modules of a period type.
pub(crate) fn statements_url(symbol: &Symbol, period_type: PeriodType) -> String {
    let modules = match period_type {
        PeriodType::Annual => {
            "incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory"
        }
        PeriodType::Quarterly => {
            "incomeStatementHistoryQuarterly,balanceSheetHistoryQuarterly,cashflowStatementHistoryQuarterly"
        }
    };
    format!("{}/{}?modules={}", QUOTE_SUMMARY_URL, symbol.as_str(), modules)
}

/// Builds the quoteSummary URL for the market metrics modules.
pub(crate) fn metrics_url(symbol: &Symbol) -> String {
    format!(
        "{}/{}?modules={}",
        QUOTE_SUMMARY_URL,
        symbol.as_str(),
        METRICS_MODULES
    )
}

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

impl QuoteSummaryResponse {
    fn into_data(self, symbol: &Symbol) -> Result<QuoteSummaryData> {
        if let Some(error) = self.quote_summary.error {
            return Err(error.into_data_error(symbol));
        }
        self.quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    income_statement_history: Option<IncomeHistory>,
    income_statement_history_quarterly: Option<IncomeHistory>,
    balance_sheet_history: Option<BalanceHistory>,
    balance_sheet_history_quarterly: Option<BalanceHistory>,
    cashflow_statement_history: Option<CashflowHistory>,
    cashflow_statement_history_quarterly: Option<CashflowHistory>,
    financial_data: Option<FinancialData>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
}

/// Numeric cell in Yahoo's `{raw, fmt}` shape.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
struct YahooValue {
    raw: Option<f64>,
}

fn raw(value: Option<YahooValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

fn end_date(value: Option<YahooValue>) -> Option<NaiveDate> {
    let secs = raw(value)? as i64;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeHistory {
    #[serde(default)]
    income_statement_history: Vec<IncomeRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeRow {
    end_date: Option<YahooValue>,
    total_revenue: Option<YahooValue>,
    operating_income: Option<YahooValue>,
    net_income: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceHistory {
    #[serde(default)]
    balance_sheet_statements: Vec<BalanceRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceRow {
    end_date: Option<YahooValue>,
    total_assets: Option<YahooValue>,
    total_current_assets: Option<YahooValue>,
    total_liab: Option<YahooValue>,
    total_current_liabilities: Option<YahooValue>,
    total_stockholder_equity: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashflowHistory {
    #[serde(default)]
    cashflow_statements: Vec<CashflowRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashflowRow {
    end_date: Option<YahooValue>,
    total_cash_from_operating_activities: Option<YahooValue>,
    capital_expenditures: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    profit_margins: Option<YahooValue>,
    operating_margins: Option<YahooValue>,
    return_on_equity: Option<YahooValue>,
    debt_to_equity: Option<YahooValue>,
    current_ratio: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    market_cap: Option<YahooValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    price_to_book: Option<YahooValue>,
}

/// Merges the statement tables of a response into one statement per period
/// end, newest first.
///
/// The income statement drives the periods; balance sheet and cash flow rows
/// are matched on the same end date. Rows without an end date are skipped.
pub(crate) fn parse_statements(
    symbol: &Symbol,
    period_type: PeriodType,
    response: QuoteSummaryResponse,
) -> Result<Vec<FinancialStatement>> {
    let data = response.into_data(symbol)?;

    let (income, balance, cashflow) = match period_type {
        PeriodType::Annual => (
            data.income_statement_history,
            data.balance_sheet_history,
            data.cashflow_statement_history,
        ),
        PeriodType::Quarterly => (
            data.income_statement_history_quarterly,
            data.balance_sheet_history_quarterly,
            data.cashflow_statement_history_quarterly,
        ),
    };

    let income = income.unwrap_or_default().income_statement_history;
    if income.is_empty() {
        return Err(DataError::unavailable(
            symbol,
            format!("no {period_type} income statement"),
        ));
    }

    let balance: BTreeMap<NaiveDate, BalanceRow> = balance
        .unwrap_or_default()
        .balance_sheet_statements
        .into_iter()
        .filter_map(|row| end_date(row.end_date).map(|d| (d, row)))
        .collect();
    let cashflow: BTreeMap<NaiveDate, CashflowRow> = cashflow
        .unwrap_or_default()
        .cashflow_statements
        .into_iter()
        .filter_map(|row| end_date(row.end_date).map(|d| (d, row)))
        .collect();

    let mut statements: Vec<FinancialStatement> = income
        .into_iter()
        .filter_map(|row| {
            let period_end = end_date(row.end_date)?;
            let mut stmt = FinancialStatement::new(symbol.clone(), period_end, period_type);
            stmt.revenue = raw(row.total_revenue);
            stmt.operating_income = raw(row.operating_income);
            stmt.net_income = raw(row.net_income);

            if let Some(b) = balance.get(&period_end) {
                stmt.total_assets = raw(b.total_assets);
                stmt.current_assets = raw(b.total_current_assets);
                stmt.total_liabilities = raw(b.total_liab);
                stmt.current_liabilities = raw(b.total_current_liabilities);
                stmt.stockholders_equity = raw(b.total_stockholder_equity);
            }

            if let Some(c) = cashflow.get(&period_end) {
                stmt.operating_cash_flow = raw(c.total_cash_from_operating_activities);
                // Capital expenditures are reported as a negative outflow
                stmt.free_cash_flow = stmt
                    .operating_cash_flow
                    .zip(raw(c.capital_expenditures))
                    .map(|(ocf, capex)| ocf + capex);
            }

            Some(stmt)
        })
        .collect();

    if statements.is_empty() {
        return Err(DataError::unavailable(
            symbol,
            format!("no dated {period_type} income statement"),
        ));
    }

    statements.sort_by(|a, b| b.period_end.cmp(&a.period_end));
    statements.dedup_by_key(|s| s.period_end);
    Ok(statements)
}

/// Extracts market metrics from a response, stamped with `date`.
pub(crate) fn parse_metrics(
    symbol: &Symbol,
    date: NaiveDate,
    response: QuoteSummaryResponse,
) -> Result<KeyMetrics> {
    let data = response.into_data(symbol)?;

    let financial = data.financial_data.unwrap_or_default();
    let summary = data.summary_detail.unwrap_or_default();
    let stats = data.default_key_statistics.unwrap_or_default();

    Ok(KeyMetrics {
        market_cap: raw(summary.market_cap),
        pe_ratio: raw(summary.trailing_pe),
        pb_ratio: raw(stats.price_to_book),
        debt_to_equity: raw(financial.debt_to_equity),
        profit_margin: raw(financial.profit_margins),
        return_on_equity: raw(financial.return_on_equity),
        operating_margin: raw(financial.operating_margins),
        current_ratio: raw(financial.current_ratio),
        ..KeyMetrics::new(symbol.clone(), date)
    })
}
