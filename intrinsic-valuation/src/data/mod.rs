//! Market data layer.
//!
//! Fetches quotes, fundamentals, daily and monthly prices and news for a ticker and
//! normalizes them into the plain records the valuation engine consumes.
//!
//! # Data Sources
//! - **Alpha Vantage**: REST API (`/query?function=...`), proactively rate
//!   limited, fundamentals cached with a TTL
//! - **StaticProvider**: in-memory fixtures for tests and offline runs
//!
//! Every numeric field is optional. The upstream sends numbers as strings,
//! `"None"`, or omits them; anything that is not a finite number is `None`.

mod aggregator;
mod alpha_vantage;
mod cache;
pub mod mock;
mod provider;
mod rate_limiter;

pub use aggregator::MarketDataAggregator;
pub use alpha_vantage::AlphaVantageAdapter;
pub use cache::{CacheStats, NoopCache, ResponseCache, SharedCache, TtlCache};
pub use mock::{Feed, StaticProvider};
pub use provider::{MarketDataProvider, ProviderError};
pub use rate_limiter::{shared_limiter, RateLimiter, SharedRateLimiter};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Quote & Overview
// ============================================================================

/// Latest quote for a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    /// Percent change, e.g. `1.25` for +1.25%
    pub change_percent: Option<f64>,
    pub latest_trading_day: Option<String>,
}

/// Company overview metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub dividend_per_share: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub beta: Option<f64>,
    pub market_capitalization: Option<f64>,
}

// ============================================================================
// Annual Statements
// ============================================================================

/// One annual cash-flow statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub fiscal_date_ending: String,
    pub operating_cashflow: Option<f64>,
    pub capital_expenditures: Option<f64>,
}

/// One annual income statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeReport {
    pub fiscal_date_ending: String,
    pub net_income: Option<f64>,
    pub diluted_shares: Option<f64>,
    pub basic_shares: Option<f64>,
    pub common_shares_outstanding: Option<f64>,
    pub ebitda: Option<f64>,
    pub interest_expense: Option<f64>,
    pub income_before_tax: Option<f64>,
    pub income_tax_expense: Option<f64>,
}

/// One annual balance sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub fiscal_date_ending: String,
    pub short_term_debt: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub short_long_term_debt_total: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub cash_and_short_term_investments: Option<f64>,
}

/// Month-end date (`YYYY-MM-DD`) to adjusted close.
pub type MonthlyAdjustedSeries = BTreeMap<String, Option<f64>>;

/// One trading day of the raw daily series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// Trading date (`YYYY-MM-DD`) to its bar; about 100 recent sessions.
pub type DailySeries = BTreeMap<String, DailyBar>;

/// Four-digit year to a finite value, ascending by year.
pub type YearSeries = BTreeMap<String, f64>;

// ============================================================================
// News
// ============================================================================

/// Sentiment score attached to one ticker mentioned in an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSentiment {
    pub ticker: String,
    pub score: Option<f64>,
}

/// A news article as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub time_published: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

// ============================================================================
// Bundles
// ============================================================================

/// The statements the DCF model needs.
#[derive(Debug, Clone, Default)]
pub struct FinancialStatements {
    pub overview: CompanyOverview,
    /// Most recent first, as the provider returns them
    pub cash_flow: Vec<CashFlowReport>,
    /// Most recent first
    pub income: Vec<IncomeReport>,
    /// Most recent first
    pub balance: Vec<BalanceReport>,
}

/// Everything fetched for one symbol.
#[derive(Debug, Clone, Default)]
pub struct FundamentalsBundle {
    pub quote: Quote,
    pub statements: FinancialStatements,
    pub monthly: MonthlyAdjustedSeries,
    pub news: Vec<NewsArticle>,
}
