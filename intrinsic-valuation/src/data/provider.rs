//! Market data provider abstraction.
//!
//! Defines the `MarketDataProvider` trait every upstream source implements,
//! and the error type those sources report.

use async_trait::async_trait;
use std::fmt;

use super::cache::CacheStats;
use super::{
    BalanceReport, CashFlowReport, CompanyOverview, DailySeries, IncomeReport,
    MonthlyAdjustedSeries, NewsArticle, Quote,
};

// ============================================================================
// Provider Error
// ============================================================================

/// Errors reported by market data providers.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed, timeout)
    Network(String),
    /// Non-success HTTP status
    Http { status: u16, message: String },
    /// Missing or rejected API key
    Auth(String),
    /// Upstream rate limit or premium notice
    RateLimited(String),
    /// Upstream rejected the request parameters (e.g. unknown symbol)
    InvalidRequest(String),
    /// Upstream answered but has no data for the symbol
    DataNotAvailable(String),
    /// Response body could not be decoded
    Malformed(String),
    /// Internal provider error
    Internal(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            Self::Auth(msg) => write!(f, "Authentication error: {}", msg),
            Self::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::DataNotAvailable(msg) => write!(f, "Data not available: {}", msg),
            Self::Malformed(msg) => write!(f, "Malformed response: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for intrinsic_common::Error {
    fn from(err: ProviderError) -> Self {
        use intrinsic_common::Error;

        match err {
            ProviderError::RateLimited(msg) => Error::RateLimited(msg),
            ProviderError::InvalidRequest(msg) => Error::InvalidInput(msg),
            ProviderError::DataNotAvailable(msg) => Error::NotFound(msg),
            ProviderError::Auth(msg) => Error::Auth(msg),
            other => Error::External(other.to_string()),
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Source of quotes, fundamentals and news for a ticker symbol.
///
/// Annual report lists come back most recent first.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider name (e.g. "alpha_vantage")
    fn name(&self) -> &'static str;

    async fn get_quote(&self, symbol: &str) -> Result<Quote, ProviderError>;

    async fn get_overview(&self, symbol: &str) -> Result<CompanyOverview, ProviderError>;

    async fn get_cash_flow_reports(&self, symbol: &str)
        -> Result<Vec<CashFlowReport>, ProviderError>;

    async fn get_income_reports(&self, symbol: &str) -> Result<Vec<IncomeReport>, ProviderError>;

    async fn get_balance_reports(&self, symbol: &str)
        -> Result<Vec<BalanceReport>, ProviderError>;

    async fn get_monthly_adjusted_series(
        &self,
        symbol: &str,
    ) -> Result<MonthlyAdjustedSeries, ProviderError>;

    /// Recent daily bars (compact window, unadjusted).
    async fn get_daily_series(&self, symbol: &str) -> Result<DailySeries, ProviderError>;

    /// Fetch up to `limit` recent articles mentioning `symbol`.
    async fn get_news(&self, symbol: &str, limit: usize)
        -> Result<Vec<NewsArticle>, ProviderError>;

    /// Response cache statistics, when the provider caches.
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }

    /// Drop any cached responses for `symbol`.
    fn invalidate(&self, _symbol: &str) {}
}
