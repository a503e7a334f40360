//! Concurrent fetching of everything a valuation needs.
//!
//! Independent upstream calls run concurrently and are joined before any
//! computation starts. Required feeds abort the request on failure; the news
//! feed is optional and degrades to an empty list.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use intrinsic_common::Config;

use super::provider::{MarketDataProvider, ProviderError};
use super::{
    CacheStats, DailySeries, FinancialStatements, FundamentalsBundle, NewsArticle, Quote,
};

/// Default number of articles requested per symbol
const DEFAULT_NEWS_LIMIT: usize = 10;

/// Market data aggregator over one provider.
pub struct MarketDataAggregator {
    provider: Arc<dyn MarketDataProvider>,
    news_limit: usize,
}

impl MarketDataAggregator {
    /// Create with the default news limit
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            news_limit: DEFAULT_NEWS_LIMIT,
        }
    }

    /// Create from config
    pub fn from_config(provider: Arc<dyn MarketDataProvider>, config: &Config) -> Self {
        Self::new(provider).with_news_limit(config.market_data.news_limit)
    }

    pub fn with_news_limit(mut self, limit: usize) -> Self {
        self.news_limit = limit.max(1);
        self
    }

    pub fn news_limit(&self) -> usize {
        self.news_limit
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.provider.cache_stats()
    }

    /// Fetch overview and annual statements concurrently.
    pub async fn fetch_statements(&self, symbol: &str) -> Result<FinancialStatements, ProviderError> {
        let (overview, cash_flow, income, balance) = tokio::try_join!(
            self.provider.get_overview(symbol),
            self.provider.get_cash_flow_reports(symbol),
            self.provider.get_income_reports(symbol),
            self.provider.get_balance_reports(symbol),
        )?;

        Ok(FinancialStatements {
            overview,
            cash_flow,
            income,
            balance,
        })
    }

    /// Fetch the full bundle for a one-pager.
    pub async fn fetch_bundle(&self, symbol: &str) -> Result<FundamentalsBundle, ProviderError> {
        let started = Instant::now();

        let (quote, statements, monthly, news) = tokio::join!(
            self.provider.get_quote(symbol),
            self.fetch_statements(symbol),
            self.provider.get_monthly_adjusted_series(symbol),
            self.fetch_news(symbol, self.news_limit),
        );

        let bundle = FundamentalsBundle {
            quote: quote?,
            statements: statements?,
            monthly: monthly?,
            news,
        };

        debug!(
            symbol = symbol,
            elapsed_ms = started.elapsed().as_millis() as u64,
            cash_flow_reports = bundle.statements.cash_flow.len(),
            income_reports = bundle.statements.income.len(),
            monthly_points = bundle.monthly.len(),
            articles = bundle.news.len(),
            "Fundamentals bundle fetched"
        );

        Ok(bundle)
    }

    /// Fetch news, treating any failure as an empty feed.
    pub async fn fetch_news(&self, symbol: &str, limit: usize) -> Vec<NewsArticle> {
        match self.provider.get_news(symbol, limit).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(symbol = symbol, error = %e, "News feed unavailable, continuing without it");
                Vec::new()
            }
        }
    }

    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        self.provider.get_quote(symbol).await
    }

    pub async fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
        self.provider.get_daily_series(symbol).await
    }

    /// Drop cached upstream responses for `symbol`.
    pub fn invalidate(&self, symbol: &str) {
        self.provider.invalidate(symbol);
    }
}
