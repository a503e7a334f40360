//! In-memory provider serving a fixed bundle.
//!
//! Used by tests and for running the service without network access.
//! Individual feeds can be configured to fail.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use super::provider::{MarketDataProvider, ProviderError};
use super::{
    BalanceReport, CashFlowReport, CompanyOverview, DailySeries, FundamentalsBundle,
    IncomeReport, MonthlyAdjustedSeries, NewsArticle, Quote,
};

/// One upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Quote,
    Overview,
    CashFlow,
    Income,
    Balance,
    Daily,
    Monthly,
    News,
}

/// Provider returning clones of a fixed bundle.
pub struct StaticProvider {
    bundle: FundamentalsBundle,
    daily: DailySeries,
    failures: HashMap<Feed, ProviderError>,
    calls: AtomicU32,
    invalidations: AtomicU32,
}

impl StaticProvider {
    pub fn new(bundle: FundamentalsBundle) -> Self {
        Self {
            bundle,
            daily: DailySeries::new(),
            failures: HashMap::new(),
            calls: AtomicU32::new(0),
            invalidations: AtomicU32::new(0),
        }
    }

    /// Serve `daily` from the daily series feed.
    pub fn with_daily(mut self, daily: DailySeries) -> Self {
        self.daily = daily;
        self
    }

    /// Make `feed` fail with `err`.
    pub fn failing(mut self, feed: Feed, err: ProviderError) -> Self {
        self.failures.insert(feed, err);
        self
    }

    /// Total number of feed calls served (including failures).
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of cache invalidations requested.
    pub fn invalidation_count(&self) -> u32 {
        self.invalidations.load(Ordering::Relaxed)
    }

    fn serve<T: Clone>(&self, feed: Feed, value: &T) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.failures.get(&feed) {
            Some(err) => Err(err.clone()),
            None => Ok(value.clone()),
        }
    }
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_quote(&self, _symbol: &str) -> Result<Quote, ProviderError> {
        self.serve(Feed::Quote, &self.bundle.quote)
    }

    async fn get_overview(&self, _symbol: &str) -> Result<CompanyOverview, ProviderError> {
        self.serve(Feed::Overview, &self.bundle.statements.overview)
    }

    async fn get_cash_flow_reports(
        &self,
        _symbol: &str,
    ) -> Result<Vec<CashFlowReport>, ProviderError> {
        self.serve(Feed::CashFlow, &self.bundle.statements.cash_flow)
    }

    async fn get_income_reports(&self, _symbol: &str) -> Result<Vec<IncomeReport>, ProviderError> {
        self.serve(Feed::Income, &self.bundle.statements.income)
    }

    async fn get_balance_reports(
        &self,
        _symbol: &str,
    ) -> Result<Vec<BalanceReport>, ProviderError> {
        self.serve(Feed::Balance, &self.bundle.statements.balance)
    }

    async fn get_monthly_adjusted_series(
        &self,
        _symbol: &str,
    ) -> Result<MonthlyAdjustedSeries, ProviderError> {
        self.serve(Feed::Monthly, &self.bundle.monthly)
    }

    async fn get_daily_series(&self, _symbol: &str) -> Result<DailySeries, ProviderError> {
        self.serve(Feed::Daily, &self.daily)
    }

    async fn get_news(
        &self,
        _symbol: &str,
        limit: usize,
    ) -> Result<Vec<NewsArticle>, ProviderError> {
        let mut news = self.serve(Feed::News, &self.bundle.news)?;
        news.truncate(limit);
        Ok(news)
    }

    fn invalidate(&self, _symbol: &str) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }
}
