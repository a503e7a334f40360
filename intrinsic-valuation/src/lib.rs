//! Intrinsic Valuation Library
//!
//! Builds a one-page valuation summary for a listed company from Alpha Vantage
//! fundamentals: historical-multiples intrinsic value, a DCF cross-check and
//! aggregate news sentiment.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 intrinsic-valuation (Rust Service)                  │
//! │                               :4440                                 │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐      │
//! │  │  Market Data    │  │  Multiples      │  │  DCF            │      │
//! │  │  Aggregator     │  │  OnePager       │  │  Engine         │      │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘      │
//! │  ┌─────────────────┐  ┌─────────────────┐                           │
//! │  │  Alpha Vantage  │  │  TTL Cache +    │                           │
//! │  │  Adapter        │  │  Rate Limiter   │                           │
//! │  └─────────────────┘  └─────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Upstream fetches for one request run concurrently and are joined before
//! any computation; the valuation engines themselves are pure.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod error;
pub mod numeric;
pub mod routes;
pub mod valuation;

use anyhow::Result;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use intrinsic_common::Config;

use crate::data::{
    CacheStats, DailySeries, MarketDataAggregator, MarketDataProvider, ProviderError, Quote,
};
use crate::valuation::{
    aggregate_sentiment, normalize_news, DcfConfig, DcfEngine, DcfResult, MultiplesConfig,
    NewsItem, OnePagerBuilder, OnePagerReport, Sentiment,
};

/// Upper bound on a single HTTP request, upstream fetches included
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Normalized news with aggregate sentiment.
#[derive(Debug, Clone, Serialize)]
pub struct NewsResponse {
    pub symbol: String,
    pub articles: Vec<NewsItem>,
    pub sentiment: Sentiment,
}

/// Recent daily bars keyed by trading date.
#[derive(Debug, Clone, Serialize)]
pub struct DailyResponse {
    pub symbol: String,
    pub series: DailySeries,
}

/// Provider and cache status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub provider: String,
    pub cache: Option<CacheStats>,
    pub pe_weight: f64,
    pub lookback_years: usize,
}

/// Valuation service: fetches fundamentals and runs the engines.
pub struct ValuationService {
    aggregator: MarketDataAggregator,
    builder: OnePagerBuilder,
    dcf: DcfEngine,
}

impl ValuationService {
    /// Create with default engine settings.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            aggregator: MarketDataAggregator::new(provider),
            builder: OnePagerBuilder::new(),
            dcf: DcfEngine::new(),
        }
    }

    /// Create from config.
    pub fn from_config(config: &Config, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            aggregator: MarketDataAggregator::from_config(provider, config),
            builder: OnePagerBuilder::with_config(MultiplesConfig::from_config(&config.valuation)),
            dcf: DcfEngine::with_config(DcfConfig::from_config(&config.valuation)),
        }
    }

    pub fn aggregator(&self) -> &MarketDataAggregator {
        &self.aggregator
    }

    /// Fetch everything and build the one-pager.
    pub async fn build_one_pager(&self, symbol: &str) -> Result<OnePagerReport, ProviderError> {
        let bundle = self.aggregator.fetch_bundle(symbol).await?;
        Ok(self.builder.build(symbol, &bundle))
    }

    /// One-pager with the DCF attached, computed from the same fetch.
    pub async fn build_one_pager_with_dcf(
        &self,
        symbol: &str,
    ) -> Result<OnePagerReport, ProviderError> {
        let bundle = self.aggregator.fetch_bundle(symbol).await?;
        let report = self.builder.build(symbol, &bundle);
        let dcf = self.dcf.compute_from_bundle(&bundle, report.price.value());
        Ok(OnePagerBuilder::with_dcf(report, dcf))
    }

    /// DCF from statements only. `current_price` drives the upside.
    pub async fn compute_dcf(
        &self,
        symbol: &str,
        current_price: Option<f64>,
    ) -> Result<DcfResult, ProviderError> {
        let statements = self.aggregator.fetch_statements(symbol).await?;
        Ok(self.dcf.compute(&statements, current_price))
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        self.aggregator.fetch_quote(symbol).await
    }

    pub async fn daily(&self, symbol: &str) -> Result<DailyResponse, ProviderError> {
        let series = self.aggregator.fetch_daily(symbol).await?;
        Ok(DailyResponse {
            symbol: symbol.to_string(),
            series,
        })
    }

    /// Forget cached upstream responses so the next request refetches.
    pub fn invalidate(&self, symbol: &str) {
        self.aggregator.invalidate(symbol);
    }

    /// Normalized news and sentiment; an unavailable feed yields no articles.
    pub async fn news(&self, symbol: &str, limit: usize) -> NewsResponse {
        let articles = self.aggregator.fetch_news(symbol, limit).await;
        NewsResponse {
            symbol: symbol.to_string(),
            sentiment: aggregate_sentiment(&articles, symbol),
            articles: normalize_news(&articles),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        let config = self.builder.config();
        ServiceStatus {
            provider: self.aggregator.provider_name().to_string(),
            cache: self.aggregator.cache_stats(),
            pe_weight: config.pe_weight,
            lookback_years: config.lookback_years,
        }
    }
}

/// Serve the HTTP API until the process is stopped.
pub async fn start(config: &Config, service: Arc<ValuationService>) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::build_router(routes::AppState::new(service))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.bind_address(), config.valuation_port()).parse()?;
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
