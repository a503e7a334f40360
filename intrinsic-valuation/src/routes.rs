//! HTTP routes for the valuation service.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

use intrinsic_common::logging::generate_trace_id;
use intrinsic_common::request_span;
use intrinsic_common::ResultExt;
use intrinsic_common::util::normalize_symbol;

use crate::data::Quote;
use crate::error::ApiError;
use crate::valuation::{DcfResult, OnePagerReport};
use crate::{DailyResponse, NewsResponse, ServiceStatus, ValuationService};

/// Largest news page a caller may request
const MAX_NEWS_LIMIT: usize = 50;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ValuationService>,
}

impl AppState {
    pub fn new(service: Arc<ValuationService>) -> Self {
        Self { service }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/summary/:symbol", get(get_summary))
        .route("/api/v1/dcf/:symbol", get(get_dcf))
        .route("/api/v1/market/quote", get(get_quote))
        .route("/api/v1/market/news", get(get_news))
        .route("/api/v1/market/daily", get(get_daily))
        .route("/api/v1/cache/:symbol", delete(invalidate_cache))
        .route("/api/v1/status", get(get_status))
        .with_state(state)
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub symbol: String,
    pub invalidated: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub include_dcf: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DcfQuery {
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub symbol: Option<String>,
    pub limit: Option<usize>,
}

fn parse_symbol(raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::invalid_input("symbol is required"))?;
    normalize_symbol(raw)
        .ok_or_else(|| ApiError::invalid_input(format!("invalid symbol: {:?}", raw)))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "intrinsic-valuation".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// One-pager for a symbol, optionally with the DCF attached
pub async fn get_summary(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<OnePagerReport>, ApiError> {
    let symbol = parse_symbol(Some(&symbol))?;
    let span = request_span!(
        "summary",
        generate_trace_id(),
        symbol = %symbol,
        include_dcf = query.include_dcf
    );

    async move {
        let report = if query.include_dcf {
            state.service.build_one_pager_with_dcf(&symbol).await?
        } else {
            state.service.build_one_pager(&symbol).await?
        };
        tracing::info!(
            intrinsic = ?report.valuation.intrinsic_value.value(),
            sentiment = %report.sentiment.label,
            "One-pager built"
        );
        Ok::<_, ApiError>(Json(report))
    }
    .instrument(span)
    .await
}

/// DCF valuation; `price` enables the upside figure
pub async fn get_dcf(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<DcfQuery>,
) -> Result<Json<DcfResult>, ApiError> {
    let symbol = parse_symbol(Some(&symbol))?;
    if let Some(price) = query.price {
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::invalid_input(format!("invalid price: {}", price)));
        }
    }
    let span = request_span!("dcf", generate_trace_id(), symbol = %symbol);

    async move {
        let result = state
            .service
            .compute_dcf(&symbol, query.price)
            .await
            .context(format!("dcf for {symbol}"))?;
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(span)
    .await
}

/// Latest quote (never cached)
pub async fn get_quote(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<Quote>, ApiError> {
    let symbol = parse_symbol(query.symbol.as_deref())?;
    let span = request_span!("quote", generate_trace_id(), symbol = %symbol);

    async move { Ok::<_, ApiError>(Json(state.service.quote(&symbol).await?)) }
        .instrument(span)
        .await
}

/// Normalized news with aggregate sentiment
pub async fn get_news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<NewsResponse>, ApiError> {
    let symbol = parse_symbol(query.symbol.as_deref())?;
    let limit = query
        .limit
        .unwrap_or_else(|| state.service.aggregator().news_limit())
        .clamp(1, MAX_NEWS_LIMIT);
    let span = request_span!("news", generate_trace_id(), symbol = %symbol, limit = limit);

    let response = async move { state.service.news(&symbol, limit).await }
        .instrument(span)
        .await;
    Ok(Json(response))
}

/// Compact daily price series
pub async fn get_daily(
    State(state): State<AppState>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<DailyResponse>, ApiError> {
    let symbol = parse_symbol(query.symbol.as_deref())?;
    let span = request_span!("daily", generate_trace_id(), symbol = %symbol);

    async move {
        let response = state.service.daily(&symbol).await?;
        tracing::debug!(bars = response.series.len(), "Daily series fetched");
        Ok::<_, ApiError>(Json(response))
    }
    .instrument(span)
    .await
}

/// Drop cached upstream responses for a symbol
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    let symbol = parse_symbol(Some(&symbol))?;
    state.service.invalidate(&symbol);
    tracing::info!(symbol = %symbol, "Cache invalidated");

    Ok(Json(InvalidateResponse {
        symbol,
        invalidated: true,
    }))
}

/// Provider and cache status
pub async fn get_status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(state.service.status())
}
