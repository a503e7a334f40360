//! Alpha Vantage adapter for quotes, fundamentals and news.
//!
//! # API Documentation
//! <https://www.alphavantage.co/documentation/>
//!
//! # Endpoints
//! All calls go to `GET {base}/query?function=...&symbol=...&apikey=...`:
//! `GLOBAL_QUOTE`, `OVERVIEW`, `CASH_FLOW`, `INCOME_STATEMENT`,
//! `BALANCE_SHEET`, `TIME_SERIES_DAILY`, `TIME_SERIES_MONTHLY_ADJUSTED` and
//! `NEWS_SENTIMENT`.
//!
//! # Quirks
//! - Quota and premium notices come back as HTTP 200 with a `"Note"` or
//!   `"Information"` body; unknown functions/symbols as `"Error Message"`
//! - Numbers are strings, sometimes `"None"` or `"-"`

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use intrinsic_common::util::{sanitize_for_log, truncate_with_ellipsis};
use intrinsic_common::Config;

use super::cache::{NoopCache, ResponseCache, SharedCache, TtlCache};
use super::provider::{MarketDataProvider, ProviderError};
use super::rate_limiter::{shared_limiter, SharedRateLimiter};
use super::{
    BalanceReport, CashFlowReport, CompanyOverview, DailyBar, DailySeries, IncomeReport,
    MonthlyAdjustedSeries, NewsArticle, Quote, TickerSentiment,
};
use crate::numeric::{lenient_f64, parse_finite};

// ============================================================================
// Constants
// ============================================================================

/// Alpha Vantage API base URL
const ALPHA_VANTAGE_API_BASE: &str = "https://www.alphavantage.co";

/// Query endpoint shared by every function
const QUERY_ENDPOINT: &str = "/query";

/// Premium tier: 75 requests per minute
const DEFAULT_RATE_LIMIT_RPM: u32 = 75;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Raw payloads
// ============================================================================

/// Strings that Alpha Vantage uses for "no value".
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && s != "None" && s != "-").then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
struct RawQuote {
    #[serde(rename = "01. symbol", default, deserialize_with = "lenient_string")]
    symbol: Option<String>,
    #[serde(rename = "05. price", default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(rename = "07. latest trading day", default, deserialize_with = "lenient_string")]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close", default, deserialize_with = "lenient_f64")]
    previous_close: Option<f64>,
    #[serde(rename = "09. change", default, deserialize_with = "lenient_f64")]
    change: Option<f64>,
    #[serde(rename = "10. change percent", default, deserialize_with = "lenient_f64")]
    change_percent: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOverview {
    #[serde(rename = "Symbol", default, deserialize_with = "lenient_string")]
    symbol: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(rename = "Sector", default, deserialize_with = "lenient_string")]
    sector: Option<String>,
    #[serde(rename = "PERatio", default, deserialize_with = "lenient_f64")]
    pe_ratio: Option<f64>,
    #[serde(rename = "EPS", default, deserialize_with = "lenient_f64")]
    eps: Option<f64>,
    #[serde(rename = "DividendPerShare", default, deserialize_with = "lenient_f64")]
    dividend_per_share: Option<f64>,
    #[serde(rename = "SharesOutstanding", default, deserialize_with = "lenient_f64")]
    shares_outstanding: Option<f64>,
    #[serde(rename = "Beta", default, deserialize_with = "lenient_f64")]
    beta: Option<f64>,
    #[serde(rename = "MarketCapitalization", default, deserialize_with = "lenient_f64")]
    market_capitalization: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCashFlow {
    #[serde(default, deserialize_with = "lenient_string")]
    fiscal_date_ending: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    operating_cashflow: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    capital_expenditures: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIncome {
    #[serde(default, deserialize_with = "lenient_string")]
    fiscal_date_ending: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    net_income: Option<f64>,
    #[serde(rename = "weightedAverageShsOutDil", default, deserialize_with = "lenient_f64")]
    diluted_shares: Option<f64>,
    #[serde(rename = "weightedAverageShsOut", default, deserialize_with = "lenient_f64")]
    basic_shares: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    common_stock_shares_outstanding: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    ebitda: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    interest_expense: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    income_before_tax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    income_tax_expense: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBalance {
    #[serde(default, deserialize_with = "lenient_string")]
    fiscal_date_ending: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    short_term_debt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    long_term_debt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    short_long_term_debt_total: Option<f64>,
    #[serde(
        rename = "cashAndCashEquivalentsAtCarryingValue",
        default,
        deserialize_with = "lenient_f64"
    )]
    cash_and_equivalents: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    cash_and_short_term_investments: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTickerSentiment {
    #[serde(default, deserialize_with = "lenient_string")]
    ticker: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    ticker_sentiment_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawArticle {
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    time_published: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    summary: Option<String>,
    #[serde(default)]
    ticker_sentiment: Vec<Value>,
}

// ============================================================================
// Payload parsing
// ============================================================================

/// Map Alpha Vantage notice bodies to errors.
fn check_notices(body: &Value) -> Result<(), ProviderError> {
    if let Value::String(msg) = body {
        return Err(ProviderError::RateLimited(msg.clone()));
    }
    let text = |key: &str| body.get(key).map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string));

    if let Some(msg) = text("Note").or_else(|| text("Information")) {
        return Err(ProviderError::RateLimited(msg));
    }
    if let Some(msg) = text("Error Message") {
        return Err(ProviderError::InvalidRequest(msg));
    }
    if !body.is_object() {
        return Err(ProviderError::Malformed(format!(
            "expected a JSON object, got {}",
            truncate_with_ellipsis(&body.to_string(), 80)
        )));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ProviderError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::Malformed(format!("Failed to decode {}: {}", what, e)))
}

/// Decode each element of `body[key]`, skipping elements that do not decode.
fn decode_list<T: DeserializeOwned>(body: &Value, key: &str) -> Vec<T> {
    let Some(items) = body.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(key = key, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect()
}

fn parse_quote(symbol: &str, body: &Value) -> Result<Quote, ProviderError> {
    let raw: RawQuote = match body.get("Global Quote") {
        Some(row) => decode(row.clone(), "GLOBAL_QUOTE")?,
        None => RawQuote::default(),
    };

    Ok(Quote {
        symbol: raw.symbol.unwrap_or_else(|| symbol.to_string()),
        price: raw.price,
        previous_close: raw.previous_close,
        change: raw.change,
        change_percent: raw.change_percent,
        latest_trading_day: raw.latest_trading_day,
    })
}

fn parse_overview(symbol: &str, body: &Value) -> Result<CompanyOverview, ProviderError> {
    if body.as_object().is_some_and(|o| o.is_empty()) {
        return Err(ProviderError::DataNotAvailable(format!(
            "no company overview for {}",
            symbol
        )));
    }
    let raw: RawOverview = decode(body.clone(), "OVERVIEW")?;

    Ok(CompanyOverview {
        symbol: raw.symbol.unwrap_or_else(|| symbol.to_string()),
        name: raw.name,
        sector: raw.sector,
        pe_ratio: raw.pe_ratio,
        eps: raw.eps,
        dividend_per_share: raw.dividend_per_share,
        shares_outstanding: raw.shares_outstanding,
        beta: raw.beta,
        market_capitalization: raw.market_capitalization,
    })
}

fn parse_cash_flow(body: &Value) -> Vec<CashFlowReport> {
    decode_list::<RawCashFlow>(body, "annualReports")
        .into_iter()
        .map(|r| CashFlowReport {
            fiscal_date_ending: r.fiscal_date_ending.unwrap_or_default(),
            operating_cashflow: r.operating_cashflow,
            capital_expenditures: r.capital_expenditures,
        })
        .collect()
}

fn parse_income(body: &Value) -> Vec<IncomeReport> {
    decode_list::<RawIncome>(body, "annualReports")
        .into_iter()
        .map(|r| IncomeReport {
            fiscal_date_ending: r.fiscal_date_ending.unwrap_or_default(),
            net_income: r.net_income,
            diluted_shares: r.diluted_shares,
            basic_shares: r.basic_shares,
            common_shares_outstanding: r.common_stock_shares_outstanding,
            ebitda: r.ebitda,
            interest_expense: r.interest_expense,
            income_before_tax: r.income_before_tax,
            income_tax_expense: r.income_tax_expense,
        })
        .collect()
}

fn parse_balance(body: &Value) -> Vec<BalanceReport> {
    decode_list::<RawBalance>(body, "annualReports")
        .into_iter()
        .map(|r| BalanceReport {
            fiscal_date_ending: r.fiscal_date_ending.unwrap_or_default(),
            short_term_debt: r.short_term_debt,
            long_term_debt: r.long_term_debt,
            short_long_term_debt_total: r.short_long_term_debt_total,
            cash_and_equivalents: r.cash_and_equivalents,
            cash_and_short_term_investments: r.cash_and_short_term_investments,
        })
        .collect()
}

fn parse_monthly(body: &Value) -> MonthlyAdjustedSeries {
    let Some(series) = body
        .get("Monthly Adjusted Time Series")
        .and_then(Value::as_object)
    else {
        return MonthlyAdjustedSeries::new();
    };

    series
        .iter()
        .map(|(date, row)| {
            let close = row.get("5. adjusted close").and_then(parse_finite);
            (date.clone(), close)
        })
        .collect()
}

fn parse_daily(body: &Value) -> DailySeries {
    let Some(series) = body.get("Time Series (Daily)").and_then(Value::as_object) else {
        return DailySeries::new();
    };

    series
        .iter()
        .map(|(date, row)| {
            let field = |key: &str| row.get(key).and_then(parse_finite);
            let bar = DailyBar {
                open: field("1. open"),
                high: field("2. high"),
                low: field("3. low"),
                close: field("4. close"),
                volume: field("5. volume"),
            };
            (date.clone(), bar)
        })
        .collect()
}

fn parse_news(body: &Value) -> Vec<NewsArticle> {
    decode_list::<RawArticle>(body, "feed")
        .into_iter()
        .map(|a| NewsArticle {
            title: a.title.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            source: a.source.unwrap_or_default(),
            time_published: a.time_published,
            summary: a.summary,
            ticker_sentiment: a
                .ticker_sentiment
                .into_iter()
                .filter_map(|v| serde_json::from_value::<RawTickerSentiment>(v).ok())
                .map(|t| TickerSentiment {
                    ticker: t.ticker.unwrap_or_default(),
                    score: t.ticker_sentiment_score,
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Alpha Vantage Adapter
// ============================================================================

/// Alpha Vantage market data adapter.
///
/// Every request acquires a rate-limit token first. Fundamentals, monthly
/// series and news go through the injected response cache; quotes never do.
pub struct AlphaVantageAdapter {
    /// API key; requests fail with `Auth` when absent
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
    rate_limiter: SharedRateLimiter,
    cache: SharedCache,
}

impl AlphaVantageAdapter {
    /// Create with default endpoint, rate limit and a 15-minute cache.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_settings(
            api_key,
            ALPHA_VANTAGE_API_BASE,
            DEFAULT_RATE_LIMIT_RPM,
            DEFAULT_TIMEOUT_SECS,
            Arc::new(TtlCache::new()),
        )
    }

    /// Create with explicit settings.
    pub fn with_settings(
        api_key: Option<String>,
        base_url: impl Into<String>,
        rate_limit_rpm: u32,
        timeout_secs: u64,
        cache: SharedCache,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            rate_limiter: shared_limiter("alpha_vantage", rate_limit_rpm),
            cache,
        }
    }

    /// Create from config. A zero cache TTL disables caching.
    pub fn from_config(config: &Config) -> Self {
        let md = &config.market_data;
        let cache: SharedCache = if md.cache_ttl_secs > 0 {
            Arc::new(TtlCache::with_ttl(md.cache_ttl_secs))
        } else {
            Arc::new(NoopCache)
        };

        Self::with_settings(
            config.alpha_vantage_api_key(),
            md.base_url.clone(),
            md.rate_limit_rpm,
            md.request_timeout_secs,
            cache,
        )
    }

    /// Run one query. `cache_key` of `None` bypasses the cache.
    async fn query(
        &self,
        function: &str,
        params: &[(&str, String)],
        cache_key: Option<String>,
    ) -> Result<Value, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Auth("ALPHA_VANTAGE_API_KEY is not set".into()))?;

        if let Some(key) = &cache_key {
            if let Some(body) = self.cache.get(key) {
                debug!(key = %key, "Alpha Vantage cache hit");
                return Ok(body);
            }
            debug!(key = %key, "Alpha Vantage cache miss");
        }

        let url = format!("{}{}", self.base_url, QUERY_ENDPOINT);
        let mut query: Vec<(&str, &str)> = vec![("function", function)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        query.push(("apikey", api_key));

        let request = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(&query)
            .build()
            .map_err(|e| ProviderError::Internal(format!("Failed to build request: {}", e)))?;

        // Acquire rate limit token before making request
        self.rate_limiter.acquire().await;

        debug!(
            url = %sanitize_for_log(request.url().as_str()),
            function = function,
            "Fetching from Alpha Vantage"
        );

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Network("Request timeout".into())
            } else if e.is_connect() {
                ProviderError::Network("Connection failed".into())
            } else {
                ProviderError::Network(sanitize_for_log(&e.to_string()))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: truncate_with_ellipsis(&body, 200),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to read body: {}", e)))?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            ProviderError::Malformed(format!("{} returned invalid JSON: {}", function, e))
        })?;

        if let Err(e) = check_notices(&body) {
            if matches!(e, ProviderError::RateLimited(_)) {
                warn!(function = function, error = %e, "Alpha Vantage quota notice");
            }
            return Err(e);
        }

        if let Some(key) = cache_key {
            self.cache.set(&key, body.clone());
        }

        Ok(body)
    }

    async fn query_symbol(
        &self,
        function: &str,
        symbol: &str,
        cached: bool,
    ) -> Result<Value, ProviderError> {
        let cache_key = cached.then(|| format!("{}:{}", symbol.to_uppercase(), function));
        self.query(function, &[("symbol", symbol.to_string())], cache_key)
            .await
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for AlphaVantageAdapter {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let body = self.query_symbol("GLOBAL_QUOTE", symbol, false).await?;
        parse_quote(symbol, &body)
    }

    async fn get_overview(&self, symbol: &str) -> Result<CompanyOverview, ProviderError> {
        let body = self.query_symbol("OVERVIEW", symbol, true).await?;
        parse_overview(symbol, &body)
    }

    async fn get_cash_flow_reports(
        &self,
        symbol: &str,
    ) -> Result<Vec<CashFlowReport>, ProviderError> {
        let body = self.query_symbol("CASH_FLOW", symbol, true).await?;
        Ok(parse_cash_flow(&body))
    }

    async fn get_income_reports(&self, symbol: &str) -> Result<Vec<IncomeReport>, ProviderError> {
        let body = self.query_symbol("INCOME_STATEMENT", symbol, true).await?;
        Ok(parse_income(&body))
    }

    async fn get_balance_reports(
        &self,
        symbol: &str,
    ) -> Result<Vec<BalanceReport>, ProviderError> {
        let body = self.query_symbol("BALANCE_SHEET", symbol, true).await?;
        Ok(parse_balance(&body))
    }

    async fn get_monthly_adjusted_series(
        &self,
        symbol: &str,
    ) -> Result<MonthlyAdjustedSeries, ProviderError> {
        let body = self
            .query_symbol("TIME_SERIES_MONTHLY_ADJUSTED", symbol, true)
            .await?;
        Ok(parse_monthly(&body))
    }

    async fn get_daily_series(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
        let function = "TIME_SERIES_DAILY";
        let cache_key = format!("{}:{}", symbol.to_uppercase(), function);
        let params = [
            ("symbol", symbol.to_string()),
            ("outputsize", "compact".to_string()),
        ];

        let body = self.query(function, &params, Some(cache_key)).await?;
        Ok(parse_daily(&body))
    }

    async fn get_news(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<NewsArticle>, ProviderError> {
        let function = "NEWS_SENTIMENT";
        let cache_key = format!("{}:{}:{}", symbol.to_uppercase(), function, limit);
        let params = [("tickers", symbol.to_string()), ("limit", limit.to_string())];

        let body = self.query(function, &params, Some(cache_key)).await?;
        let mut articles = parse_news(&body);
        articles.truncate(limit);
        Ok(articles)
    }

    fn cache_stats(&self) -> Option<super::CacheStats> {
        Some(self.cache.stats())
    }

    fn invalidate(&self, symbol: &str) {
        debug!(symbol = symbol, "Invalidating Alpha Vantage cache");
        self.cache.invalidate(symbol);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_notices() {
        let note = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."});
        assert!(matches!(check_notices(&note), Err(ProviderError::RateLimited(m)) if m.contains("frequency")));

        let info = json!({"Information": "This is a premium endpoint."});
        assert!(matches!(check_notices(&info), Err(ProviderError::RateLimited(_))));

        let err = json!({"Error Message": "Invalid API call."});
        assert!(matches!(check_notices(&err), Err(ProviderError::InvalidRequest(_))));

        assert!(matches!(check_notices(&json!([1, 2])), Err(ProviderError::Malformed(_))));
        assert!(check_notices(&json!({"Symbol": "IBM"})).is_ok());
    }

    #[test]
    fn test_parse_quote() {
        let body = json!({
            "Global Quote": {
                "01. symbol": "IBM",
                "05. price": "185.2300",
                "07. latest trading day": "2024-05-10",
                "08. previous close": "183.0000",
                "09. change": "2.2300",
                "10. change percent": "1.2186%"
            }
        });
        let quote = parse_quote("IBM", &body).unwrap();
        assert_eq!(quote.price, Some(185.23));
        assert_eq!(quote.previous_close, Some(183.0));
        assert_eq!(quote.change_percent, Some(1.2186));
        assert_eq!(quote.latest_trading_day.as_deref(), Some("2024-05-10"));
    }

    #[test]
    fn test_parse_quote_unknown_symbol() {
        let quote = parse_quote("NOPE", &json!({"Global Quote": {}})).unwrap();
        assert_eq!(quote.symbol, "NOPE");
        assert!(quote.price.is_none());
    }

    #[test]
    fn test_parse_overview() {
        let body = json!({
            "Symbol": "IBM",
            "Name": "International Business Machines",
            "Sector": "TECHNOLOGY",
            "PERatio": "22.5",
            "EPS": "None",
            "DividendPerShare": "6.64",
            "SharesOutstanding": "916000000",
            "Beta": "-",
            "MarketCapitalization": "170000000000"
        });
        let overview = parse_overview("IBM", &body).unwrap();
        assert_eq!(overview.name.as_deref(), Some("International Business Machines"));
        assert_eq!(overview.pe_ratio, Some(22.5));
        assert!(overview.eps.is_none());
        assert!(overview.beta.is_none());
        assert_eq!(overview.shares_outstanding, Some(916_000_000.0));
    }

    #[test]
    fn test_parse_overview_empty_is_not_available() {
        assert!(matches!(
            parse_overview("NOPE", &json!({})),
            Err(ProviderError::DataNotAvailable(_))
        ));
    }

    #[test]
    fn test_parse_annual_reports_tolerates_junk() {
        let body = json!({
            "symbol": "IBM",
            "annualReports": [
                {"fiscalDateEnding": "2023-12-31", "operatingCashflow": "13931000000", "capitalExpenditures": "1245000000"},
                "garbage",
                {"fiscalDateEnding": "2022-12-31", "operatingCashflow": "None"}
            ]
        });
        let reports = parse_cash_flow(&body);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].operating_cashflow, Some(13_931_000_000.0));
        assert!(reports[1].operating_cashflow.is_none());
        assert!(reports[1].capital_expenditures.is_none());
    }

    #[test]
    fn test_parse_income_and_balance() {
        let income = parse_income(&json!({"annualReports": [{
            "fiscalDateEnding": "2023-12-31",
            "netIncome": "7502000000",
            "weightedAverageShsOutDil": "922000000",
            "ebitda": "14000000000",
            "interestExpense": "1607000000",
            "incomeBeforeTax": "8690000000",
            "incomeTaxExpense": "-1176000000"
        }]}));
        assert_eq!(income[0].diluted_shares, Some(922_000_000.0));
        assert_eq!(income[0].income_tax_expense, Some(-1_176_000_000.0));
        assert!(income[0].basic_shares.is_none());

        let balance = parse_balance(&json!({"annualReports": [{
            "fiscalDateEnding": "2023-12-31",
            "shortTermDebt": "6426000000",
            "longTermDebt": "50121000000",
            "cashAndCashEquivalentsAtCarryingValue": "13068000000"
        }]}));
        assert_eq!(balance[0].short_term_debt, Some(6_426_000_000.0));
        assert_eq!(balance[0].cash_and_equivalents, Some(13_068_000_000.0));
    }

    #[test]
    fn test_parse_monthly() {
        let body = json!({
            "Monthly Adjusted Time Series": {
                "2024-04-30": {"5. adjusted close": "166.2000"},
                "2024-03-28": {"5. adjusted close": "None"}
            }
        });
        let series = parse_monthly(&body);
        assert_eq!(series.get("2024-04-30"), Some(&Some(166.2)));
        assert_eq!(series.get("2024-03-28"), Some(&None));
        assert!(parse_monthly(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_daily() {
        let body = json!({
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-05-10": {
                    "1. open": "167.5000",
                    "2. high": "168.2000",
                    "3. low": "166.4800",
                    "4. close": "167.1500",
                    "5. volume": "3192476"
                },
                "2024-05-09": {"4. close": "None"}
            }
        });
        let series = parse_daily(&body);
        assert_eq!(series.len(), 2);
        let bar = &series["2024-05-10"];
        assert_eq!(bar.open, Some(167.5));
        assert_eq!(bar.close, Some(167.15));
        assert_eq!(bar.volume, Some(3_192_476.0));
        assert_eq!(series["2024-05-09"], DailyBar::default());
        assert!(parse_daily(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_news() {
        let body = json!({
            "items": "1",
            "feed": [{
                "title": "IBM beats estimates",
                "url": "https://example.com/ibm",
                "source": "Reuters",
                "time_published": "20240510T120000",
                "summary": "",
                "ticker_sentiment": [
                    {"ticker": "IBM", "ticker_sentiment_score": "0.31"},
                    {"ticker": "MSFT", "ticker_sentiment_score": "bad"}
                ]
            }]
        });
        let news = parse_news(&body);
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].source, "Reuters");
        assert!(news[0].summary.is_none());
        assert_eq!(news[0].ticker_sentiment[0].score, Some(0.31));
        assert!(news[0].ticker_sentiment[1].score.is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_auth_error() {
        let adapter = AlphaVantageAdapter::new(None);
        let err = adapter.get_overview("IBM").await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)));

        let adapter = AlphaVantageAdapter::new(Some("  ".into()));
        assert!(matches!(
            adapter.get_quote("IBM").await,
            Err(ProviderError::Auth(_))
        ));
    }
}
