//! Report types produced by the valuation pipelines.
//!
//! Every nullable numeric field is a [`Metric`], so reports serialize to
//! numbers or `null` and never to NaN.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::numeric::Metric;

// ============================================================================
// Multiples
// ============================================================================

/// One year's price, per-share fundamental and implied multiple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleSample {
    pub year: String,
    /// Average monthly adjusted close for the year
    pub price: f64,
    /// EPS or FCF per share for the year
    pub per_share: f64,
    /// `price / per_share`; unavailable unless `per_share > 0`
    pub multiple: Metric,
}

/// Overview fields echoed in the one-pager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSummary {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub pe_ratio: Metric,
    pub eps: Metric,
    pub dividend_per_share: Metric,
    /// Share count used for per-share figures
    pub shares_outstanding: Metric,
}

/// Historical-multiples valuation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplesValuation {
    pub method: String,
    pub intrinsic_value: Metric,
    #[serde(rename = "fairPE")]
    pub fair_pe: Metric,
    #[serde(rename = "fairPFCF")]
    pub fair_pfcf: Metric,
    #[serde(rename = "medPE")]
    pub med_pe: Metric,
    #[serde(rename = "medPFCF")]
    pub med_pfcf: Metric,
    #[serde(rename = "normEPS")]
    pub norm_eps: Metric,
    #[serde(rename = "normFCFPS")]
    pub norm_fcfps: Metric,
    /// `(intrinsic - price) / price * 100`
    pub undervalued_pct: Metric,
    pub pe_samples: Vec<MultipleSample>,
    pub pfcf_samples: Vec<MultipleSample>,
}

// ============================================================================
// News & Sentiment
// ============================================================================

/// Normalized news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Mixed,
    NoData,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
            Self::Mixed => write!(f, "mixed"),
            Self::NoData => write!(f, "no-data"),
        }
    }
}

/// Aggregate news sentiment for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Mean per-ticker score
    pub score: f64,
    /// Number of scores averaged
    pub n: usize,
}

impl Sentiment {
    pub fn no_data() -> Self {
        Self {
            label: SentimentLabel::NoData,
            score: 0.0,
            n: 0,
        }
    }
}

// ============================================================================
// DCF
// ============================================================================

/// Discounted-cash-flow valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfResult {
    /// Equity value per share
    pub intrinsic_value: Metric,
    /// Needs a current price
    pub upside_percent: Metric,
    pub wacc: f64,
    #[serde(rename = "growthCAGR")]
    pub growth_cagr: f64,
    pub terminal_growth: f64,
    pub last_free_cash_flow: Metric,
    pub total_debt: f64,
    pub cash_and_equivalents: f64,
    pub shares_outstanding: Metric,
    pub ev_to_ebitda: Metric,
    pub price_to_fcf: Metric,
    pub beta: f64,
    pub tax_rate: f64,
    pub cost_of_equity: f64,
    pub cost_of_debt: f64,
    /// Projected FCF for years 1..=5; empty without FCF history
    pub projected_fcf: Vec<f64>,
    pub pv_sum_fcf: Metric,
    pub pv_terminal_value: Metric,
    pub enterprise_value: Metric,
    pub equity_value: Metric,
}

// ============================================================================
// One-pager
// ============================================================================

/// Single-page valuation summary for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnePagerReport {
    pub as_of: DateTime<Utc>,
    pub symbol: String,
    pub price: Metric,
    pub prev_close: Metric,
    pub latest_day: Option<String>,
    pub overview: OverviewSummary,
    pub valuation: MultiplesValuation,
    pub news: Vec<NewsItem>,
    pub sentiment: Sentiment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcf: Option<DcfResult>,
}
