//! Historical-multiples valuation (P/E and P/FCF) and one-pager assembly.
//!
//! Fair value per method is the median historical multiple times the
//! normalized (median) per-share fundamental over the most recent years that
//! have both a price and a fundamental. The two methods are blended.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::sentiment::{aggregate_sentiment, normalize_news};
use super::types::{
    DcfResult, MultipleSample, MultiplesValuation, OnePagerReport, OverviewSummary,
};
use crate::data::{
    CashFlowReport, CompanyOverview, FundamentalsBundle, IncomeReport, MonthlyAdjustedSeries,
    YearSeries,
};
use crate::numeric::{fiscal_year, intersect_years, last_n, median, years_ascending, Metric};

/// Multiples configuration.
#[derive(Debug, Clone)]
pub struct MultiplesConfig {
    /// Weight of the P/E fair value in the blend; P/FCF gets `1 - pe_weight`
    pub pe_weight: f64,
    /// Most recent common years used per multiple
    pub lookback_years: usize,
}

impl Default for MultiplesConfig {
    fn default() -> Self {
        Self {
            pe_weight: 0.5,
            lookback_years: 5,
        }
    }
}

impl MultiplesConfig {
    pub fn from_config(config: &intrinsic_common::ValuationConfig) -> Self {
        Self {
            pe_weight: config.pe_weight.clamp(0.0, 1.0),
            lookback_years: config.lookback_years.max(1),
        }
    }
}

/// Builds one-pager reports from fetched fundamentals.
pub struct OnePagerBuilder {
    config: MultiplesConfig,
}

impl OnePagerBuilder {
    /// Create with default config.
    pub fn new() -> Self {
        Self::with_config(MultiplesConfig::default())
    }

    /// Create with custom config.
    pub fn with_config(config: MultiplesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MultiplesConfig {
        &self.config
    }

    /// Build a report stamped with the current time.
    pub fn build(&self, symbol: &str, bundle: &FundamentalsBundle) -> OnePagerReport {
        self.build_at(symbol, bundle, Utc::now())
    }

    /// Build a report stamped with `as_of`.
    pub fn build_at(
        &self,
        symbol: &str,
        bundle: &FundamentalsBundle,
        as_of: DateTime<Utc>,
    ) -> OnePagerReport {
        let quote = &bundle.quote;
        let price = Metric::from(quote.price).non_zero();
        let prev_close = Metric::from(quote.previous_close).non_zero();

        let overview = &bundle.statements.overview;
        let shares = resolve_shares(overview, &bundle.statements.income);

        OnePagerReport {
            as_of,
            symbol: symbol.to_string(),
            price,
            prev_close,
            latest_day: quote.latest_trading_day.clone(),
            overview: OverviewSummary {
                name: overview.name.clone(),
                sector: overview.sector.clone(),
                pe_ratio: Metric::from(overview.pe_ratio),
                eps: Metric::from(overview.eps),
                dividend_per_share: Metric::from(overview.dividend_per_share),
                shares_outstanding: Metric::from(shares),
            },
            valuation: self.valuate(bundle, price),
            news: normalize_news(&bundle.news),
            sentiment: aggregate_sentiment(&bundle.news, symbol),
            dcf: None,
        }
    }

    /// Attach a DCF computed from the same bundle.
    pub fn with_dcf(mut report: OnePagerReport, dcf: DcfResult) -> OnePagerReport {
        report.dcf = Some(dcf);
        report
    }

    /// Run the multiples valuation against `price`.
    pub fn valuate(&self, bundle: &FundamentalsBundle, price: Metric) -> MultiplesValuation {
        let statements = &bundle.statements;
        let shares = resolve_shares(&statements.overview, &statements.income);

        let price_avg_year = price_avg_by_year(&bundle.monthly);
        let eps_year = eps_by_year(&statements.income);
        let fcf_year = fcf_per_share_by_year(&statements.cash_flow, shares);

        let lookback = self.config.lookback_years;
        let years_pe = common_years(&price_avg_year, &eps_year, lookback);
        let years_pfcf = common_years(&price_avg_year, &fcf_year, lookback);

        let pe_samples = multiple_samples(&price_avg_year, &eps_year, &years_pe);
        let pfcf_samples = multiple_samples(&price_avg_year, &fcf_year, &years_pfcf);

        let med_pe = median_multiple(&pe_samples);
        let med_pfcf = median_multiple(&pfcf_samples);

        let norm_eps = positive_median(&eps_year, &years_pe);
        let norm_fcfps = positive_median(&fcf_year, &years_pfcf);

        let fair_pe = fair_value(med_pe, norm_eps);
        let fair_pfcf = fair_value(med_pfcf, norm_fcfps);
        let intrinsic_value = blend(fair_pe, fair_pfcf, self.config.pe_weight);

        MultiplesValuation {
            method: format!(
                "Historical multiples (P/E & P/FCF, median of up to {} years)",
                lookback
            ),
            intrinsic_value,
            fair_pe,
            fair_pfcf,
            med_pe,
            med_pfcf,
            norm_eps,
            norm_fcfps,
            undervalued_pct: undervalued_pct(intrinsic_value, price),
            pe_samples,
            pfcf_samples,
        }
    }
}

impl Default for OnePagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Year series
// ============================================================================

/// Average of non-zero monthly adjusted closes per year.
pub fn price_avg_by_year(monthly: &MonthlyAdjustedSeries) -> YearSeries {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for (date, close) in monthly {
        let Some(year) = fiscal_year(date) else {
            continue;
        };
        let bucket = buckets.entry(year).or_default();
        if let Some(px) = close.filter(|v| v.is_finite() && *v != 0.0) {
            bucket.push(px);
        }
    }

    buckets
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(year, values)| {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            (year, avg)
        })
        .filter(|(_, avg)| avg.is_finite())
        .collect()
}

/// First positive share count among diluted, basic and common shares.
fn report_shares(report: &IncomeReport) -> Option<f64> {
    [
        report.diluted_shares,
        report.basic_shares,
        report.common_shares_outstanding,
    ]
    .into_iter()
    .flatten()
    .find(|s| s.is_finite() && *s > 0.0)
}

/// EPS per fiscal year: net income over shares. Years without non-zero net
/// income or a positive share count are skipped; the first report wins on
/// duplicate years.
pub fn eps_by_year(income: &[IncomeReport]) -> YearSeries {
    let mut out = YearSeries::new();

    for report in income {
        let Some(year) = fiscal_year(&report.fiscal_date_ending) else {
            continue;
        };
        let Some(net_income) = report.net_income.filter(|n| *n != 0.0) else {
            continue;
        };
        let Some(shares) = report_shares(report) else {
            continue;
        };
        let eps = net_income / shares;
        if eps.is_finite() {
            out.entry(year).or_insert(eps);
        }
    }

    out
}

/// Share count for per-share FCF: overview, else the latest income report's
/// diluted shares, else its basic shares.
pub fn resolve_shares(overview: &CompanyOverview, income: &[IncomeReport]) -> Option<f64> {
    let latest = income.first();
    [
        overview.shares_outstanding,
        latest.and_then(|r| r.diluted_shares),
        latest.and_then(|r| r.basic_shares),
    ]
    .into_iter()
    .flatten()
    .find(|s| s.is_finite() && *s > 0.0)
}

/// FCF per share per fiscal year. Empty without a positive share count.
pub fn fcf_per_share_by_year(cash_flow: &[CashFlowReport], shares: Option<f64>) -> YearSeries {
    let mut out = YearSeries::new();
    let Some(shares) = shares.filter(|s| s.is_finite() && *s > 0.0) else {
        return out;
    };

    for report in cash_flow {
        let Some(year) = fiscal_year(&report.fiscal_date_ending) else {
            continue;
        };
        let ocf = report.operating_cashflow.unwrap_or(0.0);
        let capex = report.capital_expenditures.unwrap_or(0.0).abs();
        let per_share = (ocf - capex) / shares;
        if per_share.is_finite() {
            out.entry(year).or_insert(per_share);
        }
    }

    out
}

/// Most recent `lookback` years present in both series, ascending.
pub fn common_years(prices: &YearSeries, fundamentals: &YearSeries, lookback: usize) -> Vec<String> {
    let years = years_ascending(&intersect_years(prices, fundamentals));
    last_n(&years, lookback)
}

/// Price / per-share samples for `years`.
pub fn multiple_samples(
    prices: &YearSeries,
    per_share: &YearSeries,
    years: &[String],
) -> Vec<MultipleSample> {
    years
        .iter()
        .filter_map(|year| {
            let price = *prices.get(year)?;
            let fundamental = *per_share.get(year)?;
            let multiple = if fundamental > 0.0 {
                Metric::from_finite(price / fundamental)
            } else {
                Metric::Unavailable
            };
            Some(MultipleSample {
                year: year.clone(),
                price,
                per_share: fundamental,
                multiple,
            })
        })
        .collect()
}

// ============================================================================
// Aggregation
// ============================================================================

fn median_multiple(samples: &[MultipleSample]) -> Metric {
    let values: Vec<f64> = samples.iter().filter_map(|s| s.multiple.value()).collect();
    if values.is_empty() {
        Metric::Unavailable
    } else {
        Metric::from_finite(median(&values))
    }
}

fn positive_median(series: &YearSeries, years: &[String]) -> Metric {
    let values: Vec<f64> = years
        .iter()
        .filter_map(|y| series.get(y).copied())
        .filter(|v| *v > 0.0)
        .collect();
    if values.is_empty() {
        Metric::Unavailable
    } else {
        Metric::from_finite(median(&values))
    }
}

fn fair_value(multiple: Metric, per_share: Metric) -> Metric {
    match (multiple, per_share) {
        (Metric::Value(m), Metric::Value(p)) if m != 0.0 && p != 0.0 => {
            Metric::from_finite(m * p)
        }
        _ => Metric::Unavailable,
    }
}

/// Weighted blend; falls back to whichever side is available.
pub fn blend(fair_pe: Metric, fair_pfcf: Metric, pe_weight: f64) -> Metric {
    match (fair_pe, fair_pfcf) {
        (Metric::Value(pe), Metric::Value(pfcf)) => {
            Metric::from_finite(pe_weight * pe + (1.0 - pe_weight) * pfcf)
        }
        (Metric::Value(v), Metric::Unavailable) | (Metric::Unavailable, Metric::Value(v)) => {
            Metric::Value(v)
        }
        (Metric::Unavailable, Metric::Unavailable) => Metric::Unavailable,
    }
}

/// Unavailable, not 0, when either side is missing or non-positive.
fn undervalued_pct(intrinsic: Metric, price: Metric) -> Metric {
    match (intrinsic, price) {
        (Metric::Value(i), Metric::Value(p)) if i > 0.0 && p > 0.0 => {
            Metric::from_finite((i - p) / p * 100.0)
        }
        _ => Metric::Unavailable,
    }
}

// ============================================================================
// Tests
// ============================================================================
