//! Valuation Module.
//!
//! Turns a fetched [`FundamentalsBundle`](crate::data::FundamentalsBundle)
//! into a one-pager report.
//!
//! # Pipelines
//!
//! 1. **Historical multiples**: median P/E and P/FCF over recent years applied
//!    to normalized EPS and FCF per share, blended into one intrinsic value.
//! 2. **DCF**: five-year FCF projection at the historical CAGR, discounted at
//!    a CAPM-based WACC, plus a perpetuity-growth terminal value.
//! 3. **Sentiment**: average per-ticker news sentiment.
//!
//! All computation is synchronous and pure. Values that cannot be computed are
//! [`Metric::Unavailable`](crate::numeric::Metric) and serialize as `null`.
//!
//! # Usage
//!
//! ```ignore
//! use intrinsic_valuation::valuation::{DcfEngine, OnePagerBuilder};
//!
//! let bundle = aggregator.fetch_bundle("IBM").await?;
//! let report = OnePagerBuilder::new().build("IBM", &bundle);
//! let dcf = DcfEngine::new().compute_from_bundle(&bundle, report.price.value());
//! let report = OnePagerBuilder::with_dcf(report, dcf);
//! ```

pub mod dcf;
pub mod multiples;
pub mod sentiment;
pub mod types;

pub use dcf::{DcfConfig, DcfEngine};
pub use multiples::{MultiplesConfig, OnePagerBuilder};
pub use sentiment::{aggregate_sentiment, normalize_news};
pub use types::{
    DcfResult, MultipleSample, MultiplesValuation, NewsItem, OnePagerReport, OverviewSummary,
    Sentiment, SentimentLabel,
};
