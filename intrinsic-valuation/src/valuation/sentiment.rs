//! News sentiment aggregation.

use super::types::{NewsItem, Sentiment, SentimentLabel};
use crate::data::NewsArticle;

/// Average score above which sentiment is positive
const POSITIVE_THRESHOLD: f64 = 0.05;

/// Average score below which sentiment is negative
const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Average every finite per-ticker score for `ticker` (case-insensitive).
pub fn aggregate_sentiment(news: &[NewsArticle], ticker: &str) -> Sentiment {
    let scores: Vec<f64> = news
        .iter()
        .flat_map(|article| article.ticker_sentiment.iter())
        .filter(|t| t.ticker.eq_ignore_ascii_case(ticker))
        .filter_map(|t| t.score)
        .filter(|s| s.is_finite())
        .collect();

    if scores.is_empty() {
        return Sentiment::no_data();
    }

    let score = scores.iter().sum::<f64>() / scores.len() as f64;
    let label = if score > POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if score < NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Mixed
    };

    Sentiment {
        label,
        score,
        n: scores.len(),
    }
}

pub fn normalize_news(news: &[NewsArticle]) -> Vec<NewsItem> {
    news.iter()
        .map(|a| NewsItem {
            title: a.title.clone(),
            url: a.url.clone(),
            source: a.source.clone(),
            published_at: a.time_published.clone(),
            summary: a.summary.clone().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TickerSentiment;

    fn article(scores: &[(&str, Option<f64>)]) -> NewsArticle {
        NewsArticle {
            title: "t".into(),
            ticker_sentiment: scores
                .iter()
                .map(|(ticker, score)| TickerSentiment {
                    ticker: ticker.to_string(),
                    score: *score,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_feed_is_no_data() {
        let s = aggregate_sentiment(&[], "IBM");
        assert_eq!(s, Sentiment::no_data());
        assert_eq!(serde_json::to_value(&s).unwrap()["label"], "no-data");
    }

    #[test]
    fn test_positive_case_insensitive() {
        let news = vec![
            article(&[("ibm", Some(0.2)), ("MSFT", Some(-0.9))]),
            article(&[("IBM", Some(0.1)), ("IBM", None)]),
        ];
        let s = aggregate_sentiment(&news, "IBM");
        assert_eq!(s.label, SentimentLabel::Positive);
        assert_eq!(s.n, 2);
        assert!((s.score - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_thresholds() {
        let neg = aggregate_sentiment(&[article(&[("X", Some(-0.3))])], "X");
        assert_eq!(neg.label, SentimentLabel::Negative);

        let mixed = aggregate_sentiment(&[article(&[("X", Some(0.05))])], "X");
        assert_eq!(mixed.label, SentimentLabel::Mixed);

        let mixed = aggregate_sentiment(&[article(&[("X", Some(-0.05))])], "X");
        assert_eq!(mixed.label, SentimentLabel::Mixed);
    }

    #[test]
    fn test_unmatched_ticker_is_no_data() {
        let s = aggregate_sentiment(&[article(&[("MSFT", Some(0.5))])], "IBM");
        assert_eq!(s.label, SentimentLabel::NoData);
        assert_eq!(s.n, 0);
    }

    #[test]
    fn test_normalize_news() {
        let mut a = article(&[]);
        a.url = "https://example.com".into();
        a.time_published = Some("20240510T120000".into());
        let items = normalize_news(&[a, article(&[])]);
        assert_eq!(items[0].published_at.as_deref(), Some("20240510T120000"));
        assert_eq!(items[1].summary, "");
        assert!(items[1].published_at.is_none());
    }
}
