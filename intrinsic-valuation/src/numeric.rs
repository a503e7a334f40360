//! Numeric helpers shared by the valuation pipelines.
//!
//! Provider payloads are loosely typed: numbers arrive as strings, `"None"`,
//! `"-"` or are missing entirely. Everything here tolerates that without
//! failing and never produces NaN or infinity.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Metric
// ============================================================================

/// A numeric output that may be unavailable.
///
/// `Value` is always finite. Serializes as a JSON number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Metric {
    #[default]
    Unavailable,
    Value(f64),
}

impl Metric {
    /// Wrap a number; non-finite input becomes `Unavailable`.
    pub fn from_finite(v: f64) -> Self {
        if v.is_finite() {
            Self::Value(v)
        } else {
            Self::Unavailable
        }
    }

    /// Wrap a number only when it is finite and strictly positive.
    pub fn positive(v: f64) -> Self {
        match Self::from_finite(v) {
            Self::Value(x) if x > 0.0 => Self::Value(x),
            _ => Self::Unavailable,
        }
    }

    /// Treat an exact zero as unavailable (providers send 0 for "unknown").
    pub fn non_zero(self) -> Self {
        match self {
            Self::Value(v) if v == 0.0 => Self::Unavailable,
            other => other,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Apply `f` to the inner value, re-checking finiteness.
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Value(v) => Self::from_finite(f(v)),
            Self::Unavailable => Self::Unavailable,
        }
    }
}

impl From<Option<f64>> for Metric {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Unavailable, Self::from_finite)
    }
}

impl From<Metric> for Option<f64> {
    fn from(m: Metric) -> Self {
        m.value()
    }
}

// ============================================================================
// Coercion
// ============================================================================

/// Coerce an arbitrary JSON value to a finite number, or `None`.
///
/// Numeric strings (with optional surrounding whitespace or a trailing `%`)
/// and booleans are accepted. `"None"`, `"-"`, empty strings, null, arrays and
/// objects are not.
pub fn parse_finite(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_str(s)?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_str(s: &str) -> Option<f64> {
    let trimmed = s.trim().trim_end_matches('%').trim_end();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Coerce an arbitrary JSON value to a number, returning 0 when it is not finite.
pub fn to_finite_number(value: &Value) -> f64 {
    parse_finite(value).unwrap_or(0.0)
}

/// Serde adapter for provider fields that may hold strings, numbers or junk.
///
/// Use with `#[serde(default, deserialize_with = "lenient_f64")]`.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_finite(&value))
}

// ============================================================================
// Statistics & year handling
// ============================================================================

/// Median of the finite values; 0 for no finite values.
pub fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    finite.sort_by(f64::total_cmp);

    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}

/// Sort year strings by numeric value, ascending. Non-numeric years sort first.
pub fn years_ascending<S: AsRef<str>>(years: &[S]) -> Vec<String> {
    let mut out: Vec<String> = years.iter().map(|y| y.as_ref().to_string()).collect();
    out.sort_by_key(|y| y.parse::<i64>().unwrap_or(i64::MIN));
    out
}

/// The final `n` elements of `items`, or all of them when shorter.
pub fn last_n<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

/// Years present in both series, in `b`'s iteration order.
pub fn intersect_years(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> Vec<String> {
    b.keys().filter(|y| a.contains_key(*y)).cloned().collect()
}

/// Saturating clamp. Unlike `f64::clamp` this never panics on `lo > hi`.
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Four-digit year prefix of a date string such as `"2023-09-30"`.
pub fn fiscal_year(date: &str) -> Option<String> {
    let year = date.get(..4)?;
    year.chars().all(|c| c.is_ascii_digit()).then(|| year.to_string())
}
