//! Response cache for upstream payloads.
//!
//! Keys are `"{SYMBOL}:{FUNCTION}[:{extra}]"`; values are the decoded JSON
//! bodies. The cache is injected into the adapter, so tests and callers can
//! pick `TtlCache`, `NoopCache` or their own implementation.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Default TTL: 15 minutes
pub const DEFAULT_TTL_SECS: i64 = 15 * 60;

/// Cache of upstream response bodies.
pub trait ResponseCache: Send + Sync {
    /// Get a cached value if present and fresh.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value.
    fn set(&self, key: &str, value: Value);

    /// Drop every entry for `symbol`.
    fn invalidate(&self, _symbol: &str) {}

    /// Current statistics.
    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Shared cache handle.
pub type SharedCache = Arc<dyn ResponseCache>;

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// A TTL too large to represent never expires.
    fn is_expired(&self, ttl_secs: i64) -> bool {
        Duration::try_seconds(ttl_secs)
            .and_then(|ttl| self.cached_at.checked_add_signed(ttl))
            .is_some_and(|expires_at| Utc::now() > expires_at)
    }
}

/// In-memory TTL cache.
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl_secs: i64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtlCache {
    /// Create with the default 15-minute TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL_SECS)
    }

    /// Create with custom TTL
    pub fn with_ttl(ttl_secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_secs,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Drop expired entries; runs on every insert.
    fn prune(entries: &mut HashMap<String, CacheEntry>, ttl_secs: i64) {
        entries.retain(|_, entry| !entry.is_expired(ttl_secs));
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache for TtlCache {
    fn get(&self, key: &str) -> Option<Value> {
        let found = self.entries.read().ok().and_then(|entries| {
            entries
                .get(key)
                .filter(|entry| !entry.is_expired(self.ttl_secs))
                .map(|entry| entry.data.clone())
        });

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn set(&self, key: &str, value: Value) {
        let entry = CacheEntry {
            data: value,
            cached_at: Utc::now(),
        };
        if let Ok(mut entries) = self.entries.write() {
            Self::prune(&mut entries, self.ttl_secs);
            entries.insert(key.to_string(), entry);
        }
    }

    fn invalidate(&self, symbol: &str) {
        let prefix = format!("{}:", symbol.to_uppercase());
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|k, _| !k.starts_with(&prefix));
        }
    }

    fn stats(&self) -> CacheStats {
        let (total, expired) = self
            .entries
            .read()
            .map(|entries| {
                let total = entries.len();
                let expired = entries
                    .values()
                    .filter(|e| e.is_expired(self.ttl_secs))
                    .count();
                (total, expired)
            })
            .unwrap_or((0, 0));

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl ResponseCache for NoopCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set(&self, _key: &str, _value: Value) {}
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_set_get() {
        let cache = TtlCache::new();
        cache.set("IBM:OVERVIEW", json!({"Symbol": "IBM"}));

        let cached = cache.get("IBM:OVERVIEW");
        assert_eq!(cached, Some(json!({"Symbol": "IBM"})));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_cache_miss() {
        let cache = TtlCache::new();
        assert!(cache.get("IBM:OVERVIEW").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = TtlCache::with_ttl(-1);
        cache.set("IBM:CASH_FLOW", json!({}));
        assert!(cache.get("IBM:CASH_FLOW").is_none());

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 1);

        cache.set("IBM:OVERVIEW", json!({}));
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[test]
    fn test_set_evicts_expired_entries() {
        let cache = TtlCache::with_ttl(-1);
        for i in 0..1000 {
            let key = format!("SYM{i}:OVERVIEW");
            cache.set(&key, json!({"i": i}));
            assert!(cache.get(&key).is_none());
        }

        // Only the entry stored last survives; earlier ones were pruned on insert
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.misses, 1000);
    }

    #[test]
    fn test_fresh_entries_survive_pruning() {
        let cache = TtlCache::new();
        cache.set("IBM:OVERVIEW", json!(1));
        cache.set("MSFT:OVERVIEW", json!(2));
        assert_eq!(cache.stats().total_entries, 2);
        assert!(cache.get("IBM:OVERVIEW").is_some());
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let cache = TtlCache::with_ttl(10_000_000_000_000);
        cache.set("IBM:OVERVIEW", json!(1));
        assert_eq!(cache.get("IBM:OVERVIEW"), Some(json!(1)));
        assert_eq!(cache.stats().expired_entries, 0);

        let cache = TtlCache::with_ttl(i64::MAX);
        cache.set("IBM:OVERVIEW", json!(1));
        assert_eq!(cache.get("IBM:OVERVIEW"), Some(json!(1)));
    }

    #[test]
    fn test_cache_invalidate_symbol() {
        let cache = TtlCache::new();
        cache.set("IBM:OVERVIEW", json!(1));
        cache.set("IBM:NEWS_SENTIMENT:10", json!(2));
        cache.set("IBMX:OVERVIEW", json!(3));

        cache.invalidate("ibm");

        assert!(cache.get("IBM:OVERVIEW").is_none());
        assert!(cache.get("IBM:NEWS_SENTIMENT:10").is_none());
        assert!(cache.get("IBMX:OVERVIEW").is_some());
    }

    #[test]
    fn test_noop_cache() {
        let cache = NoopCache;
        cache.set("IBM:OVERVIEW", json!(1));
        assert!(cache.get("IBM:OVERVIEW").is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
