//! TTL cache for tool results
//!
//! Keys come from [`finsense_domain::cache_key`]. Entries expire at an
//! absolute instant and are dropped lazily when read after expiry.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Hit/miss counters and current size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Process-wide tool result cache, safe for concurrent use.
pub struct ToolCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl ToolCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            clock,
        }
    }

    /// Cached value for `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let value = entries
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.value.clone());
        if value.is_none() {
            entries.remove(key);
        }

        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Store `value` until `now + ttl`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.lock().unwrap_or_else(|e| e.into_inner()).len(),
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for ToolCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manual_cache() -> (Arc<ManualClock>, ToolCache) {
        let clock = Arc::new(ManualClock::new());
        let cache = ToolCache::with_clock(clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_hit_before_expiry() {
        let (clock, cache) = manual_cache();
        cache.set("k", json!({"price": 1}), Duration::from_secs(1));

        clock.advance(Duration::from_millis(900));
        assert_eq!(cache.get("k"), Some(json!({"price": 1})));
    }

    #[test]
    fn test_miss_after_expiry() {
        let (clock, cache) = manual_cache();
        cache.set("k", json!(1), Duration::from_secs(1));

        clock.advance(Duration::from_millis(1100));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_expiry_instant_is_exclusive() {
        let (clock, cache) = manual_cache();
        cache.set("k", json!(1), Duration::from_secs(60));

        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_set_overwrites_and_extends() {
        let (clock, cache) = manual_cache();
        cache.set("k", json!(1), Duration::from_secs(1));
        clock.advance(Duration::from_millis(800));
        cache.set("k", json!(2), Duration::from_secs(1));
        clock.advance(Duration::from_millis(800));

        assert_eq!(cache.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_stats_and_clear() {
        let (_clock, cache) = manual_cache();
        cache.set("a", json!(1), Duration::from_secs(10));
        cache.get("a");
        cache.get("a");
        cache.get("b");

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { hits: 2, misses: 1, size: 1 });
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
