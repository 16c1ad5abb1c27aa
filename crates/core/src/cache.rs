//! In-memory response cache with per-entry TTL.
//!
//! Keys are built with [`ResponseCache::generate_key`] so that the same
//! operation and logical parameters always map to the same entry. Expired
//! entries are dropped lazily on read and proactively by the sweeper task.
//!
//! When the cache holds `max_size` entries, inserting a new key first purges
//! expired entries and then evicts the entry inserted longest ago.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When false every operation is a pass-through
    pub enabled: bool,
    /// Default time-to-live
    pub ttl: Duration,
    pub max_size: usize,
    /// Interval of the proactive expiry sweep
    pub check_period: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(300),
            max_size: 1000,
            check_period: Duration::from_secs(60),
        }
    }
}

/// Named TTL classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtlStrategy {
    /// 5 minutes, for data that changes often (subscriber lists)
    Short,
    /// 15 minutes
    Medium,
    /// 30 minutes
    Long,
    /// 24 hours, for data that practically never changes
    Static,
}

impl TtlStrategy {
    pub fn ttl(self) -> Duration {
        match self {
            Self::Short => Duration::from_secs(300),
            Self::Medium => Duration::from_secs(900),
            Self::Long => Duration::from_secs(1800),
            Self::Static => Duration::from_secs(86_400),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub key_count: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage of reads served from cache, rounded to two decimals
    pub hit_rate: f64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: DateTime<Utc>,
    inserted: u64,
}

/// TTL cache for remote API responses
#[derive(Debug)]
pub struct ResponseCache {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    insert_seq: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insert_seq: AtomicU64::new(0),
            clock,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expiry(&self, ttl: Duration) -> DateTime<Utc> {
        // TTLs past the representable range never expire
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Build a deterministic key: parameters sorted by name, each rendered as
    /// `name:<json>`, joined with `|` and prefixed by `prefix:`.
    ///
    /// Non-object or empty parameters yield the bare prefix.
    pub fn generate_key(prefix: &str, params: &Value) -> String {
        let object = match params.as_object() {
            Some(object) if !object.is_empty() => object,
            _ => return prefix.to_string(),
        };

        let mut names: Vec<&String> = object.keys().collect();
        names.sort();

        let parts: Vec<String> = names
            .into_iter()
            .map(|name| format!("{}:{}", name, object[name.as_str()]))
            .collect();

        format!("{}:{}", prefix, parts.join("|"))
    }

    /// Get an unexpired value, counting a hit or a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }

        let now = self.clock.now();
        let mut entries = self.lock_entries();

        let found = match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Cache miss");
        }
        found
    }

    /// Store a value for `ttl` (or the configured default).
    ///
    /// Returns false when caching is disabled or `max_size` is zero.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        if !self.config.enabled || self.config.max_size == 0 {
            return false;
        }

        let expires_at = self.expiry(ttl.unwrap_or(self.config.ttl));
        let inserted = self.insert_seq.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now();
        let mut entries = self.lock_entries();

        if !entries.contains_key(key) && entries.len() >= self.config.max_size {
            entries.retain(|_, entry| now < entry.expires_at);

            if entries.len() >= self.config.max_size {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!(evicted = %oldest, "Cache full, evicting oldest entry");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at,
                inserted,
            },
        );
        true
    }

    /// Store a value using a named TTL class.
    pub fn set_with_strategy(&self, key: &str, value: Value, strategy: TtlStrategy) -> bool {
        self.set(key, value, Some(strategy.ttl()))
    }

    /// Remove a key, returning how many entries were deleted.
    pub fn delete(&self, key: &str) -> usize {
        usize::from(self.lock_entries().remove(key).is_some())
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&self) {
        self.lock_entries().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Check for an unexpired entry without touching the counters.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.lock_entries()
            .get(key)
            .map(|entry| now < entry.expires_at)
            .unwrap_or(false)
    }

    /// Unexpired keys in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut keys: Vec<String> = self
            .lock_entries()
            .iter()
            .filter(|(_, entry)| now < entry.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };

        CacheStats {
            key_count: self.lock_entries().len(),
            hits,
            misses,
            hit_rate,
        }
    }

    /// Expiry timestamp of an unexpired entry.
    pub fn ttl_of(&self, key: &str) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        self.lock_entries()
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.expires_at)
    }

    /// Give an existing entry a new TTL counted from now.
    pub fn update_ttl(&self, key: &str, ttl: Duration) -> bool {
        if !self.config.enabled {
            return false;
        }

        let now = self.clock.now();
        let expires_at = self.expiry(ttl);
        match self.lock_entries().get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.expires_at = expires_at;
                true
            }
            _ => false,
        }
    }

    /// Delete every key containing `pattern`, returning the number removed.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        let removed = before - entries.len();

        if removed > 0 {
            debug!(pattern, removed, "Invalidated cache entries");
        }
        removed
    }

    /// Return the cached value for `key`, or run `supplier` once and cache
    /// its successful result. Errors are returned as-is and never cached.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        supplier: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = supplier().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Start the proactive expiry sweep.
    ///
    /// The task holds a weak reference and exits once the cache is dropped.
    /// Returns `None` when caching is disabled or the check period is zero.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled || self.config.check_period.is_zero() {
            return None;
        }

        let cache: Weak<Self> = Arc::downgrade(self);
        let period = self.config.check_period;

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!(purged, "Swept expired cache entries");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClock;
    use serde_json::json;

    fn cache_with(config: CacheConfig) -> (Arc<ResponseCache>, MockClock) {
        let clock = MockClock::default();
        (
            Arc::new(ResponseCache::with_clock(config, Arc::new(clock.clone()))),
            clock,
        )
    }

    fn cache() -> (Arc<ResponseCache>, MockClock) {
        cache_with(CacheConfig::default())
    }

    #[test]
    fn test_generate_key_is_order_independent() {
        let a = ResponseCache::generate_key("p", &json!({"a": 1, "b": 2}));

        let mut reversed = serde_json::Map::new();
        reversed.insert("b".to_string(), json!(2));
        reversed.insert("a".to_string(), json!(1));
        let b = ResponseCache::generate_key("p", &Value::Object(reversed));

        assert_eq!(a, b);
        assert_eq!(a, "p:a:1|b:2");
    }

    #[test]
    fn test_generate_key_without_params() {
        assert_eq!(ResponseCache::generate_key("list_tags", &json!({})), "list_tags");
        assert_eq!(ResponseCache::generate_key("list_tags", &Value::Null), "list_tags");
    }

    #[test]
    fn test_generate_key_serializes_values_as_json() {
        let key = ResponseCache::generate_key(
            "list_subscribers",
            &json!({"status": "active", "per_page": 100, "range": {"start": "2024-01-01"}}),
        );
        assert_eq!(
            key,
            r#"list_subscribers:per_page:100|range:{"start":"2024-01-01"}|status:"active""#
        );
    }

    #[test]
    fn test_round_trip_and_expiry() {
        let (cache, clock) = cache();

        assert!(cache.set("k", json!({"v": 1}), Some(Duration::from_secs(10))));
        assert_eq!(cache.get("k"), Some(json!({"v": 1})));

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.has("k"));
        // Lazy expiry removed the entry
        assert_eq!(cache.stats().key_count, 0);
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let (cache, clock) = cache_with(CacheConfig {
            ttl: Duration::from_secs(1_000_000_000_000_000),
            ..Default::default()
        });

        assert!(cache.set("k", json!(1), None));
        assert!(cache.set("max", json!(2), Some(Duration::MAX)));
        assert!(cache.update_ttl("k", Duration::from_secs(u64::MAX / 4)));
        assert_eq!(cache.ttl_of("max"), Some(DateTime::<Utc>::MAX_UTC));

        clock.advance(Duration::from_secs(365 * 86_400));
        assert_eq!(cache.get("k"), Some(json!(1)));
        assert_eq!(cache.get("max"), Some(json!(2)));
    }

    #[test]
    fn test_hit_rate() {
        let (cache, _clock) = cache();
        assert_eq!(cache.stats().hit_rate, 0.0);

        assert_eq!(cache.get("k"), None);
        cache.set("k", json!(1), None);
        assert_eq!(cache.get("k"), Some(json!(1)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 50.0);
    }

    #[test]
    fn test_hit_rate_rounds_to_two_decimals() {
        let (cache, _clock) = cache();
        cache.set("k", json!(1), None);

        cache.get("k");
        cache.get("missing");
        cache.get("missing");

        assert_eq!(cache.stats().hit_rate, 33.33);
    }

    #[test]
    fn test_invalidate_pattern() {
        let (cache, _clock) = cache();
        cache.set("user:1", json!(1), None);
        cache.set("user:2", json!(2), None);
        cache.set("order:3", json!(3), None);

        assert_eq!(cache.invalidate_pattern("user"), 2);
        assert_eq!(cache.keys(), vec!["order:3".to_string()]);
    }

    #[test]
    fn test_delete_and_clear() {
        let (cache, _clock) = cache();
        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);
        cache.get("a");

        assert_eq!(cache.delete("a"), 1);
        assert_eq!(cache.delete("a"), 0);

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.key_count, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_strategies() {
        let (cache, clock) = cache();
        let start = clock.now();

        cache.set_with_strategy("s", json!(1), TtlStrategy::Short);
        cache.set_with_strategy("m", json!(1), TtlStrategy::Medium);
        cache.set_with_strategy("l", json!(1), TtlStrategy::Long);
        cache.set_with_strategy("x", json!(1), TtlStrategy::Static);

        assert_eq!(cache.ttl_of("s"), Some(start + chrono::Duration::seconds(300)));
        assert_eq!(cache.ttl_of("m"), Some(start + chrono::Duration::seconds(900)));
        assert_eq!(cache.ttl_of("l"), Some(start + chrono::Duration::seconds(1800)));
        assert_eq!(cache.ttl_of("x"), Some(start + chrono::Duration::seconds(86_400)));
    }

    #[test]
    fn test_update_ttl() {
        let (cache, clock) = cache();
        cache.set("k", json!(1), Some(Duration::from_secs(5)));

        clock.advance(Duration::from_secs(4));
        assert!(cache.update_ttl("k", Duration::from_secs(60)));
        clock.advance(Duration::from_secs(30));
        assert!(cache.has("k"));

        assert!(!cache.update_ttl("missing", Duration::from_secs(60)));
        assert_eq!(cache.ttl_of("missing"), None);
    }

    #[test]
    fn test_disabled_cache_is_pass_through() {
        let (cache, _clock) = cache_with(CacheConfig {
            enabled: false,
            ..Default::default()
        });

        assert!(!cache.set("k", json!(1), None));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.update_ttl("k", Duration::from_secs(1)));
        assert_eq!(cache.stats().misses, 0);
        assert!(cache.spawn_sweeper().is_none());
    }

    #[test]
    fn test_evicts_oldest_insertion_when_full() {
        let (cache, _clock) = cache_with(CacheConfig {
            max_size: 2,
            ..Default::default()
        });

        cache.set("first", json!(1), None);
        cache.set("second", json!(2), None);
        cache.set("third", json!(3), None);

        assert_eq!(cache.keys(), vec!["second".to_string(), "third".to_string()]);

        // Overwriting an existing key never evicts
        cache.set("second", json!(22), None);
        assert_eq!(cache.keys().len(), 2);
    }

    #[test]
    fn test_full_cache_prefers_expired_entries() {
        let (cache, clock) = cache_with(CacheConfig {
            max_size: 2,
            ..Default::default()
        });

        cache.set("old", json!(1), None);
        cache.set("short", json!(2), Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));
        cache.set("new", json!(3), None);

        assert_eq!(cache.keys(), vec!["new".to_string(), "old".to_string()]);
    }

    #[test]
    fn test_zero_max_size_rejects_inserts() {
        let (cache, _clock) = cache_with(CacheConfig {
            max_size: 0,
            ..Default::default()
        });
        assert!(!cache.set("k", json!(1), None));
    }

    #[tokio::test]
    async fn test_get_or_compute_calls_supplier_once() {
        let (cache, _clock) = cache();
        let calls = AtomicU64::new(0);

        for _ in 0..3 {
            let value: Result<Value, ()> = cache
                .get_or_compute("k", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("computed"))
                })
                .await;
            assert_eq!(value, Ok(json!("computed")));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_compute_does_not_cache_errors() {
        let (cache, _clock) = cache();

        let failed: Result<Value, &str> = cache
            .get_or_compute("k", None, || async { Err("boom") })
            .await;
        assert_eq!(failed, Err("boom"));
        assert!(!cache.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_expired_entries() {
        let (cache, clock) = cache_with(CacheConfig {
            check_period: Duration::from_secs(1),
            ..Default::default()
        });
        cache.set("k", json!(1), Some(Duration::from_secs(5)));
        let sweeper = cache.spawn_sweeper().unwrap();

        clock.advance(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.stats().key_count, 0);
        sweeper.abort();
    }
}
