//! TTL Cache Module
//!
//! Main cache engine: a HashMap of [`CacheEntry`] values with lazy expiry on
//! access, an explicit sweep, and prefix/regex bulk invalidation.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{CacheEntry, CacheStats, KeyPattern};

// == TTL Cache ==
/// Thread-safe key/value cache with per-entry expiry.
///
/// Entries are live while `elapsed < ttl`. A dead entry is never returned,
/// whether or not [`TtlCache::purge_expired`] has swept it yet. No capacity
/// bound is enforced.
///
/// The map is guarded by a mutex so one cache can be shared by concurrent
/// tasks; no operation performs I/O while holding the lock.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    /// TTL applied by [`TtlCache::set`]
    default_ttl: Duration,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
    /// Bumped by every invalidation or clear
    generation: u64,
    /// Generation at which each key was last invalidated on its own
    invalidated_at: HashMap<String, u64>,
    /// Generation of the last pattern invalidation or clear
    bulk_invalidated_at: u64,
}

impl<V> Inner<V> {
    fn invalidated_since(&self, key: &str, generation: u64) -> bool {
        self.bulk_invalidated_at > generation
            || self
                .invalidated_at
                .get(key)
                .map_or(false, |&at| at > generation)
    }

    fn bump_bulk(&mut self) {
        self.generation += 1;
        self.bulk_invalidated_at = self.generation;
        self.invalidated_at.clear();
    }
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL for entries stored without an explicit one
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::new(),
                generation: 0,
                invalidated_at: HashMap::new(),
                bulk_invalidated_at: 0,
            }),
            default_ttl,
        }
    }

    /// Returns the TTL used by [`TtlCache::set`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Get ==
    /// Returns the value for `key` if present and live.
    ///
    /// An expired entry is removed as a side effect and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                inner.entries.remove(key);
                inner.stats.record_expirations(1);
                inner.stats.record_miss();
                None
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Returns true if `key` holds a live entry. Same liveness rules as `get`.
    pub fn has(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            Some(entry) if !entry.is_expired() => true,
            Some(_) => {
                inner.entries.remove(key);
                inner.stats.record_expirations(1);
                false
            }
            None => false,
        }
    }

    // == Set ==
    /// Stores `value` under `key` with the default TTL, replacing any entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Stores `value` under `key` with an explicit TTL, replacing any entry.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut inner = self.inner.lock();
        inner.entries.insert(key.into(), CacheEntry::new(value, ttl));
    }

    /// Stores `value` only if `key` was not invalidated since `generation` was read.
    ///
    /// A fetch that started before a write invalidated the key would otherwise
    /// put the pre-write value back. Invalidations of other keys do not count;
    /// pattern invalidations and clears count for every key. Returns true if
    /// the value was stored.
    pub fn set_if_generation(&self, key: impl Into<String>, value: V, generation: u64) -> bool {
        let key = key.into();
        let mut inner = self.inner.lock();
        if inner.invalidated_since(&key, generation) {
            return false;
        }
        inner
            .entries
            .insert(key, CacheEntry::new(value, self.default_ttl));
        true
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    // == Invalidate ==
    /// Removes `key` if present.
    ///
    /// The key is marked even when absent, since a fetch for it may be in flight.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        let generation = inner.generation;
        inner.invalidated_at.insert(key.to_string(), generation);
        if inner.entries.remove(key).is_some() {
            inner.stats.record_invalidations(1);
        }
    }

    /// Removes every key selected by `pattern` and returns how many were removed.
    ///
    /// A plain string is an anchored prefix match.
    pub fn invalidate_pattern(&self, pattern: impl Into<KeyPattern>) -> usize {
        let pattern = pattern.into();
        let mut inner = self.inner.lock();
        inner.bump_bulk();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !pattern.matches(key));
        let removed = before - inner.entries.len();
        inner.stats.record_invalidations(removed);
        removed
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.bump_bulk();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.stats.record_invalidations(removed);
    }

    // == Purge Expired ==
    /// Removes all entries whose TTL has elapsed.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - inner.entries.len();
        inner.stats.record_expirations(removed);
        removed
    }

    // == Introspection ==
    /// Number of stored entries, including dead ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Stored keys, including dead ones not yet swept. Order is unspecified.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().entries.keys().cloned().collect()
    }

    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.total_entries = inner.entries.len();
        stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::sync::Arc;
    use std::thread::sleep;

    fn cache() -> TtlCache<String> {
        TtlCache::new(Duration::from_secs(300))
    }

    #[test]
    fn test_cache_new() {
        let cache = cache();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_set_and_get() {
        let cache = cache();

        cache.set("key1", "value1".to_string());

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert!(cache.has("key1"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let cache = cache();
        assert_eq!(cache.get("nonexistent"), None);
        assert!(!cache.has("nonexistent"));
    }

    #[test]
    fn test_overwrite() {
        let cache = cache();

        cache.set("key1", "value1".to_string());
        cache.set("key1", "value2".to_string());

        assert_eq!(cache.get("key1"), Some("value2".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_removed_on_get() {
        let cache = cache();

        cache.set_with_ttl("short", "value".to_string(), Duration::from_millis(30));
        assert!(cache.get("short").is_some());

        sleep(Duration::from_millis(60));

        // Still physically stored until accessed
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_entry_removed_on_has() {
        let cache = cache();

        cache.set_with_ttl("short", "value".to_string(), Duration::ZERO);

        assert!(!cache.has("short"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache = cache();

        cache.set("key1", "value1".to_string());
        cache.invalidate("key1");
        cache.invalidate("missing");

        assert!(cache.get("key1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = cache();

        cache.set("list:/app:root", "a".to_string());
        cache.set("list:/app/db:root", "b".to_string());
        cache.set("secret:/app:root", "c".to_string());

        let removed = cache.invalidate_pattern("list:/app");

        assert_eq!(removed, 2);
        assert_eq!(cache.get("secret:/app:root"), Some("c".to_string()));
        assert!(cache.get("list:/app:root").is_none());
    }

    #[test]
    fn test_invalidate_regex() {
        let cache = cache();

        cache.set("secret:/a:team-a", "a".to_string());
        cache.set("secret:/b:team-a", "b".to_string());
        cache.set("secret:/a:root", "c".to_string());

        let removed = cache.invalidate_pattern(Regex::new(":team-a$").unwrap());

        assert_eq!(removed, 2);
        assert_eq!(cache.keys(), vec!["secret:/a:root".to_string()]);
    }

    #[test]
    fn test_clear() {
        let cache = cache();

        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn test_purge_expired() {
        let cache = cache();

        cache.set_with_ttl("key1", "value1".to_string(), Duration::from_millis(20));
        cache.set_with_ttl("key2", "value2".to_string(), Duration::from_secs(10));

        sleep(Duration::from_millis(50));

        let removed = cache.purge_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("key2").is_some());
    }

    #[test]
    fn test_stats() {
        let cache = cache();

        cache.set("key1", "value1".to_string());
        cache.get("key1");
        cache.get("nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_set_if_generation_rejects_stale_write() {
        let cache = cache();

        let generation = cache.generation();
        cache.invalidate("secret:/app:root");

        assert!(!cache.set_if_generation("secret:/app:root", "old".to_string(), generation));
        assert!(cache.get("secret:/app:root").is_none());

        let generation = cache.generation();
        assert!(cache.set_if_generation("secret:/app:root", "new".to_string(), generation));
        assert_eq!(cache.get("secret:/app:root"), Some("new".to_string()));
    }

    #[test]
    fn test_set_if_generation_ignores_other_keys() {
        let cache = cache();

        let generation = cache.generation();
        cache.invalidate("secret:/other:root");

        assert!(cache.set_if_generation("secret:/app:root", "fresh".to_string(), generation));
        assert!(!cache.set_if_generation("secret:/other:root", "old".to_string(), generation));
        assert_eq!(cache.get("secret:/app:root"), Some("fresh".to_string()));
    }

    #[test]
    fn test_set_if_generation_after_clear_or_pattern() {
        let cache = cache();

        let generation = cache.generation();
        cache.clear();
        assert!(!cache.set_if_generation("list:/app:root", "old".to_string(), generation));

        let generation = cache.generation();
        cache.invalidate_pattern("list:/zzz");
        assert!(!cache.set_if_generation("list:/app:root", "old".to_string(), generation));

        let generation = cache.generation();
        assert!(cache.set_if_generation("list:/app:root", "new".to_string(), generation));
        assert!(cache.has("list:/app:root"));
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(cache());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        cache.set(format!("key-{}-{}", i, j), "v".to_string());
                        cache.get(&format!("key-{}-{}", i, j));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 400);
        assert_eq!(cache.stats().hits, 400);
    }
}
