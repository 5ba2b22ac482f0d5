//! URL → extracted-repository-path cache with LRU eviction and TTL expiry. Concurrent access is
//! serialized behind a single internal mutex.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    path: PathBuf,
    created_at: Instant,
    last_accessed: Instant,
    access_count: u64,
}

/// Hit/miss counters exposed by `stats()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = self.hits as f64 / total as f64;
            rate
        }
    }
}

struct Inner {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
    max_size: usize,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

/// URL-to-local-path cache: bounded by `max_size`, evicts least-recently-used on insert
/// when full, entries expire `ttl` after creation.
pub struct Cache {
    inner: Mutex<Inner>,
}

impl Cache {
    #[must_use]
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: Vec::new(),
                max_size,
                ttl,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up `url`. Returns `None` on miss or on an expired entry (which is evicted as a side
    /// effect of the lookup).
    #[must_use]
    pub fn get(&self, url: &str) -> Option<PathBuf> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let ttl = inner.ttl;

        let expired = inner
            .entries
            .get(url)
            .is_some_and(|e| e.created_at.elapsed() > ttl);

        if expired {
            inner.entries.remove(url);
            inner.order.retain(|k| k != url);
            inner.misses += 1;
            return None;
        }

        if let Some(entry) = inner.entries.get_mut(url) {
            entry.last_accessed = Instant::now();
            entry.access_count += 1;
            let path = entry.path.clone();
            inner.order.retain(|k| k != url);
            inner.order.push(url.to_string());
            inner.hits += 1;
            return Some(path);
        }

        inner.misses += 1;
        None
    }

    /// Insert or replace an entry, evicting the least-recently-used entry first if the cache is at
    /// capacity.
    pub fn insert(&self, url: String, path: PathBuf) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if inner.entries.contains_key(&url) {
            inner.order.retain(|k| k != &url);
        } else if inner.entries.len() >= inner.max_size {
            if let Some(lru) = inner.order.first().cloned() {
                inner.entries.remove(&lru);
                inner.order.remove(0);
            }
        }

        let now = Instant::now();
        inner.entries.insert(
            url.clone(),
            Entry {
                path,
                created_at: now,
                last_accessed: now,
                access_count: 0,
            },
        );
        inner.order.push(url);
    }

    /// Remove every entry. Does not touch on-disk trees; callers own that.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.clear();
        inner.order.clear();
    }

    /// True if some entry currently points at `path` (used by `Cleanup` to decide whether a
    /// directory is cache-owned before removing it).
    #[must_use]
    pub fn contains_path(&self, path: &std::path::Path) -> bool {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.values().any(|e| e.path == path)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        CacheStats {
            size: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_then_miss_after_clear() {
        let cache = Cache::new(2, Duration::from_secs(60));
        cache.insert("https://a".to_string(), PathBuf::from("/tmp/a"));
        assert_eq!(cache.get("https://a"), Some(PathBuf::from("/tmp/a")));
        cache.clear();
        assert_eq!(cache.get("https://a"), None);
    }

    #[test]
    fn evicts_least_recently_used_on_overflow() {
        let cache = Cache::new(2, Duration::from_secs(60));
        cache.insert("a".to_string(), PathBuf::from("/tmp/a"));
        cache.insert("b".to_string(), PathBuf::from("/tmp/b"));
        // touch "a" so "b" becomes LRU
        let _ = cache.get("a");
        cache.insert("c".to_string(), PathBuf::from("/tmp/c"));

        assert_eq!(cache.get("b"), None);
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.stats().size <= 2);
    }

    #[test]
    fn expired_entry_is_evicted_on_access() {
        let cache = Cache::new(10, Duration::from_millis(1));
        cache.insert("a".to_string(), PathBuf::from("/tmp/a"));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache = Cache::new(10, Duration::from_secs(60));
        cache.insert("a".to_string(), PathBuf::from("/tmp/a"));
        let _ = cache.get("a");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
