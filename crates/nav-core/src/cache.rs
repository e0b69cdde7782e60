//! Bounded query caches with lazy TTL expiry and score-based eviction.
//!
//! Each entry tracks its creation time, last access and access count. The
//! eviction score mixes frequency and recency:
//! `score = (access_count + 1) / (1 + seconds_since_last_access)`.
//! When an insert pushes the cache over its bound, expired entries are
//! dropped first, then the lowest-scoring entry (oldest on ties).

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheSlot<V> {
    value: V,
    created_at: Instant,
    last_access: Instant,
    access_count: u64,
}

impl<V> CacheSlot<V> {
    fn score(&self, now: Instant) -> f64 {
        let idle = now.duration_since(self.last_access).as_secs_f64();
        (self.access_count as f64 + 1.0) / (1.0 + idle)
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.created_at) > ttl
    }
}

/// Counters snapshot for a query cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// Thread-safe cache keyed by `K`, bounded to `max_entries`.
pub struct QueryCache<K, V> {
    entries: Mutex<HashMap<K, CacheSlot<V>>>,
    max_entries: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<K, V> QueryCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a key, expiring it if older than the TTL.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get_mut(key) {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Some(slot) if !slot.is_expired(now, self.ttl) => {
                slot.access_count += 1;
                slot.last_access = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(slot.value.clone());
            }
            Some(_) => {}
        }
        entries.remove(key);
        self.expirations.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or replace a value, evicting one entry if over the bound.
    pub fn put(&self, key: K, value: V) {
        if self.max_entries == 0 {
            return;
        }
        let now = Instant::now();
        let mut entries = self.lock();
        entries.insert(
            key.clone(),
            CacheSlot {
                value,
                created_at: now,
                last_access: now,
                access_count: 0,
            },
        );
        if entries.len() <= self.max_entries {
            return;
        }

        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|k, slot| k == &key || !slot.is_expired(now, ttl));
        let expired = before - entries.len();
        if expired > 0 {
            self.expirations.fetch_add(expired as u64, Ordering::Relaxed);
        }

        while entries.len() > self.max_entries {
            let victim = entries
                .iter()
                .filter(|(k, _)| *k != &key)
                .min_by(|(_, a), (_, b)| {
                    a.score(now)
                        .total_cmp(&b.score(now))
                        .then_with(|| a.created_at.cmp(&b.created_at))
                })
                .map(|(k, _)| k.clone());
            let Some(victim) = victim else {
                break;
            };
            entries.remove(&victim);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|slot| slot.value)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, CacheSlot<V>>> {
        // cached values are always recomputable, so a poisoned map is still usable
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn get_returns_put_value() {
        let cache: QueryCache<String, Vec<String>> = QueryCache::new(4, Duration::from_secs(60));
        cache.put("connecting:A:B".into(), vec!["J1".into(), "V2".into()]);
        assert_eq!(
            cache.get(&"connecting:A:B".to_string()),
            Some(vec!["J1".to_string(), "V2".to_string()])
        );
        assert_eq!(cache.get(&"missing".to_string()), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn entries_expire_lazily() {
        let cache: QueryCache<u32, u32> = QueryCache::new(4, Duration::from_millis(20));
        cache.put(1, 10);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn size_never_exceeds_bound() {
        let cache: QueryCache<u32, u32> = QueryCache::new(3, Duration::from_secs(60));
        for i in 0..20 {
            cache.put(i, i);
            assert!(cache.size() <= 3);
        }
        assert_eq!(cache.stats().evictions, 17);
        // the most recent insert always survives
        assert_eq!(cache.get(&19), Some(19));
    }

    #[test]
    fn frequently_read_entries_survive_eviction() {
        let cache: QueryCache<&'static str, u32> = QueryCache::new(2, Duration::from_secs(60));
        cache.put("hot", 1);
        cache.put("cold", 2);
        for _ in 0..5 {
            assert_eq!(cache.get(&"hot"), Some(1));
        }
        cache.put("new", 3);
        assert_eq!(cache.get(&"hot"), Some(1));
        assert_eq!(cache.get(&"cold"), None);
        assert_eq!(cache.get(&"new"), Some(3));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache: QueryCache<u32, u32> = QueryCache::new(0, Duration::from_secs(60));
        cache.put(1, 1);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn clear_empties_cache() {
        let cache: QueryCache<u32, u32> = QueryCache::new(8, Duration::from_secs(60));
        cache.put(1, 1);
        cache.put(2, 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_access_respects_bound() {
        let cache: QueryCache<u32, u32> = QueryCache::new(16, Duration::from_secs(60));
        thread::scope(|scope| {
            for worker in 0..4u32 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..200u32 {
                        let key = worker * 1000 + i;
                        cache.put(key, i);
                        if let Some(value) = cache.get(&key) {
                            assert_eq!(value, i);
                        }
                    }
                });
            }
        });
        assert!(cache.size() <= 16);
    }
}
