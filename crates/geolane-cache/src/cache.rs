//! LRU response cache with time-to-live.
//!
//! Default: 10,000 entries, 24-hour TTL.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use geolane_core::config::{DEFAULT_CACHE_MAX_AGE_SECS, DEFAULT_CACHE_MAX_ENTRIES};
use geolane_core::{Fingerprint, Response};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// Cached response with its insertion time and recency stamp.
struct CacheEntry {
    response: Response,
    inserted_at: Instant,
    last_used: u64,
}

/// Counters since construction (or the last [`ResponseCache::clear`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// Thread-safe LRU cache of remote responses keyed by [`Fingerprint`].
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<Fingerprint, CacheEntry>,
    /// Recency stamp → key, oldest first.
    recency: BTreeMap<u64, Fingerprint>,
    clock: u64,
    max_entries: usize,
    max_age: Duration,
    stats: CacheStats,
}

impl CacheInner {
    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn remove(&mut self, key: &Fingerprint) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.last_used);
        Some(entry)
    }

    fn evict_lru(&mut self) {
        if let Some((_, oldest)) = self.recency.pop_first() {
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
            debug!("Evicted least-recently-used entry {}", oldest);
        }
    }
}

impl ResponseCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_entries.min(1024)),
                recency: BTreeMap::new(),
                clock: 0,
                max_entries,
                max_age,
                stats: CacheStats::default(),
            }),
        }
    }

    /// Create a cache with default settings (10,000 entries, 24h TTL).
    pub fn default_cache() -> Self {
        Self::new(
            DEFAULT_CACHE_MAX_ENTRIES,
            Duration::from_secs(DEFAULT_CACHE_MAX_AGE_SECS),
        )
    }

    /// Get a cached response. Returns None on miss or expired entry.
    pub fn get(&self, key: &Fingerprint) -> Option<Response> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &Fingerprint, now: Instant) -> Option<Response> {
        let mut inner = self.inner.lock();
        let ttl = inner.max_age;

        let expired = inner
            .entries
            .get(key)
            .map(|e| now.saturating_duration_since(e.inserted_at) >= ttl);

        match expired {
            Some(false) => {
                let stamp = inner.next_stamp();
                let entry = inner.entries.get_mut(key)?;
                let previous = std::mem::replace(&mut entry.last_used, stamp);
                let response = entry.response.clone();
                inner.recency.remove(&previous);
                inner.recency.insert(stamp, key.clone());
                inner.stats.hits += 1;
                Some(response)
            }
            Some(true) => {
                inner.remove(key);
                inner.stats.expirations += 1;
                inner.stats.misses += 1;
                debug!("Cache entry {} expired", key);
                None
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite a response. Evicts the least-recently-used entry
    /// when a new key would exceed capacity.
    pub fn set(&self, key: Fingerprint, response: Response) {
        let mut inner = self.inner.lock();
        if inner.max_entries == 0 {
            return;
        }

        if inner.remove(&key).is_none() {
            while inner.entries.len() >= inner.max_entries && !inner.recency.is_empty() {
                inner.evict_lru();
            }
        }

        let stamp = inner.next_stamp();
        inner.recency.insert(stamp, key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
                last_used: stamp,
            },
        );
    }

    /// Whether a live entry exists. Does not refresh recency or count as a
    /// hit; expired entries report false.
    pub fn contains(&self, key: &Fingerprint) -> bool {
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)
            .is_some_and(|e| e.inserted_at.elapsed() < inner.max_age)
    }

    /// Number of entries in the cache, including any not yet lazily expired.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.inner.lock().max_entries
    }

    pub fn max_age(&self) -> Duration {
        self.inner.lock().max_age
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Clear all entries and reset counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
        inner.stats = CacheStats::default();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::default_cache()
    }
}
