// src/core/cache.rs

//! The in-memory response cache for rendered metadata documents.

use super::metrics;
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of rendered documents kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Identifies a rendered response.
///
/// `base_url` is `None` when the cache is keyed by path alone, in which case
/// the first request for a path decides which host its tarball URLs point at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub base_url: Option<String>,
}

impl CacheKey {
    pub fn path_only(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(path: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base_url: Some(base_url.into()),
        }
    }
}

/// A point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

/// A bounded LRU map from request key to rendered response bytes.
///
/// All operations take a short-lived lock around the underlying `LruCache`;
/// the lock is never held while doing I/O or JSON work, so requests for
/// different keys only contend for the duration of a hash lookup.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<LruCache<CacheKey, Bytes>>,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl ResponseCache {
    /// Creates an empty cache holding at most `capacity` responses.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Looks up a rendered response, marking it most recently used on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let found = self.entries.lock().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::CACHE_HITS_TOTAL.inc();
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            metrics::CACHE_MISSES_TOTAL.inc();
        }
        found
    }

    /// Looks up a response without touching recency or counters.
    pub fn peek(&self, key: &CacheKey) -> Option<Bytes> {
        self.entries.lock().peek(key).cloned()
    }

    /// Stores a rendered response. An existing entry for `key` is replaced and
    /// refreshed; otherwise, if the cache is full, the least recently used
    /// entry is evicted first.
    pub fn put(&self, key: CacheKey, value: Bytes) {
        let (evicted, len) = {
            let mut entries = self.entries.lock();
            let evicted = match entries.push(key, value) {
                // `push` hands back the old value when the key was already present.
                Some((old_key, _)) => !entries.contains(&old_key),
                None => false,
            };
            (evicted, entries.len())
        };

        self.inserts.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            metrics::CACHE_EVICTIONS_TOTAL.inc();
        }
        metrics::CACHE_ENTRIES.set(len as f64);
    }

    /// Drops every cached response. Counters are kept.
    pub fn clear(&self) {
        self.entries.lock().clear();
        metrics::CACHE_ENTRIES.set(0.0);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
