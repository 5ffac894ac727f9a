//! Cache storage.
//!
//! One map from key to entry, plus a reverse index from tag to keys so that
//! tag purges never scan the whole store. Both structures live behind a
//! single lock: a purge that has returned can never race a reader into
//! serving the purged value.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, gauge};
use serde_json::Value;

use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Counters reported by `GET /api/revalidate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub purged: u64,
}

struct Entry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
    tags: Vec<String>,
}

impl Entry {
    /// Valid at exactly `stored_at + ttl`, expired strictly after.
    fn is_expired(&self, now: Instant) -> bool {
        now > self.stored_at + self.ttl
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    tag_index: HashMap<String, HashSet<CacheKey>>,
}

impl Inner {
    fn insert(&mut self, key: CacheKey, entry: Entry) {
        // An overwrite may carry a different tag set; drop the old index
        // membership before recording the new one.
        if let Some(previous) = self.entries.remove(&key) {
            self.unindex(&key, &previous.tags);
        }
        for tag in &entry.tags {
            self.tag_index.entry(tag.clone()).or_default().insert(key);
        }
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.unindex(key, &entry.tags);
        Some(entry)
    }

    fn unindex(&mut self, key: &CacheKey, tags: &[String]) {
        for tag in tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
    }
}

/// In-process store with per-entry TTL and tag-based bulk invalidation.
///
/// Entries are immutable once written (overwritten, never mutated in
/// place). Expiry is lazy: an expired entry is treated as absent and
/// evicted when a lookup observes it; `sweep` exists for memory hygiene
/// only.
pub struct CacheStore {
    inner: RwLock<Inner>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    purged: AtomicU64,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            purged: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Lookup / population
    // ========================================================================

    /// Returns the stored value, or `None` for missing and expired entries
    /// alike. A lookup on an absent key is a normal miss, never an error.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &CacheKey, now: Instant) -> Option<Value> {
        {
            let inner = rw_read(&self.inner, SOURCE, "get");
            match inner.entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    counter!("portico_cache_hit_total").increment(1);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    counter!("portico_cache_miss_total").increment(1);
                    return None;
                }
            }
        }

        // Expired under the read lock; evict under the write lock. Re-check
        // first: a concurrent set may have repopulated the key.
        let mut inner = rw_write(&self.inner, SOURCE, "get.evict_expired");
        if let Some(entry) = inner.entries.get(key) {
            if !entry.is_expired(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                counter!("portico_cache_hit_total").increment(1);
                return Some(entry.value.clone());
            }
            inner.remove(key);
            self.expired.fetch_add(1, Ordering::Relaxed);
            counter!("portico_cache_expired_total").increment(1);
            gauge!("portico_cache_entries").set(inner.entries.len() as f64);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("portico_cache_miss_total").increment(1);
        None
    }

    /// Inserts or overwrites unconditionally.
    pub fn set(&self, key: CacheKey, value: Value, ttl: Duration, tags: &[&str]) {
        self.set_at(key, value, ttl, tags, Instant::now());
    }

    fn set_at(&self, key: CacheKey, value: Value, ttl: Duration, tags: &[&str], now: Instant) {
        let entry = Entry {
            value,
            stored_at: now,
            ttl,
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
        };
        let mut inner = rw_write(&self.inner, SOURCE, "set");
        inner.insert(key, entry);
        gauge!("portico_cache_entries").set(inner.entries.len() as f64);
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Removes every entry whose tag set contains `tag`; returns how many.
    ///
    /// Holds the sole write lock for the whole removal, so once this
    /// returns no subsequent `get` can observe a purged value.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut inner = rw_write(&self.inner, SOURCE, "invalidate_tag");
        let keys: Vec<CacheKey> = match inner.tag_index.get(tag) {
            Some(keys) => keys.iter().copied().collect(),
            None => return 0,
        };
        for key in &keys {
            inner.remove(key);
        }
        let removed = keys.len();
        self.purged.fetch_add(removed as u64, Ordering::Relaxed);
        counter!("portico_cache_purge_total").increment(removed as u64);
        gauge!("portico_cache_entries").set(inner.entries.len() as f64);
        removed
    }

    /// Drops every entry; returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut inner = rw_write(&self.inner, SOURCE, "clear");
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.tag_index.clear();
        self.purged.fetch_add(removed as u64, Ordering::Relaxed);
        counter!("portico_cache_purge_total").increment(removed as u64);
        gauge!("portico_cache_entries").set(0.0);
        removed
    }

    /// Evicts expired entries eagerly. Correctness never depends on this;
    /// it bounds memory between lookups of cold keys.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut inner = rw_write(&self.inner, SOURCE, "sweep");
        let dead: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| *key)
            .collect();
        for key in &dead {
            inner.remove(key);
        }
        let removed = dead.len();
        if removed > 0 {
            self.expired.fetch_add(removed as u64, Ordering::Relaxed);
            counter!("portico_cache_expired_total").increment(removed as u64);
            gauge!("portico_cache_entries").set(inner.entries.len() as f64);
        }
        removed
    }

    // ========================================================================
    // Observability
    // ========================================================================

    pub fn len(&self) -> usize {
        rw_read(&self.inner, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Side-effect-free snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }
}
