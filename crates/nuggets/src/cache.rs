use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::StoreError;
use crate::model::NuggetRecord;

/// The cache key a nugget lookup reads and writes: configured prefix plus
/// normalized key, concatenated.
#[must_use]
pub fn cache_key(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

/// The external cache seam.
///
/// Lookups treat the cache as best-effort, so the interface is infallible: a
/// backend that cannot answer reports a miss and swallows writes. What a zero
/// timeout means is up to the backend; [`MemoryCache`] stores the entry
/// without an expiry.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<NuggetRecord>;
    fn set(&self, key: &str, record: NuggetRecord, timeout: Duration);
    fn delete(&self, key: &str);
}

/// Cache-aside lookup: return the cached record under `key`, or run `fetch`
/// and cache what it returns for `timeout`.
///
/// Fetch failures are returned without touching the cache, so a missing
/// record is re-fetched on the next lookup rather than negatively cached.
/// The read and the write are two separate cache calls; concurrent first
/// lookups may both miss and both fetch, last write wins.
pub fn fetch_or_cache<F>(
    cache: &dyn CacheStore,
    key: &str,
    timeout: Duration,
    fetch: F,
) -> Result<NuggetRecord, StoreError>
where
    F: FnOnce() -> Result<NuggetRecord, StoreError>,
{
    if let Some(record) = cache.get(key) {
        return Ok(record);
    }
    let record = fetch()?;
    cache.set(key, record.clone(), timeout);
    Ok(record)
}

/// Counters accumulated by [`MemoryCache`], readable through
/// [`MemoryCache::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

struct MemoryEntry {
    record: NuggetRecord,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn new(record: NuggetRecord, timeout: Duration) -> Self {
        let expires_at = if timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(timeout)
        };
        Self { record, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Default)]
struct MemoryCacheInner {
    entries: FxHashMap<String, MemoryEntry>,
    stats: CacheStats,
}

/// In-process [`CacheStore`] with per-entry expiry.
///
/// Expired entries are dropped lazily, when a lookup touches them. An
/// expired entry counts as both `expired` and a miss in [`CacheStats`].
#[derive(Default)]
pub struct MemoryCache {
    inner: Mutex<MemoryCacheInner>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters since construction.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, MemoryCacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<NuggetRecord> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired = inner.entries.get(key).is_some_and(MemoryEntry::is_expired);
        if expired {
            inner.entries.remove(key);
            inner.stats.expired += 1;
            inner.stats.misses += 1;
            debug!(key, "cache entry expired");
            return None;
        }

        match inner.entries.get(key) {
            Some(entry) => {
                inner.stats.hits += 1;
                debug!(key, "cache hit");
                Some(entry.record.clone())
            }
            None => {
                inner.stats.misses += 1;
                debug!(key, "cache miss");
                None
            }
        }
    }

    fn set(&self, key: &str, record: NuggetRecord, timeout: Duration) {
        debug!(key, timeout_secs = timeout.as_secs(), "cache set");
        self.lock()
            .entries
            .insert(key.to_string(), MemoryEntry::new(record, timeout));
    }

    fn delete(&self, key: &str) {
        if self.lock().entries.remove(key).is_some() {
            debug!(key, "cache entry deleted");
        }
    }
}
