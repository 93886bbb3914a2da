//! Caching layer for schedule searches.
//!
//! Each search costs a session warm-up plus one or two page loads against
//! the booking site, so identical searches within the TTL are answered
//! from memory. Capacity is enforced by moka; expiry is judged against an
//! injectable [`Clock`] so tests can move time without sleeping.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::future::Cache as MokaCache;

use crate::kai::{ScheduleRecord, SearchKey};

/// Cached search results.
pub type CachedRecords = Arc<Vec<ScheduleRecord>>;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(900),
            max_capacity: 128,
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    inserted_at: Instant,
    records: CachedRecords,
}

/// Search results keyed by (origin, destination, date).
pub struct ResultCache {
    entries: MokaCache<SearchKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    /// Create a cache using the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache that reads time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        // moka's own TTL runs on wall time and only reclaims memory;
        // freshness is decided in `get` against the injected clock.
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            entries,
            ttl: config.ttl,
            clock,
        }
    }

    /// Get the records for a key, if present and younger than the TTL.
    pub async fn get(&self, key: &SearchKey) -> Option<CachedRecords> {
        let entry = self.entries.get(key).await?;

        let age = self.clock.now().saturating_duration_since(entry.inserted_at);
        if age >= self.ttl {
            self.entries.invalidate(key).await;
            return None;
        }

        Some(entry.records)
    }

    /// Insert records for a key, replacing any previous entry.
    pub async fn put(&self, key: SearchKey, records: CachedRecords) {
        let entry = CacheEntry {
            inserted_at: self.clock.now(),
            records,
        };
        self.entries.insert(key, entry).await;
    }

    /// Approximate number of resident entries. Call
    /// [`ResultCache::run_pending_tasks`] first for an exact figure.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Apply pending evictions.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }
}
