//! In-memory query cache with time-based expiry
//!
//! Provides a `QueryCache` that keeps the last successful result of each content
//! query for a fixed time-to-live. Stale entries are never returned; they are
//! dropped the next time they are looked up or overwritten by a fresh write.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::CacheKey;

/// Default time-to-live for cached query results (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Source of the current time for expiry checks
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Useful for testing expiry without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at the given instant
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward
    pub fn advance(&self, by: Duration) {
        if let Ok(delta) = chrono::Duration::from_std(by) {
            let mut now = self.now.lock();
            *now = *now + delta;
        }
    }

    /// Jumps the clock to an exact instant (may move backwards)
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// A stored query result
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached payload
    value: Value,
    /// When the payload was stored
    cached_at: DateTime<Utc>,
}

/// Result of a fresh cache lookup, including when the data was stored
#[derive(Debug, Clone, PartialEq)]
pub struct CachedData {
    /// The cached payload
    pub data: Value,
    /// When the payload was originally stored
    pub cached_at: DateTime<Utc>,
}

/// Caches content query results in memory for a fixed TTL
///
/// The cache is an explicit value rather than a global: construct one per
/// dispatcher (or share it behind an `Arc`). Lookups and writes take a short
/// lock, so concurrent writers to the same key resolve as last-write-wins.
pub struct QueryCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl QueryCache {
    /// Creates an empty cache using the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by a custom clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// The configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks up a fresh value for `key`
    ///
    /// Returns `None` if nothing is stored or the stored entry is at least
    /// `ttl` old. Expired entries are evicted on the way out.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.get_entry(key).map(|cached| cached.data)
    }

    /// Like [`get`](Self::get) but also reports when the value was stored
    pub fn get_entry(&self, key: &CacheKey) -> Option<CachedData> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let entry = entries.get(key)?;
        if self.is_fresh(entry, now) {
            return Some(CachedData {
                data: entry.value.clone(),
                cached_at: entry.cached_at,
            });
        }

        entries.remove(key);
        None
    }

    /// Stores `value` under `key`, replacing anything already there
    pub fn set(&self, key: CacheKey, value: Value) {
        let entry = CacheEntry {
            value,
            cached_at: self.clock.now(),
        };
        self.entries.lock().insert(key, entry);
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        // A clock that went backwards yields a negative age; treat it as brand new.
        let age = (now - entry.cached_at).to_std().unwrap_or(Duration::ZERO);
        age < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Collection;
    use chrono::TimeZone;
    use serde_json::json;

    fn create_test_cache(ttl: Duration) -> (QueryCache, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = QueryCache::with_clock(ttl, clock.clone());
        (cache, clock)
    }

    fn project_key(slug: &str) -> CacheKey {
        CacheKey::document(Collection::Project, slug)
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _clock) = create_test_cache(DEFAULT_TTL);

        assert!(cache.get(&project_key("nothing")).is_none());
    }

    #[test]
    fn test_get_returns_value_immediately_after_set() {
        let (cache, _clock) = create_test_cache(DEFAULT_TTL);
        let value = json!({ "title": "X" });

        cache.set(project_key("p-1"), value.clone());

        assert_eq!(cache.get(&project_key("p-1")), Some(value));
    }

    #[test]
    fn test_get_returns_value_just_before_ttl() {
        let (cache, clock) = create_test_cache(Duration::from_secs(300));
        cache.set(project_key("p-1"), json!(1));

        clock.advance(Duration::from_secs(299));

        assert_eq!(cache.get(&project_key("p-1")), Some(json!(1)));
    }

    #[test]
    fn test_get_returns_none_once_ttl_has_elapsed() {
        let (cache, clock) = create_test_cache(Duration::from_secs(300));
        cache.set(project_key("p-1"), json!(1));

        clock.advance(Duration::from_secs(300));

        assert!(cache.get(&project_key("p-1")).is_none());
    }

    #[test]
    fn test_expired_entry_is_evicted_on_lookup() {
        let (cache, clock) = create_test_cache(Duration::from_secs(60));
        cache.set(project_key("a"), json!("a"));
        cache.set(project_key("b"), json!("b"));
        assert_eq!(cache.len(), 2);

        clock.advance(Duration::from_secs(61));
        assert!(cache.get(&project_key("a")).is_none());

        // Only the looked-up entry is dropped; the other waits for its own lookup.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_overwrites_and_restarts_ttl() {
        let (cache, clock) = create_test_cache(Duration::from_secs(60));
        cache.set(project_key("p"), json!("first"));

        clock.advance(Duration::from_secs(50));
        cache.set(project_key("p"), json!("second"));
        clock.advance(Duration::from_secs(50));

        assert_eq!(cache.get(&project_key("p")), Some(json!("second")));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (cache, _clock) = create_test_cache(DEFAULT_TTL);
        cache.set(CacheKey::All(Collection::Project), json!([]));
        cache.set(CacheKey::Recent, json!([]));

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get(&CacheKey::All(Collection::Project)).is_none());
        assert!(cache.get(&CacheKey::Recent).is_none());
    }

    #[test]
    fn test_get_entry_reports_cached_at() {
        let (cache, clock) = create_test_cache(DEFAULT_TTL);
        let stored_at = clock.now();
        cache.set(CacheKey::Recent, json!([1, 2]));
        clock.advance(Duration::from_secs(10));

        let cached = cache.get_entry(&CacheKey::Recent).expect("entry should be fresh");

        assert_eq!(cached.cached_at, stored_at);
        assert_eq!(cached.data, json!([1, 2]));
    }

    #[test]
    fn test_clock_moving_backwards_keeps_entry_fresh() {
        let (cache, clock) = create_test_cache(Duration::from_secs(60));
        let start = clock.now();
        cache.set(CacheKey::Recent, json!(true));

        clock.set(start - chrono::Duration::hours(1));

        assert_eq!(cache.get(&CacheKey::Recent), Some(json!(true)));
    }

    #[test]
    fn test_default_ttl_is_five_minutes() {
        let cache = QueryCache::default();
        assert_eq!(cache.ttl(), Duration::from_secs(300));
    }
}
