//! Response cache for avoiding redundant provider calls

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use newsdigest_core::InferenceRequest;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::clock::{Clock, SystemClock};

/// Default lifetime of a cached response.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Content-addressed key: `task:sha256(text)[:sha256(parameters)]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(request: &InferenceRequest) -> Self {
        let text_digest = hex::encode(Sha256::digest(request.inputs().as_bytes()));
        let mut key = format!("{}:{}", request.task(), text_digest);
        if !request.parameters().is_empty() {
            let canonical = request.parameters().canonical_json();
            key.push(':');
            key.push_str(&hex::encode(Sha256::digest(canonical.as_bytes())));
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cached payload and the instant it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub inserted_at: Instant,
}

impl CacheEntry {
    /// Expired once strictly older than `ttl`.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

/// Shared, time-bounded memo of provider responses.
///
/// Expiry is lazy: a stale entry is dropped by the `get` that finds it.
/// Hits never extend an entry's lifetime.
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "inference cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        // The read guard is released above; removing under it would deadlock the shard.
        if expired
            && self
                .entries
                .remove_if(key, |_, entry| entry.is_expired(now, self.ttl))
                .is_some()
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "inference cache entry expired");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value`, replacing any previous entry for `key`.
    pub fn put(&self, key: CacheKey, value: Value) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.insert(key, entry);
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let purged = before.saturating_sub(self.entries.len());
        self.evictions.fetch_add(purged as u64, Ordering::Relaxed);
        purged
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use newsdigest_core::{Parameters, Task};
    use serde_json::json;

    fn summary_request(text: &str) -> InferenceRequest {
        InferenceRequest::new(Task::Summarization, text)
            .with_parameters(Parameters::new().with("max_length", 120).with("min_length", 30))
    }

    #[test]
    fn test_identical_requests_share_a_key() {
        let a = CacheKey::for_request(&summary_request("same text"));
        let b = CacheKey::for_request(&summary_request("same text"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_field_change_changes_the_key() {
        let base = CacheKey::for_request(&summary_request("same text"));

        let other_text = CacheKey::for_request(&summary_request("same text."));
        let other_task = CacheKey::for_request(
            &InferenceRequest::new(Task::Sentiment, "same text")
                .with_parameters(Parameters::new().with("max_length", 120).with("min_length", 30)),
        );
        let other_params = CacheKey::for_request(
            &InferenceRequest::new(Task::Summarization, "same text")
                .with_parameters(Parameters::new().with("max_length", 100).with("min_length", 30)),
        );
        let no_params = CacheKey::for_request(&InferenceRequest::new(Task::Summarization, "same text"));

        for other in [other_text, other_task, other_params, no_params] {
            assert_ne!(base, other);
        }
    }

    #[test]
    fn test_parameter_order_does_not_matter() {
        let a = InferenceRequest::new(Task::ZeroShot, "x")
            .with_parameters(Parameters::new().with("a", 1).with("b", 2));
        let b = InferenceRequest::new(Task::ZeroShot, "x")
            .with_parameters(Parameters::new().with("b", 2).with("a", 1));
        assert_eq!(CacheKey::for_request(&a), CacheKey::for_request(&b));
    }

    #[test]
    fn test_entry_lives_exactly_ttl() {
        let clock = Arc::new(ManualClock::new());
        let ttl = Duration::from_secs(60);
        let cache = ResponseCache::with_clock(ttl, clock.clone());
        let key = CacheKey::for_request(&summary_request("text"));

        cache.put(key.clone(), json!({"summary_text": "s"}));

        clock.advance(ttl - Duration::from_millis(1));
        assert!(cache.get(&key).is_some());

        clock.advance(Duration::from_millis(1));
        assert!(cache.get(&key).is_some(), "an entry exactly TTL old is still live");

        clock.advance(Duration::from_millis(1));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty(), "expired entry is removed on read");
    }

    #[test]
    fn test_hits_do_not_extend_lifetime() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::with_clock(Duration::from_secs(10), clock.clone());
        let key = CacheKey::for_request(&summary_request("text"));
        cache.put(key.clone(), json!("v"));

        for _ in 0..5 {
            clock.advance(Duration::from_secs(2));
            assert!(cache.get(&key).is_some());
        }
        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_stats_track_hits_misses_and_evictions() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::with_clock(Duration::from_secs(5), clock.clone());
        let key = CacheKey::for_request(&summary_request("text"));

        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), json!(1));
        assert_eq!(cache.get(&key), Some(json!(1)));
        clock.advance(Duration::from_secs(6));
        assert!(cache.get(&key).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_purge_expired() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::with_clock(Duration::from_secs(5), clock.clone());
        cache.put(CacheKey::for_request(&summary_request("old")), json!(1));
        clock.advance(Duration::from_secs(6));
        cache.put(CacheKey::for_request(&summary_request("new")), json!(2));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
