//! Client-side rate limiting over local storage.

use crate::store::Storage;

/// Sliding-window attempt limiter.
///
/// Attempt timestamps (milliseconds) are kept per key as a JSON array under
/// `ratelimit_<key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    pub max_attempts: usize,
    pub window_ms: i64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_ms: 60_000,
        }
    }
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_ms: i64) -> Self {
        Self {
            max_attempts,
            window_ms,
        }
    }

    /// Record an attempt for `key` at `now_ms` if the limit allows it.
    ///
    /// Returns false, recording nothing, when the window is already full.
    pub fn check(&self, store: &mut impl Storage, key: &str, now_ms: i64) -> bool {
        let storage_key = storage_key(key);

        let mut attempts: Vec<i64> = match store.get(&storage_key) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding malformed rate limit entry {}: {}", storage_key, e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        // Stored timestamps are user-editable; drop any whose age overflows.
        attempts.retain(|t| {
            now_ms
                .checked_sub(*t)
                .is_some_and(|age| age < self.window_ms)
        });

        if attempts.len() >= self.max_attempts {
            return false;
        }

        attempts.push(now_ms);
        store.set(&storage_key, serde_json::Value::from(attempts).to_string());
        true
    }

    /// Forget all attempts for `key`.
    pub fn clear(&self, store: &mut impl Storage, key: &str) {
        store.remove(&storage_key(key));
    }
}

fn storage_key(key: &str) -> String {
    format!("ratelimit_{}", key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    #[test]
    fn allows_up_to_the_limit() {
        let limiter = RateLimiter::new(3, 1_000);
        let mut store = MemoryStorage::new();

        assert!(limiter.check(&mut store, "contact", 0));
        assert!(limiter.check(&mut store, "contact", 10));
        assert!(limiter.check(&mut store, "contact", 20));
        assert!(!limiter.check(&mut store, "contact", 30));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(2, 1_000);
        let mut store = MemoryStorage::new();

        assert!(limiter.check(&mut store, "login", 0));
        assert!(limiter.check(&mut store, "login", 500));
        assert!(!limiter.check(&mut store, "login", 900));
        assert!(limiter.check(&mut store, "login", 1_000));
    }

    #[test]
    fn keys_are_independent_and_clearable() {
        let limiter = RateLimiter::new(1, 60_000);
        let mut store = MemoryStorage::new();

        assert!(limiter.check(&mut store, "a", 0));
        assert!(limiter.check(&mut store, "b", 0));
        assert!(!limiter.check(&mut store, "a", 1));

        limiter.clear(&mut store, "a");
        assert!(limiter.check(&mut store, "a", 2));
    }

    #[test]
    fn malformed_entry_starts_fresh() {
        let limiter = RateLimiter::default();
        let mut store = MemoryStorage::new();
        store.set("ratelimit_quote", "not json".to_string());

        assert!(limiter.check(&mut store, "quote", 0));
        assert_eq!(store.get("ratelimit_quote").unwrap(), "[0]");
    }

    #[test]
    fn extreme_timestamps_are_dropped() {
        let limiter = RateLimiter::new(1, 60_000);
        let mut store = MemoryStorage::new();
        store.set("ratelimit_x", format!("[{}]", i64::MIN));

        assert!(limiter.check(&mut store, "x", 1_700_000_000_000));
        assert_eq!(
            store.get("ratelimit_x").unwrap(),
            "[1700000000000]"
        );
    }
}
