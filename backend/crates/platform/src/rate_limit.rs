//! Rate Limiting Infrastructure
//!
//! Sliding-window rate limiting keyed by client identity.
//!
//! Every identity owns an ordered log of request timestamps (ms). On each
//! request the log is pruned to the trailing window, compared against the
//! threshold and, when admitted, extended with the new timestamp. The
//! prune/compare/append cycle runs under the map's per-key write lock, so
//! concurrent bursts from one identity cannot lose updates.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
    /// How often idle identities are swept from memory
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            ..Self::default()
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// When the oldest request in the window expires
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Seconds until the window frees a slot, rounded up, never below 1
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let wait_ms = (self.reset_at_ms - now_ms).max(0) as u64;
        wait_ms.div_ceil(1000).max(1)
    }
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Check and increment rate limit counter
    ///
    /// A rejected request is not recorded.
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>>;
}

/// Current wall-clock time in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Single-process sliding-window store
///
/// State is lost on restart. Identities are created lazily and removed by
/// [`InMemoryRateLimitStore::sweep`] once their window is empty.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    entries: DashMap<String, VecDeque<i64>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admission decision for `key` at an explicit instant
    pub fn check_at(&self, key: &str, config: &RateLimitConfig, now_ms: i64) -> RateLimitResult {
        let window_ms = config.window_ms();
        let mut stamps = self.entries.entry(key.to_owned()).or_default();

        prune(&mut stamps, now_ms - window_ms);

        let count = stamps.len() as u32;
        if count >= config.max_requests {
            let oldest = stamps.front().copied().unwrap_or(now_ms);
            tracing::warn!(
                key = %key,
                count = count,
                max = config.max_requests,
                "Rate limit exceeded"
            );
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at_ms: oldest + window_ms,
            };
        }

        // Keep the log non-decreasing even if the wall clock steps back.
        let stamp = stamps.back().map_or(now_ms, |&last| last.max(now_ms));
        stamps.push_back(stamp);

        let oldest = stamps.front().copied().unwrap_or(stamp);
        RateLimitResult {
            allowed: true,
            remaining: config.max_requests - (count + 1),
            reset_at_ms: oldest + window_ms,
        }
    }

    /// Drop identities with no requests left in the window
    ///
    /// Returns the number of identities removed.
    pub fn sweep_at(&self, config: &RateLimitConfig, now_ms: i64) -> usize {
        let cutoff = now_ms - config.window_ms();
        let before = self.entries.len();
        self.entries.retain(|_, stamps| {
            prune(stamps, cutoff);
            !stamps.is_empty()
        });
        before.saturating_sub(self.entries.len())
    }

    pub fn sweep(&self, config: &RateLimitConfig) -> usize {
        self.sweep_at(config, now_ms())
    }

    /// Number of identities currently holding state
    pub fn tracked_identities(&self) -> usize {
        self.entries.len()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.check_at(key, config, now_ms()))
    }
}

fn prune(stamps: &mut VecDeque<i64>, cutoff: i64) {
    while stamps.front().is_some_and(|&t| t <= cutoff) {
        stamps.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 30);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.window_ms(), 60_000);
    }

    #[test]
    fn test_admits_up_to_threshold() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::default();

        for i in 0..30 {
            let result = store.check_at("10.0.0.1", &config, T0 + i);
            assert!(result.allowed, "request {} should be admitted", i + 1);
            assert_eq!(result.remaining, 29 - i as u32);
        }

        let rejected = store.check_at("10.0.0.1", &config, T0 + 30);
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.reset_at_ms, T0 + 60_000);
    }

    #[test]
    fn test_rejected_request_is_not_recorded() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::new(2, 60);

        assert!(store.check_at("a", &config, T0).allowed);
        assert!(store.check_at("a", &config, T0 + 1_000).allowed);
        for i in 0..10 {
            assert!(!store.check_at("a", &config, T0 + 2_000 + i).allowed);
        }

        // Only the first admitted request has left the window.
        assert!(store.check_at("a", &config, T0 + 60_000).allowed);
        assert!(!store.check_at("a", &config, T0 + 60_001).allowed);
    }

    #[test]
    fn test_window_resets_after_it_elapses() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::default();

        for _ in 0..30 {
            assert!(store.check_at("ip", &config, T0).allowed);
        }
        assert!(!store.check_at("ip", &config, T0 + 59_999).allowed);
        assert!(store.check_at("ip", &config, T0 + 61_000).allowed);
    }

    #[test]
    fn test_identities_are_independent() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);

        assert!(store.check_at("a", &config, T0).allowed);
        assert!(!store.check_at("a", &config, T0).allowed);
        assert!(store.check_at("b", &config, T0).allowed);
    }

    #[test]
    fn test_timestamps_stay_non_decreasing() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::new(3, 60);

        store.check_at("a", &config, T0 + 5_000);
        // Clock stepped backwards
        store.check_at("a", &config, T0);

        let stamps = store.entries.get("a").unwrap().clone();
        assert_eq!(stamps, VecDeque::from(vec![T0 + 5_000, T0 + 5_000]));
    }

    #[test]
    fn test_sweep_removes_idle_identities() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::default();

        store.check_at("old", &config, T0);
        store.check_at("fresh", &config, T0 + 50_000);
        assert_eq!(store.tracked_identities(), 2);

        let removed = store.sweep_at(&config, T0 + 61_000);
        assert_eq!(removed, 1);
        assert_eq!(store.tracked_identities(), 1);
        assert!(store.entries.contains_key("fresh"));
    }

    #[test]
    fn test_retry_after_secs() {
        let result = RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_at_ms: T0 + 1_500,
        };
        assert_eq!(result.retry_after_secs(T0), 2);
        assert_eq!(result.retry_after_secs(T0 + 10_000), 1);
    }

    #[test]
    fn test_concurrent_burst_never_overcounts() {
        let store = Arc::new(InMemoryRateLimitStore::new());
        let config = Arc::new(RateLimitConfig::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let config = config.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| store.check_at("burst", &config, T0).allowed)
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 30);
        assert_eq!(store.entries.get("burst").unwrap().len(), 30);
    }

    #[test]
    fn test_store_trait_impl() {
        let store = InMemoryRateLimitStore::new();
        let config = RateLimitConfig::new(1, 60);

        let first =
            tokio_test::block_on(RateLimitStore::check_and_increment(&store, "k", &config)).unwrap();
        let second =
            tokio_test::block_on(RateLimitStore::check_and_increment(&store, "k", &config)).unwrap();
        assert!(first.allowed);
        assert!(!second.allowed);
    }
}
