//! Rate governor coordination logic.
//!
//! The governor decides, per bucket key and operation class, whether a new
//! attempt may proceed. It owns the per-key window table through the Storage
//! port and reads time through the Clock port, so tests can instantiate
//! isolated instances with a controlled clock.
//!
//! The governor never raises for expected conditions: every decision flows
//! through [`RateLimitResult`]. The one typed error, [`RateLimitError`],
//! exists solely for the [`execute`](RateGovernor::execute) convenience
//! wrapper and is a deliberate, catchable signal rather than a crash.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::domain::config::ConfigTable;
use crate::domain::window::{DenialReason, RateLimitResult, WindowEntry};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A request was blocked by policy.
///
/// Carries the retry hint so UI layers can tell the user how long to wait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RateLimitError {
    /// Human-readable denial message.
    pub message: String,
    /// How long to wait before retrying, when known.
    pub retry_after: Option<Duration>,
}

impl RateLimitError {
    fn from_result(result: &RateLimitResult) -> Self {
        Self {
            message: result
                .error
                .clone()
                .unwrap_or_else(|| "Too many requests.".to_string()),
            retry_after: result.retry_after,
        }
    }
}

/// Failure channel of [`RateGovernor::execute`].
///
/// "Blocked by policy" and "failed in flight" travel the same channel so UI
/// layers can handle both with one code path, while still being able to
/// branch on [`is_rate_limited`](Self::is_rate_limited).
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    /// The governor denied the request before the operation ran.
    #[error("{0}")]
    RateLimited(#[from] RateLimitError),
    /// The operation itself failed.
    #[error("{0}")]
    Operation(E),
}

impl<E> ExecuteError<E> {
    /// Whether this failure came from the rate limiter.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ExecuteError::RateLimited(_))
    }

    /// Retry hint, when the failure was a policy denial.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ExecuteError::RateLimited(err) => err.retry_after,
            ExecuteError::Operation(_) => None,
        }
    }
}

/// Keyed fixed-window rate limiter with a minimum-interval throttle.
///
/// Generic over the storage implementation; in production use the default
/// `Arc<ShardedStorage>`-backed governor from [`RateGovernor::new`].
#[derive(Clone)]
pub struct RateGovernor<S = Arc<ShardedStorage<String, WindowEntry>>>
where
    S: Storage<String, WindowEntry> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
    configs: ConfigTable,
    metrics: Metrics,
}

impl RateGovernor {
    /// Governor with sharded in-memory storage, the system clock, and the
    /// built-in config table.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(ShardedStorage::new()),
            Arc::new(SystemClock::new()),
            ConfigTable::with_defaults(),
        )
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RateGovernor<S>
where
    S: Storage<String, WindowEntry> + Clone,
{
    /// Assemble a governor from explicit parts.
    pub fn with_parts(storage: S, clock: Arc<dyn Clock>, configs: ConfigTable) -> Self {
        Self {
            storage,
            clock,
            configs,
            metrics: Metrics::new(),
        }
    }

    /// Decide whether a request under `key` may proceed.
    ///
    /// The entry for `key` is created lazily; an expired window resets in
    /// place. Acceptance consumes quota, denials do not. An unknown
    /// `config_name` falls back to the table's default policy.
    pub fn check(&self, key: &str, config_name: &str) -> RateLimitResult {
        let config = self.configs.get(config_name);
        let now = self.clock.now();
        let result = self.storage.with_entry_mut(
            key.to_owned(),
            || WindowEntry::new(now),
            |entry| entry.assess(now, &config),
        );

        match result.denial {
            None => {
                self.metrics.record_allowed();
                tracing::trace!(key, config = config_name, remaining = result.remaining, "allowed");
            }
            Some(DenialReason::MinInterval) => {
                self.metrics.record_throttled();
                tracing::debug!(key, config = config_name, retry_after = ?result.retry_after, "throttled");
            }
            Some(DenialReason::WindowExhausted) => {
                self.metrics.record_exhausted();
                tracing::debug!(key, config = config_name, retry_after = ?result.retry_after, "window exhausted");
            }
        }

        result
    }

    /// Run `op` only if `check` allows it.
    ///
    /// On denial, returns [`ExecuteError::RateLimited`] without invoking
    /// `op`. On acceptance, awaits `op` and funnels its failure into
    /// [`ExecuteError::Operation`]. No lock is held across the await: the
    /// entry mutation happens synchronously inside `check`, so concurrent
    /// executions under one key cannot lose updates. Callers that clear the
    /// limiter on success must do so after `op` resolves, not preemptively.
    pub async fn execute<F, Fut, T, E>(
        &self,
        key: &str,
        config_name: &str,
        op: F,
    ) -> Result<T, ExecuteError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let decision = self.check(key, config_name);
        if !decision.allowed {
            return Err(ExecuteError::RateLimited(RateLimitError::from_result(
                &decision,
            )));
        }
        op().await.map_err(ExecuteError::Operation)
    }

    /// Quota left for `key` without consuming or resetting anything.
    ///
    /// Applies the same window-expiry rule as `check`; a never-seen or
    /// expired key reads as full quota.
    pub fn remaining(&self, key: &str, config_name: &str) -> u32 {
        let config = self.configs.get(config_name);
        let now = self.clock.now();
        match self.storage.read(&key.to_owned()) {
            Some(entry) => entry.remaining(now, &config),
            None => config.max_requests,
        }
    }

    /// Drop the entry for one key.
    ///
    /// Used to reward successful security-sensitive transitions: a correct
    /// login clears the brute-force counter for that email immediately.
    pub fn clear(&self, key: &str) {
        self.storage.remove(&key.to_owned());
    }

    /// Drop all entries. Intended to run at logout.
    pub fn clear_all(&self) {
        self.storage.clear();
    }

    /// Number of tracked buckets.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether no buckets are tracked.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The governor's metrics handle.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The config table in use.
    pub fn configs(&self) -> &ConfigTable {
        &self.configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::RateLimitConfig;
    use crate::infrastructure::mocks::MockClock;
    use std::time::Instant;

    fn governor_with_clock(clock: Arc<MockClock>) -> RateGovernor {
        let mut configs = ConfigTable::with_defaults();
        configs.insert(
            "test:op",
            RateLimitConfig::new(3, Duration::from_secs(60)),
        );
        configs.insert(
            "test:throttled",
            RateLimitConfig::with_min_interval(10, Duration::from_secs(60), Duration::from_secs(2)),
        );
        RateGovernor::with_parts(Arc::new(ShardedStorage::new()), clock, configs)
    }

    #[test]
    fn test_check_allows_then_denies() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        for _ in 0..3 {
            assert!(governor.check("k", "test:op").allowed);
        }
        let denied = governor.check("k", "test:op");
        assert!(!denied.allowed);
        assert_eq!(denied.denial, Some(DenialReason::WindowExhausted));
    }

    #[test]
    fn test_window_reset_after_expiry() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock.clone());

        for _ in 0..3 {
            governor.check("k", "test:op");
        }
        assert!(!governor.check("k", "test:op").allowed);

        clock.advance(Duration::from_secs(61));
        let result = governor.check("k", "test:op");
        assert!(result.allowed);
        assert_eq!(result.remaining, 2);
    }

    #[test]
    fn test_keys_are_independent() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        for _ in 0..3 {
            assert!(governor.check("alice", "test:op").allowed);
        }
        assert!(!governor.check("alice", "test:op").allowed);
        assert!(governor.check("bob", "test:op").allowed);
    }

    #[test]
    fn test_throttle_denial_keeps_quota() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock.clone());

        assert!(governor.check("k", "test:throttled").allowed);
        let before = governor.remaining("k", "test:throttled");

        clock.advance(Duration::from_millis(500));
        let denied = governor.check("k", "test:throttled");
        assert!(!denied.allowed);
        assert_eq!(denied.denial, Some(DenialReason::MinInterval));
        assert_eq!(denied.retry_after, Some(Duration::from_millis(1500)));
        assert_eq!(governor.remaining("k", "test:throttled"), before);
    }

    #[test]
    fn test_clear_behaves_like_never_seen() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        for _ in 0..3 {
            governor.check("k", "test:op");
        }
        assert!(!governor.check("k", "test:op").allowed);

        governor.clear("k");
        let result = governor.check("k", "test:op");
        assert!(result.allowed);
        assert_eq!(result.remaining, 2);
    }

    #[test]
    fn test_clear_all_resets_every_bucket() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        governor.check("a", "test:op");
        governor.check("b", "test:op");
        assert_eq!(governor.len(), 2);

        governor.clear_all();
        assert!(governor.is_empty());
    }

    #[test]
    fn test_remaining_does_not_mutate() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        assert_eq!(governor.remaining("k", "test:op"), 3);
        // Reading never creates an entry.
        assert!(governor.is_empty());

        governor.check("k", "test:op");
        assert_eq!(governor.remaining("k", "test:op"), 2);
        assert_eq!(governor.remaining("k", "test:op"), 2);
    }

    #[test]
    fn test_unknown_config_falls_back() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        // Fallback allows 10 per minute; it must not crash or deny outright.
        let result = governor.check("k", "no:such:config");
        assert!(result.allowed);
        assert_eq!(result.remaining, 9);
    }

    #[test]
    fn test_metrics_track_decisions() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock.clone());

        for _ in 0..4 {
            governor.check("k", "test:op");
        }
        clock.advance(Duration::from_millis(100));
        governor.check("t", "test:throttled");
        governor.check("t", "test:throttled");

        let snapshot = governor.metrics().snapshot();
        assert_eq!(snapshot.checks_allowed, 4);
        assert_eq!(snapshot.checks_exhausted, 1);
        assert_eq!(snapshot.checks_throttled, 1);
    }

    #[tokio::test]
    async fn test_execute_runs_operation_when_allowed() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        let result: Result<i32, ExecuteError<std::io::Error>> = governor
            .execute("k", "test:op", || async { Ok(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_execute_denies_without_invoking_operation() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        for _ in 0..3 {
            governor.check("k", "test:op");
        }

        let mut invoked = false;
        let result: Result<(), ExecuteError<std::io::Error>> = governor
            .execute("k", "test:op", || {
                invoked = true;
                async { Ok(()) }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_rate_limited());
        assert!(err.retry_after().unwrap() > Duration::ZERO);
        assert!(!invoked, "denied execute must not invoke the operation");
    }

    #[tokio::test]
    async fn test_execute_funnels_operation_failure() {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = governor_with_clock(clock);

        let result: Result<(), ExecuteError<String>> = governor
            .execute("k", "test:op", || async { Err("boom".to_string()) })
            .await;

        let err = result.unwrap_err();
        assert!(!err.is_rate_limited());
        assert_eq!(err.retry_after(), None);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_concurrent_checks_respect_quota() {
        use std::thread;

        let clock = Arc::new(MockClock::new(Instant::now()));
        let governor = Arc::new(governor_with_clock(clock));
        let mut handles = vec![];

        for _ in 0..8 {
            let governor = Arc::clone(&governor);
            handles.push(thread::spawn(move || {
                let mut allowed = 0u32;
                for _ in 0..10 {
                    if governor.check("shared", "test:op").allowed {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 3, "quota must hold across threads");
    }
}
