//! Rate limit configuration and the named policy table.
//!
//! Every guarded operation class (sign-in, item creation, search, ...) is
//! registered under a name with its own [`RateLimitConfig`]. Callers select a
//! config by name at check time; unknown names fall back to a conservative
//! default rather than failing, so a mistyped name degrades gracefully
//! instead of crashing the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Policy for one operation class.
///
/// `min_interval`, when set, should be no larger than
/// `window / max_requests` for the combination to be meaningful. That is a
/// caller-quality concern; the governor does not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum accepted requests per window.
    pub max_requests: u32,
    /// Length of the fixed window.
    pub window: Duration,
    /// Minimum spacing between consecutive accepted requests, if any.
    #[serde(default)]
    pub min_interval: Option<Duration>,
}

impl RateLimitConfig {
    /// Create a config with no minimum-interval throttle.
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            min_interval: None,
        }
    }

    /// Create a config that also enforces a minimum spacing between requests.
    pub const fn with_min_interval(
        max_requests: u32,
        window: Duration,
        min_interval: Duration,
    ) -> Self {
        Self {
            max_requests,
            window,
            min_interval: Some(min_interval),
        }
    }
}

/// Fallback policy applied when a config name is not registered.
pub const FALLBACK_CONFIG: RateLimitConfig = RateLimitConfig::new(10, Duration::from_secs(60));

/// Named table of rate limit configs with a fallback.
#[derive(Debug, Clone)]
pub struct ConfigTable {
    configs: BTreeMap<String, RateLimitConfig>,
    fallback: RateLimitConfig,
}

impl ConfigTable {
    /// Create an empty table with the given fallback policy.
    pub fn empty(fallback: RateLimitConfig) -> Self {
        Self {
            configs: BTreeMap::new(),
            fallback,
        }
    }

    /// Create a table pre-populated with the built-in operation classes.
    pub fn with_defaults() -> Self {
        let mut table = Self::empty(FALLBACK_CONFIG);

        // Authentication: small budgets, long windows for the expensive ones.
        table.insert(
            "auth:signIn",
            RateLimitConfig::new(5, Duration::from_secs(60)),
        );
        table.insert(
            "auth:signUp",
            RateLimitConfig::new(3, Duration::from_secs(3600)),
        );
        table.insert(
            "auth:resetPassword",
            RateLimitConfig::new(3, Duration::from_secs(3600)),
        );

        // Mutating content operations.
        table.insert(
            "collection:create",
            RateLimitConfig::with_min_interval(
                10,
                Duration::from_secs(60),
                Duration::from_secs(2),
            ),
        );
        table.insert(
            "collection:update",
            RateLimitConfig::new(30, Duration::from_secs(60)),
        );
        table.insert(
            "item:create",
            RateLimitConfig::with_min_interval(30, Duration::from_secs(60), Duration::from_secs(1)),
        );
        table.insert(
            "item:update",
            RateLimitConfig::new(60, Duration::from_secs(60)),
        );
        table.insert(
            "comment:create",
            RateLimitConfig::with_min_interval(5, Duration::from_secs(60), Duration::from_secs(2)),
        );
        table.insert(
            "profile:update",
            RateLimitConfig::new(10, Duration::from_secs(60)),
        );
        table.insert(
            "image:upload",
            RateLimitConfig::with_min_interval(10, Duration::from_secs(60), Duration::from_secs(1)),
        );

        // Search is cheap but chatty; throttle spacing matters more than quota.
        table.insert(
            "search",
            RateLimitConfig::with_min_interval(
                30,
                Duration::from_secs(60),
                Duration::from_millis(300),
            ),
        );

        table
    }

    /// Register or replace a named config.
    pub fn insert(&mut self, name: impl Into<String>, config: RateLimitConfig) {
        self.configs.insert(name.into(), config);
    }

    /// Look up a config by name, falling back to the default policy.
    ///
    /// The fallback is deliberate graceful degradation: a caller should not
    /// crash because a config name was mistyped.
    pub fn get(&self, name: &str) -> RateLimitConfig {
        match self.configs.get(name) {
            Some(config) => *config,
            None => {
                tracing::debug!(config = name, "unknown rate limit config, using fallback");
                self.fallback
            }
        }
    }

    /// Check whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    /// Iterate over the registered config names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    /// The fallback policy.
    pub fn fallback(&self) -> RateLimitConfig {
        self.fallback
    }
}

impl Default for ConfigTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Build a bucket key from an operation name and an optional caller identity.
///
/// The identifier partitions limiter state per caller, e.g.
/// `rate_limit_key("auth:signIn", Some("user@example.com"))` yields
/// `"auth:signIn:user@example.com"`. Pass sanitized values only; the key is
/// treated as opaque.
pub fn rate_limit_key(operation: &str, identifier: Option<&str>) -> String {
    match identifier {
        Some(id) => format!("{}:{}", operation, id),
        None => operation.to_string(),
    }
}
