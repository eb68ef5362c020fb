//! Fixed-window accounting for one bucket key.
//!
//! The window is fixed, not sliding: the counter resets wholesale once
//! `window` has elapsed since the window started. Bursts of up to
//! `2 x max_requests` are therefore possible across a window boundary. This
//! matches the observed behavior of the system being guarded and is kept
//! deliberately; callers wanting a sliding window want a different algorithm.

use crate::domain::config::RateLimitConfig;
use std::time::{Duration, Instant};

/// Mutable per-key state.
///
/// Created lazily on the first check for a key, reset when its window
/// expires, and discarded by `clear`/`clear_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Accepted requests in the current window.
    pub count: u32,
    /// When the current window started.
    pub window_start: Instant,
    /// When the last request was accepted, if any in this window.
    pub last_request: Option<Instant>,
}

/// Why a check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The window quota is exhausted.
    WindowExhausted,
    /// The request arrived sooner than the configured minimum interval.
    MinInterval,
}

/// Immutable outcome of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Quota left in the current window after this decision.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: Instant,
    /// How long to wait before retrying, on denial.
    pub retry_after: Option<Duration>,
    /// Human-readable denial message, on denial.
    pub error: Option<String>,
    /// What caused the denial, on denial.
    pub denial: Option<DenialReason>,
}

impl RateLimitResult {
    /// True when the denial came from quota or throttle rather than success.
    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}

impl WindowEntry {
    /// Fresh entry whose window starts now.
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            last_request: None,
        }
    }

    /// Whether the window this entry tracks has fully elapsed.
    pub fn is_expired(&self, now: Instant, config: &RateLimitConfig) -> bool {
        now.saturating_duration_since(self.window_start) >= config.window
    }

    /// Decide whether a request at `now` may proceed, mutating the entry
    /// accordingly.
    ///
    /// Order of checks:
    /// 1. An expired window is reset in place before anything else.
    /// 2. A request arriving sooner than `min_interval` after the previous
    ///    one is denied without consuming quota.
    /// 3. An exhausted window denies and leaves state untouched.
    /// 4. Otherwise the request is accepted and counted.
    pub fn assess(&mut self, now: Instant, config: &RateLimitConfig) -> RateLimitResult {
        if self.is_expired(now, config) {
            *self = WindowEntry::new(now);
        }
        let reset_at = self.window_start + config.window;

        if let (Some(min_interval), Some(last)) = (config.min_interval, self.last_request) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < min_interval {
                return RateLimitResult {
                    allowed: false,
                    remaining: config.max_requests.saturating_sub(self.count),
                    reset_at,
                    retry_after: Some(min_interval - elapsed),
                    error: Some("You're doing that too quickly. Please slow down.".to_string()),
                    denial: Some(DenialReason::MinInterval),
                };
            }
        }

        if self.count >= config.max_requests {
            let retry_after = reset_at.saturating_duration_since(now);
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at,
                retry_after: Some(retry_after),
                error: Some(format!(
                    "Too many requests. Please try again in {}s.",
                    retry_after.as_secs().max(1)
                )),
                denial: Some(DenialReason::WindowExhausted),
            };
        }

        self.count += 1;
        self.last_request = Some(now);
        RateLimitResult {
            allowed: true,
            remaining: config.max_requests - self.count,
            reset_at,
            retry_after: None,
            error: None,
            denial: None,
        }
    }

    /// Quota left at `now` without mutating anything.
    ///
    /// Applies the same expiry rule as [`assess`](Self::assess): an expired
    /// window reads as full quota. A read must never itself reset or consume
    /// the window.
    pub fn remaining(&self, now: Instant, config: &RateLimitConfig) -> u32 {
        if self.is_expired(now, config) {
            config.max_requests
        } else {
            config.max_requests.saturating_sub(self.count)
        }
    }
}
