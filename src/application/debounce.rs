//! Debounce and throttle utilities for chatty call sites.
//!
//! These complement the governor rather than replace it: the governor
//! protects the shared backend per caller, while these objects smooth a
//! single call site (a search box, an autosave hook) before the request is
//! even attempted.
//!
//! Both are trailing-edge aware and driven by the tokio timer, so tests run
//! them under a paused runtime with virtual time.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Trailing-edge debouncer.
///
/// Each [`call`](Self::call) cancels the pending invocation and schedules a
/// new one `delay` after it; only the last call in a burst fires. The action
/// runs on a tokio task, so a runtime must be active when `call` is invoked.
pub struct Debouncer<T: Send + 'static> {
    delay: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Debounce `action` so it fires `delay` after the last call.
    pub fn new(delay: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    /// Schedule `arg` for delivery, superseding any pending delivery.
    pub fn call(&self, arg: T) {
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(arg);
        });

        if let Some(previous) = lock_unpoisoned(&self.pending).replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending invocation, if any, without firing it.
    pub fn cancel(&self) {
        if let Some(pending) = lock_unpoisoned(&self.pending).take() {
            pending.abort();
        }
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T: Send + 'static> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

struct ThrottlerState<T> {
    /// When the action last fired, if ever.
    last_fired: Option<Instant>,
    /// Latest args waiting for the trailing fire; replaced on each call.
    queued: Option<T>,
    /// The one scheduled trailing task, if any.
    trailing: Option<JoinHandle<()>>,
}

/// Leading-plus-trailing throttler.
///
/// The first call in an idle period fires immediately. Calls arriving within
/// `interval` of the last fire are coalesced: the latest arguments are kept
/// and delivered once when the interval elapses. Intermediate arguments in a
/// burst are dropped by design.
pub struct Throttler<T: Send + 'static> {
    interval: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    state: Arc<Mutex<ThrottlerState<T>>>,
}

impl<T: Send + 'static> Throttler<T> {
    /// Throttle `action` to at most one fire per `interval`.
    pub fn new(interval: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            interval,
            action: Arc::new(action),
            state: Arc::new(Mutex::new(ThrottlerState {
                last_fired: None,
                queued: None,
                trailing: None,
            })),
        }
    }

    /// Fire now if the interval has passed, otherwise queue for the trailing
    /// edge.
    pub fn call(&self, arg: T) {
        let now = Instant::now();
        let mut state = lock_unpoisoned(&self.state);

        let due = match state.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };

        if due {
            state.last_fired = Some(now);
            drop(state);
            (self.action)(arg);
            return;
        }

        // Inside the interval: keep only the newest args, schedule at most
        // one trailing task.
        state.queued = Some(arg);
        if state.trailing.is_none() {
            let wait = self.interval
                - now.saturating_duration_since(state.last_fired.unwrap_or(now));
            let action = Arc::clone(&self.action);
            let shared = Arc::clone(&self.state);
            state.trailing = Some(tokio::spawn(async move {
                tokio::time::sleep(wait).await;
                let arg = {
                    let mut state = lock_unpoisoned(&shared);
                    state.trailing = None;
                    state.last_fired = Some(Instant::now());
                    state.queued.take()
                };
                if let Some(arg) = arg {
                    action(arg);
                }
            }));
        }
    }

    /// Drop the queued trailing fire, if any.
    pub fn cancel(&self) {
        let mut state = lock_unpoisoned(&self.state);
        state.queued = None;
        if let Some(trailing) = state.trailing.take() {
            trailing.abort();
        }
    }
}

impl<T: Send + 'static> Drop for Throttler<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T: Send + 'static> std::fmt::Debug for Throttler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttler")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;

    fn counting_sink() -> (Arc<AtomicUsize>, Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let action = {
            let count = Arc::clone(&count);
            let seen = Arc::clone(&seen);
            move |arg: u32| {
                count.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push(arg);
            }
        };
        (count, seen, action)
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_fires_only_last_call() {
        let (count, seen, action) = counting_sink();
        let debouncer = Debouncer::new(Duration::from_millis(300), action);

        debouncer.call(1);
        advance(Duration::from_millis(100)).await;
        debouncer.call(2);
        advance(Duration::from_millis(100)).await;
        debouncer.call(3);
        tokio::task::yield_now().await;

        advance(Duration::from_millis(301)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_separate_bursts_each_fire() {
        let (count, _, action) = counting_sink();
        let debouncer = Debouncer::new(Duration::from_millis(100), action);

        debouncer.call(1);
        tokio::task::yield_now().await;
        advance(Duration::from_millis(101)).await;
        tokio::task::yield_now().await;

        debouncer.call(2);
        tokio::task::yield_now().await;
        advance(Duration::from_millis(101)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_cancel_suppresses_pending() {
        let (count, _, action) = counting_sink();
        let debouncer = Debouncer::new(Duration::from_millis(100), action);

        debouncer.call(1);
        debouncer.cancel();

        advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_drop_cancels() {
        let (count, _, action) = counting_sink();
        {
            let debouncer = Debouncer::new(Duration::from_millis(100), action);
            debouncer.call(1);
        }

        advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_leading_fire_is_immediate() {
        let (count, seen, action) = counting_sink();
        let throttler = Throttler::new(Duration::from_millis(500), action);

        throttler.call(1);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_coalesces_to_latest_args() {
        let (count, seen, action) = counting_sink();
        let throttler = Throttler::new(Duration::from_millis(500), action);

        throttler.call(1);
        advance(Duration::from_millis(100)).await;
        throttler.call(2);
        advance(Duration::from_millis(100)).await;
        throttler.call(3);

        advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;

        // Leading fire with 1, trailing fire with the latest (3); 2 dropped.
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_fires_again_after_interval() {
        let (count, _, action) = counting_sink();
        let throttler = Throttler::new(Duration::from_millis(100), action);

        throttler.call(1);
        advance(Duration::from_millis(101)).await;
        throttler.call(2);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_cancel_drops_trailing() {
        let (count, seen, action) = counting_sink();
        let throttler = Throttler::new(Duration::from_millis(500), action);

        throttler.call(1);
        throttler.call(2);
        throttler.cancel();

        advance(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }
}
