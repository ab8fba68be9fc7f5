use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::config;

/// Sliding-window rate limiter for song requests.
///
/// Each requester may be admitted at most `limit` times within any trailing
/// `window`. Timestamps of admitted requests are kept per requester and
/// pruned on every check, so the decision always reflects the last `window`
/// and never a fixed-grid bucket.
///
/// The whole read-prune-append sequence runs under one lock, which makes the
/// check atomic per requester even when several handlers race.
#[derive(Clone)]
pub struct RateLimiter {
    /// Admission timestamps per requester, oldest first
    windows: Arc<Mutex<HashMap<i64, VecDeque<Instant>>>>,
    /// Maximum admitted requests per window
    limit: usize,
    /// Length of the sliding window
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Creates a rate limiter with the bot defaults: 2 requests per 60 seconds.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dorasong::core::rate_limiter::RateLimiter;
    ///
    /// let limiter = RateLimiter::new();
    /// ```
    pub fn new() -> Self {
        Self::with_limit(config::rate_limit::LIMIT, config::rate_limit::window())
    }

    /// Creates a rate limiter with a custom limit and window.
    pub fn with_limit(limit: usize, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            limit,
            window,
        }
    }

    /// Decides whether `requester` may proceed right now.
    ///
    /// Returns `true` and records the request when fewer than `limit`
    /// requests were admitted within the trailing window, `false` otherwise.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dorasong::core::rate_limiter::RateLimiter;
    ///
    /// # async fn example() {
    /// let limiter = RateLimiter::new();
    /// if !limiter.allow(123456789).await {
    ///     println!("Too many requests");
    /// }
    /// # }
    /// ```
    pub async fn allow(&self, requester: i64) -> bool {
        self.allow_at(requester, Instant::now()).await
    }

    /// Same as [`RateLimiter::allow`] with an explicit clock reading.
    pub async fn allow_at(&self, requester: i64, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;
        let timestamps = windows.entry(requester).or_default();
        prune_window(timestamps, now, self.window);

        if timestamps.len() >= self.limit {
            log::debug!(
                "Requester {} rejected: {} requests within {}s",
                requester,
                timestamps.len(),
                self.window.as_secs()
            );
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Time left until `requester` gets a free slot.
    ///
    /// Returns `None` if the requester could be admitted right now.
    pub async fn remaining_time(&self, requester: i64) -> Option<Duration> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let timestamps = windows.get_mut(&requester)?;
        prune_window(timestamps, now, self.window);

        if timestamps.len() < self.limit {
            return None;
        }
        // With `limit` entries in the window, the oldest one frees the next slot
        let oldest = *timestamps.front()?;
        Some(self.window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    /// Forgets everything recorded for `requester`.
    ///
    /// Used by the owner `/reset` command.
    pub async fn reset(&self, requester: i64) {
        let mut windows = self.windows.lock().await;
        windows.remove(&requester);
    }

    /// Number of requesters currently tracked.
    pub async fn tracked_requesters(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Drops requesters whose window is empty after pruning.
    ///
    /// Returns the number of evicted requesters.
    pub async fn sweep_stale(&self) -> usize {
        self.sweep_stale_at(Instant::now()).await
    }

    /// Same as [`RateLimiter::sweep_stale`] with an explicit clock reading.
    pub async fn sweep_stale_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, timestamps| {
            prune_window(timestamps, now, self.window);
            !timestamps.is_empty()
        });
        before - windows.len()
    }

    /// Spawns a background task that periodically evicts idle requesters,
    /// keeping the map bounded by the number of recently active users.
    pub fn spawn_cleanup_task(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = self.sweep_stale().await;
                if evicted > 0 {
                    log::debug!("Rate limiter sweep evicted {} idle requesters", evicted);
                }
            }
        })
    }
}

/// Removes timestamps that fell out of the trailing window.
///
/// Keeps every `t` with `now - t < window`; timestamps are stored in
/// insertion order, so pruning only ever pops from the front.
pub fn prune_window(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_duration_since(oldest) < window {
            break;
        }
        timestamps.pop_front();
    }
}
