//! Sliding-window admission control for outbound API requests.
//!
//! Every request recorded in the trailing 60 seconds counts against
//! `requests_per_minute`. Callers suspend in [`RateLimiter::await_admission`]
//! until the window has room; the limiter never rejects a request outright.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Length of the admission window
pub const WINDOW: Duration = Duration::from_secs(60);

/// Wait used when the window is full but holds no entries (a zero limit)
const EMPTY_WINDOW_WAIT: Duration = Duration::from_millis(1000);

/// Floor for a single admission retry so the loop never spins
const MIN_WAIT: Duration = Duration::from_millis(1);

const JITTER_FACTOR: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Admissions allowed per trailing minute. Zero blocks every admission.
    pub requests_per_minute: u32,
    /// Base delay for exponential backoff
    pub retry_delay: Duration,
    /// Upper bound for both backoff and a single admission wait
    pub max_retry_delay: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 120,
            retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_millis(30_000),
        }
    }
}

/// Snapshot of the admission window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub requests_in_last_minute: u32,
    pub remaining_requests: u32,
    pub requests_per_minute: u32,
    /// When the oldest counted request leaves the window
    pub reset_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    at: DateTime<Utc>,
    count: u32,
}

/// Rolling 60-second request limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    window: Mutex<VecDeque<WindowEntry>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        if config.requests_per_minute == 0 {
            warn!("requests_per_minute is 0; no request will ever be admitted");
        }

        Self {
            config,
            window: Mutex::new(VecDeque::new()),
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn lock_window(&self) -> MutexGuard<'_, VecDeque<WindowEntry>> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop entries that have aged out of the window and return the count of
    /// the survivors.
    fn purge(window: &mut VecDeque<WindowEntry>, now: DateTime<Utc>) -> u32 {
        while let Some(entry) = window.front() {
            if Self::age(entry.at, now) >= WINDOW {
                window.pop_front();
            } else {
                break;
            }
        }
        window.iter().map(|e| e.count).fold(0u32, u32::saturating_add)
    }

    fn age(at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        (now - at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Check whether one more request fits in the current window.
    ///
    /// Purges expired entries but records nothing.
    pub fn can_admit(&self) -> bool {
        let now = self.clock.now();
        let mut window = self.lock_window();
        Self::purge(&mut window, now) < self.config.requests_per_minute
    }

    /// Record `count` requests at the current time without checking capacity.
    pub fn record(&self, count: u32) {
        let now = self.clock.now();
        self.lock_window().push_back(WindowEntry { at: now, count });
    }

    /// Suspend until a request may be sent, then record it.
    ///
    /// Check and record happen under one lock, so a caller is never admitted
    /// while the window is full. Returns the total time spent waiting.
    pub async fn await_admission(&self) -> Duration {
        let mut waited = Duration::ZERO;

        loop {
            let wait = {
                let now = self.clock.now();
                let mut window = self.lock_window();
                let in_window = Self::purge(&mut window, now);

                if in_window < self.config.requests_per_minute {
                    window.push_back(WindowEntry { at: now, count: 1 });
                    return waited;
                }

                match window.front() {
                    Some(oldest) => WINDOW.saturating_sub(Self::age(oldest.at, now)),
                    None => EMPTY_WINDOW_WAIT,
                }
            };

            let wait = wait.min(self.config.max_retry_delay).max(MIN_WAIT);
            debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting for admission");
            tokio::time::sleep(wait).await;
            waited += wait;
        }
    }

    /// Exponential backoff for retry `attempt` (starting at 1): the base delay
    /// doubled per attempt plus up to 10% jitter, capped at `max_retry_delay`.
    pub fn compute_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1).saturating_sub(1).min(32) as i32;
        let base_ms = self.config.retry_delay.as_secs_f64() * 1000.0 * 2f64.powi(exponent);
        let jitter_ms = base_ms * JITTER_FACTOR * rand::random::<f64>();
        let max_ms = self.config.max_retry_delay.as_secs_f64() * 1000.0;

        Duration::from_millis((base_ms + jitter_ms).min(max_ms) as u64)
    }

    /// Read-only view of the window after purging expired entries.
    pub fn status(&self) -> RateLimitStatus {
        let now = self.clock.now();
        let mut window = self.lock_window();
        let in_window = Self::purge(&mut window, now);

        let reset_time = match window.front() {
            Some(oldest) => {
                oldest.at + chrono::Duration::from_std(WINDOW).unwrap_or(chrono::Duration::zero())
            }
            None => now,
        };

        RateLimitStatus {
            requests_in_last_minute: in_window,
            remaining_requests: self.config.requests_per_minute.saturating_sub(in_window),
            requests_per_minute: self.config.requests_per_minute,
            reset_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClock;

    fn limiter(rpm: u32) -> (RateLimiter, MockClock) {
        let clock = MockClock::default();
        let config = RateLimitConfig {
            requests_per_minute: rpm,
            retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(5),
        };
        (RateLimiter::with_clock(config, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_admits_until_limit() {
        let (limiter, _clock) = limiter(3);

        for _ in 0..3 {
            assert!(limiter.can_admit());
            limiter.record(1);
        }
        assert!(!limiter.can_admit());
    }

    #[test]
    fn test_batched_record_counts() {
        let (limiter, _clock) = limiter(5);

        limiter.record(4);
        assert!(limiter.can_admit());
        limiter.record(1);
        assert!(!limiter.can_admit());
    }

    #[test]
    fn test_window_slides() {
        let (limiter, clock) = limiter(2);

        limiter.record(1);
        clock.advance(Duration::from_secs(30));
        limiter.record(1);
        assert!(!limiter.can_admit());

        // First entry ages out, second is still counted
        clock.advance(Duration::from_secs(30));
        assert!(limiter.can_admit());
        assert_eq!(limiter.status().requests_in_last_minute, 1);

        clock.advance(Duration::from_secs(30));
        assert_eq!(limiter.status().requests_in_last_minute, 0);
    }

    #[test]
    fn test_zero_limit_never_admits() {
        let (limiter, clock) = limiter(0);

        assert!(!limiter.can_admit());
        clock.advance(Duration::from_secs(600));
        assert!(!limiter.can_admit());

        let status = limiter.status();
        assert_eq!(status.remaining_requests, 0);
        assert_eq!(status.requests_in_last_minute, 0);
    }

    #[test]
    fn test_status_snapshot() {
        let (limiter, clock) = limiter(10);

        let empty = limiter.status();
        assert_eq!(empty.reset_time, clock.now());
        assert_eq!(empty.remaining_requests, 10);

        let first = clock.now();
        limiter.record(3);
        clock.advance(Duration::from_secs(10));
        limiter.record(1);

        let status = limiter.status();
        assert_eq!(status.requests_in_last_minute, 4);
        assert_eq!(status.remaining_requests, 6);
        assert_eq!(status.reset_time, first + chrono::Duration::seconds(60));
    }

    #[test]
    fn test_remaining_never_negative() {
        let (limiter, _clock) = limiter(2);
        limiter.record(5);

        assert_eq!(limiter.status().remaining_requests, 0);
    }

    #[test]
    fn test_backoff_growth_and_cap() {
        let (limiter, _clock) = limiter(10);

        let first = limiter.compute_backoff(1);
        assert!(first >= Duration::from_millis(100));
        assert!(first <= Duration::from_millis(110));

        let third = limiter.compute_backoff(3);
        assert!(third >= Duration::from_millis(400));
        assert!(third <= Duration::from_millis(440));

        for attempt in 1..40 {
            assert!(limiter.compute_backoff(attempt) <= Duration::from_secs(5));
        }
        assert_eq!(limiter.compute_backoff(30), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_attempt_zero_treated_as_first() {
        let (limiter, _clock) = limiter(10);
        assert!(limiter.compute_backoff(0) <= Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_admission_immediate() {
        let (limiter, _clock) = limiter(2);

        assert_eq!(limiter.await_admission().await, Duration::ZERO);
        assert_eq!(limiter.status().requests_in_last_minute, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_admission_waits_for_window() {
        let (limiter, clock) = limiter(1);
        let limiter = Arc::new(limiter);
        limiter.record(1);

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.await_admission().await })
        };

        // Let the waiter hit the full window and start sleeping
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        assert_eq!(limiter.status().requests_in_last_minute, 1);

        clock.advance(Duration::from_secs(61));
        let waited = tokio::time::timeout(Duration::from_secs(120), waiter)
            .await
            .unwrap()
            .unwrap();

        assert!(waited > Duration::ZERO);
        assert_eq!(limiter.status().requests_in_last_minute, 1);
    }
}
