//! Wall-clock abstraction shared by the rate limiter and the response cache.
//!
//! Production code uses [`SystemClock`]. Tests drive time explicitly through
//! `MockClock` (see [`crate::testing`], enabled with the `test-helpers`
//! feature or in test builds).

use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by `Utc::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
