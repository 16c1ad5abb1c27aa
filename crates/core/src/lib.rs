// Core types and functionality for Kitbridge

pub mod account_audit;
pub mod api;
pub mod cache;
pub mod clock;
pub mod rate_limit;
pub mod types;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use account_audit::{AccountAudit, AuditError, AuditParams, AuditReport};
pub use api::{ApiError, ApiResult, MarketingApi};
pub use cache::{CacheConfig, CacheStats, ResponseCache, TtlStrategy};
pub use clock::{Clock, SystemClock};
pub use rate_limit::{RateLimitConfig, RateLimitStatus, RateLimiter};
pub use types::*;
