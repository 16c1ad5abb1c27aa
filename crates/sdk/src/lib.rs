//! # Kitbridge SDK
//!
//! Rate-limited Rust client for the Kit (formerly ConvertKit) v4 API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kitbridge_sdk::{KitClient, KitResult, PageRequest};
//!
//! #[tokio::main]
//! async fn main() -> KitResult<()> {
//!     let client = KitClient::builder()
//!         .api_key("kit_your_api_key")
//!         .build()?;
//!
//!     let account = client.account().get().await?;
//!     println!("Account: {}", account.account.name);
//!
//!     let tags = client.tags().list(&PageRequest::sized(50)).await?;
//!     println!("Found {} tags", tags.items.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! Every request waits for admission from the client's [`RateLimiter`].
//! Share one limiter between clients with
//! [`KitClientBuilder::rate_limiter`].

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

// Re-export main client
pub use client::{KitClient, KitClientBuilder};
pub use config::{ClientConfig, RetryConfig, DEFAULT_BASE_URL};
pub use error::{ErrorResponse, KitResult};

// Re-export core types for convenience
pub use kitbridge_core::{
    types::{
        Account, AccountInfo, AccountUser, Broadcast, CustomField, DateRange, EmailStats, Form,
        GrowthStats, NewSubscriber, Page, PageRequest, Pagination, Sequence, Subscriber,
        SubscriberQuery, SubscriberState, Tag,
    },
    ApiError, MarketingApi, RateLimitConfig, RateLimiter,
};
