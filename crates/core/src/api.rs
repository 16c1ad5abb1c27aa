//! Capability surface of the remote email-marketing platform.
//!
//! The audit aggregator and the tool layer only ever talk to
//! [`MarketingApi`]; the HTTP implementation lives in `kitbridge-sdk`.

use crate::types::{
    AccountInfo, Broadcast, CustomField, DateRange, EmailStats, Form, GrowthStats, NewSubscriber,
    Page, PageRequest, Sequence, Subscriber, SubscriberQuery, Tag,
};

/// Result type for remote calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Classified failure of a remote call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Credentials missing or rejected (401)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Credentials valid but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Request body rejected as too large (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Request understood but invalid (422)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("API error (status {status}): {message}")]
    Unexpected { status: u16, message: String },

    /// Connection, DNS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not be built
    #[error("Request error: {0}")]
    Request(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Check if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network(_) => true,
            _ => false,
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Authentication(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            413 => Self::PayloadTooLarge(message),
            422 => Self::Validation(message),
            429 => Self::RateLimited { retry_after_secs },
            500..=599 => Self::Server { status, message },
            _ => Self::Unexpected { status, message },
        }
    }
}

/// Remote marketing-platform client capability
#[async_trait::async_trait]
pub trait MarketingApi: Send + Sync {
    /// Verify the client is usable before any request is issued.
    fn check_configuration(&self) -> ApiResult<()> {
        Ok(())
    }

    async fn get_account(&self) -> ApiResult<AccountInfo>;

    async fn get_email_stats(&self) -> ApiResult<EmailStats>;

    async fn get_growth_stats(&self, range: Option<DateRange>) -> ApiResult<GrowthStats>;

    async fn list_subscribers(&self, query: &SubscriberQuery) -> ApiResult<Page<Subscriber>>;

    async fn get_subscriber(&self, subscriber_id: u64) -> ApiResult<Subscriber>;

    async fn create_subscriber(&self, subscriber: &NewSubscriber) -> ApiResult<Subscriber>;

    async fn list_tags(&self, page: &PageRequest) -> ApiResult<Page<Tag>>;

    async fn create_tag(&self, name: &str) -> ApiResult<Tag>;

    async fn tag_subscriber(&self, tag_id: u64, email_address: &str) -> ApiResult<Subscriber>;

    async fn list_tag_subscribers(
        &self,
        tag_id: u64,
        page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>>;

    async fn list_sequences(&self, page: &PageRequest) -> ApiResult<Page<Sequence>>;

    async fn list_sequence_subscribers(
        &self,
        sequence_id: u64,
        page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>>;

    async fn list_forms(&self, page: &PageRequest) -> ApiResult<Page<Form>>;

    async fn list_form_subscribers(
        &self,
        form_id: u64,
        page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>>;

    async fn list_broadcasts(&self, page: &PageRequest) -> ApiResult<Page<Broadcast>>;

    async fn get_broadcast(&self, broadcast_id: u64) -> ApiResult<Broadcast>;

    async fn list_custom_fields(&self) -> ApiResult<Vec<CustomField>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(ApiError::from_status(401, "x", None), ApiError::Authentication(_)));
        assert!(matches!(ApiError::from_status(403, "x", None), ApiError::Forbidden(_)));
        assert!(matches!(ApiError::from_status(404, "x", None), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(413, "x", None), ApiError::PayloadTooLarge(_)));
        assert!(matches!(ApiError::from_status(422, "x", None), ApiError::Validation(_)));
        assert_eq!(
            ApiError::from_status(429, "slow down", Some(7)),
            ApiError::RateLimited {
                retry_after_secs: Some(7)
            }
        );
        assert!(matches!(
            ApiError::from_status(503, "x", None),
            ApiError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ApiError::from_status(418, "x", None),
            ApiError::Unexpected { status: 418, .. }
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(ApiError::Network("reset".into()).is_retryable());
        assert!(ApiError::RateLimited { retry_after_secs: None }.is_retryable());
        assert!(!ApiError::Authentication("bad key".into()).is_retryable());
        assert!(!ApiError::Validation("email".into()).is_retryable());
    }
}
