//! Main client for the Kit SDK.

use crate::api::*;
use crate::config::{ClientConfig, RetryConfig, DEFAULT_BASE_URL};
use crate::error::KitResult;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use kitbridge_core::{
    AccountInfo, ApiError, ApiResult, Broadcast, CustomField, DateRange, EmailStats, Form,
    GrowthStats, MarketingApi, NewSubscriber, Page, PageRequest, RateLimitConfig, RateLimiter,
    Sequence, Subscriber, SubscriberQuery, Tag,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Main client for interacting with the Kit API.
#[derive(Debug, Clone)]
pub struct KitClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl KitClient {
    /// Create a new client builder.
    pub fn builder() -> KitClientBuilder {
        KitClientBuilder::new()
    }

    /// Create a client from configuration.
    fn from_config(config: ClientConfig, limiter: Arc<RateLimiter>) -> KitResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone(), limiter)?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The limiter every request of this client passes through.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        self.http.limiter()
    }

    /// Get the account API.
    pub fn account(&self) -> AccountApi<'_> {
        AccountApi::new(self)
    }

    /// Get the subscribers API.
    pub fn subscribers(&self) -> SubscribersApi<'_> {
        SubscribersApi::new(self)
    }

    /// Get the tags API.
    pub fn tags(&self) -> TagsApi<'_> {
        TagsApi::new(self)
    }

    /// Get the sequences API.
    pub fn sequences(&self) -> SequencesApi<'_> {
        SequencesApi::new(self)
    }

    /// Get the forms API.
    pub fn forms(&self) -> FormsApi<'_> {
        FormsApi::new(self)
    }

    /// Get the broadcasts API.
    pub fn broadcasts(&self) -> BroadcastsApi<'_> {
        BroadcastsApi::new(self)
    }

    /// Get the custom fields API.
    pub fn custom_fields(&self) -> CustomFieldsApi<'_> {
        CustomFieldsApi::new(self)
    }
}

#[async_trait]
impl MarketingApi for KitClient {
    fn check_configuration(&self) -> ApiResult<()> {
        if self.config.has_credentials() {
            Ok(())
        } else {
            Err(ApiError::Config(
                "Kit API key or access token is not configured".to_string(),
            ))
        }
    }

    async fn get_account(&self) -> ApiResult<AccountInfo> {
        self.account().get().await
    }

    async fn get_email_stats(&self) -> ApiResult<EmailStats> {
        self.account().email_stats().await
    }

    async fn get_growth_stats(&self, range: Option<DateRange>) -> ApiResult<GrowthStats> {
        self.account().growth_stats(range).await
    }

    async fn list_subscribers(&self, query: &SubscriberQuery) -> ApiResult<Page<Subscriber>> {
        self.subscribers().list(query).await
    }

    async fn get_subscriber(&self, subscriber_id: u64) -> ApiResult<Subscriber> {
        self.subscribers().get(subscriber_id).await
    }

    async fn create_subscriber(&self, subscriber: &NewSubscriber) -> ApiResult<Subscriber> {
        self.subscribers().create(subscriber).await
    }

    async fn list_tags(&self, page: &PageRequest) -> ApiResult<Page<Tag>> {
        self.tags().list(page).await
    }

    async fn create_tag(&self, name: &str) -> ApiResult<Tag> {
        self.tags().create(name).await
    }

    async fn tag_subscriber(&self, tag_id: u64, email_address: &str) -> ApiResult<Subscriber> {
        self.tags().tag_subscriber(tag_id, email_address).await
    }

    async fn list_tag_subscribers(
        &self,
        tag_id: u64,
        page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>> {
        self.tags().subscribers(tag_id, page).await
    }

    async fn list_sequences(&self, page: &PageRequest) -> ApiResult<Page<Sequence>> {
        self.sequences().list(page).await
    }

    async fn list_sequence_subscribers(
        &self,
        sequence_id: u64,
        page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>> {
        self.sequences().subscribers(sequence_id, page).await
    }

    async fn list_forms(&self, page: &PageRequest) -> ApiResult<Page<Form>> {
        self.forms().list(page).await
    }

    async fn list_form_subscribers(
        &self,
        form_id: u64,
        page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>> {
        self.forms().subscribers(form_id, page).await
    }

    async fn list_broadcasts(&self, page: &PageRequest) -> ApiResult<Page<Broadcast>> {
        self.broadcasts().list(page).await
    }

    async fn get_broadcast(&self, broadcast_id: u64) -> ApiResult<Broadcast> {
        self.broadcasts().get(broadcast_id).await
    }

    async fn list_custom_fields(&self) -> ApiResult<Vec<CustomField>> {
        self.custom_fields().list().await
    }
}

/// Builder for creating a KitClient.
pub struct KitClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    access_token: Option<String>,
    timeout: Duration,
    retry_config: RetryConfig,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl KitClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            access_token: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            rate_limiter: None,
        }
    }

    /// Set the base URL. Defaults to the public Kit v4 endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set an OAuth access token for authentication.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Share an existing rate limiter. Without one the client gets a private
    /// limiter with default settings.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Build the client.
    ///
    /// Missing credentials are not an error here; they are reported by
    /// [`MarketingApi::check_configuration`].
    pub fn build(self) -> KitResult<KitClient> {
        let base_url_str = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(base_url_str)
            .map_err(|e| ApiError::Config(format!("Invalid base URL '{}': {}", base_url_str, e)))?;

        let mut config = ClientConfig::new(base_url);
        config.api_key = self.api_key;
        config.access_token = self.access_token;
        config.timeout = self.timeout;
        config.retry_config = self.retry_config;

        let limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::new(RateLimitConfig::default())));

        KitClient::from_config(config, limiter)
    }
}

impl Default for KitClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kitbridge_core::{AccountAudit, AuditParams, CacheConfig, ResponseCache, SubscriberState};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> KitClient {
        KitClient::builder()
            .base_url(server.uri())
            .api_key("kit_test_key")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = KitClient::builder().build().unwrap();

        assert_eq!(client.config().base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.rate_limiter().config().requests_per_minute, 120);
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = KitClient::builder().base_url("not a url").build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_check_configuration_requires_credentials() {
        let anonymous = KitClient::builder().build().unwrap();
        assert!(matches!(anonymous.check_configuration(), Err(ApiError::Config(_))));

        let keyed = KitClient::builder().api_key("kit_123").build().unwrap();
        assert!(keyed.check_configuration().is_ok());
    }

    #[test]
    fn test_shared_rate_limiter() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            requests_per_minute: 10,
            ..Default::default()
        }));
        let client = KitClient::builder().rate_limiter(limiter.clone()).build().unwrap();

        assert!(Arc::ptr_eq(client.rate_limiter(), &limiter));
    }

    #[tokio::test]
    async fn test_get_account() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/account"))
            .and(header("X-Kit-Api-Key", "kit_test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"email": "owner@example.com"},
                "account": {
                    "id": 5,
                    "name": "Acme Newsletter",
                    "plan_type": "creator",
                    "primary_email_address": "owner@example.com",
                    "created_at": "2023-02-17T11:43:55Z"
                }
            })))
            .mount(&server)
            .await;

        let account = client(&server).get_account().await.unwrap();
        assert_eq!(account.account.name, "Acme Newsletter");
        assert_eq!(account.user.unwrap().email, "owner@example.com");
    }

    #[tokio::test]
    async fn test_growth_stats_forwards_range() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/account/growth_stats"))
            .and(query_param("starting", "2024-01-01"))
            .and(query_param("ending", "2024-01-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stats": {
                    "cancellations": 3,
                    "net_new_subscribers": 17,
                    "new_subscribers": 20,
                    "subscribers": 517
                }
            })))
            .mount(&server)
            .await;

        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let stats = client(&server).get_growth_stats(Some(range)).await.unwrap();
        assert_eq!(stats.net_new_subscribers, 17);
        assert_eq!(stats.subscribers, 517);
    }

    #[tokio::test]
    async fn test_list_subscribers_with_total_count() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/subscribers"))
            .and(query_param("per_page", "100"))
            .and(query_param("include_total_count", "true"))
            .and(query_param("status", "active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscribers": [
                    {"id": 1, "first_name": "Ada", "email_address": "ada@example.com", "state": "active"},
                    {"id": 2, "email_address": "bob@example.com", "state": "bounced"}
                ],
                "pagination": {
                    "has_previous_page": false,
                    "has_next_page": true,
                    "start_cursor": "WzFd",
                    "end_cursor": "WzJd",
                    "per_page": 100,
                    "total_count": 250
                }
            })))
            .mount(&server)
            .await;

        let query = SubscriberQuery {
            page: PageRequest::sized(100).with_total_count(),
            status: Some("active".to_string()),
            email_address: None,
        };
        let page = client(&server).list_subscribers(&query).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].state, SubscriberState::Bounced);
        assert_eq!(page.total(), 250);
        assert_eq!(page.pagination.end_cursor.as_deref(), Some("WzJd"));
    }

    #[tokio::test]
    async fn test_audit_samples_every_subscriber_state() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/subscribers"))
            .and(query_param("status", "all"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscribers": [
                    {"id": 1, "email_address": "ada@example.com", "state": "active"},
                    {"id": 2, "email_address": "bob@example.com", "state": "bounced"}
                ],
                "pagination": {
                    "has_previous_page": false,
                    "has_next_page": false,
                    "per_page": 100,
                    "total_count": 2
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Every other read is unmatched and degrades to an empty section
        let audit = AccountAudit::new(
            Arc::new(client(&server)),
            Arc::new(ResponseCache::new(CacheConfig::default())),
        );
        let report = audit.execute(&AuditParams::default()).await.unwrap();

        assert_eq!(report.account_summary.total_subscribers, 2);
        assert_eq!(report.account_summary.bounced_subscribers, 1);
        // 100 * 0.5 - 50 * 0.5
        assert_eq!(report.account_summary.health_score, 25.0);
        assert!(report.strategic_recommendations[0].contains("re-engagement"));
        assert!(!report.unavailable_sources.contains(&"subscribers".to_string()));
    }

    #[tokio::test]
    async fn test_tag_subscriber_posts_email() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tags/7/subscribers"))
            .and(body_json(json!({"email_address": "ada@example.com"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "subscriber": {"id": 1, "email_address": "ada@example.com", "state": "active"}
            })))
            .mount(&server)
            .await;

        let subscriber = client(&server)
            .tag_subscriber(7, "ada@example.com")
            .await
            .unwrap();
        assert_eq!(subscriber.id, 1);
    }

    #[tokio::test]
    async fn test_create_subscriber_validation_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/subscribers"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"errors": ["Email address is invalid"]})),
            )
            .mount(&server)
            .await;

        let result = client(&server)
            .create_subscriber(&NewSubscriber {
                email_address: "nope".to_string(),
                first_name: None,
                state: None,
            })
            .await;
        assert_eq!(
            result.unwrap_err(),
            ApiError::Validation("Email address is invalid".to_string())
        );
    }

    #[tokio::test]
    async fn test_custom_fields_follow_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/custom_fields"))
            .and(query_param("after", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "custom_fields": [{"id": 2, "name": "ck_field_2_company", "key": "company", "label": "Company"}],
                "pagination": {"has_next_page": false, "per_page": 500}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/custom_fields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "custom_fields": [{"id": 1, "name": "ck_field_1_last_name", "key": "last_name", "label": "Last name"}],
                "pagination": {"has_next_page": true, "end_cursor": "c1", "per_page": 500}
            })))
            .mount(&server)
            .await;

        let fields = client(&server).list_custom_fields().await.unwrap();
        let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Last name", "Company"]);
    }

    #[tokio::test]
    async fn test_broadcast_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broadcasts/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": ["Not Found"]})))
            .mount(&server)
            .await;

        let result = client(&server).get_broadcast(99).await;
        assert_eq!(result.unwrap_err(), ApiError::NotFound("Not Found".to_string()));
    }
}
