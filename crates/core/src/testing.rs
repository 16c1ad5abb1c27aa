//! Test doubles for time and the remote platform.
//!
//! Only compiled for tests or with the `test-helpers` feature:
//!
//! ```toml
//! [dev-dependencies]
//! kitbridge-core = { path = "../core", features = ["test-helpers"] }
//! ```

use crate::api::{ApiError, ApiResult, MarketingApi};
use crate::clock::Clock;
use crate::types::{
    Account, AccountInfo, AccountUser, Broadcast, CustomField, DateRange, EmailStats, Form,
    GrowthStats, NewSubscriber, Page, PageRequest, Pagination, Sequence, Subscriber,
    SubscriberQuery, SubscriberState, Tag,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Clock whose time only moves when told to.
///
/// Clones share the same underlying instant.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let advanced = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|delta| current.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        *current = advanced;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Default for MockClock {
    /// Starts at 2024-06-01T00:00:00Z
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct MockData {
    account: AccountInfo,
    email_stats: EmailStats,
    growth_stats: GrowthStats,
    subscribers: Vec<Subscriber>,
    subscriber_total: Option<u64>,
    tags: Vec<Tag>,
    tag_counts: HashMap<u64, u64>,
    sequences: Vec<Sequence>,
    sequence_counts: HashMap<u64, u64>,
    forms: Vec<Form>,
    form_counts: HashMap<u64, u64>,
    broadcasts: Vec<Broadcast>,
    custom_fields: Vec<CustomField>,
}

/// In-memory [`MarketingApi`] with canned data, per-operation failure
/// injection and call counting.
///
/// Operations are named after the trait methods (`"get_account"`,
/// `"list_tags"`, ...).
#[derive(Debug)]
pub struct MockMarketingApi {
    data: Mutex<MockData>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    config_error: Option<ApiError>,
}

impl MockMarketingApi {
    pub fn new() -> Self {
        let account = AccountInfo {
            user: Some(AccountUser {
                email: "owner@example.com".to_string(),
            }),
            account: Account {
                id: 42,
                name: "Example Creator".to_string(),
                plan_type: Some("creator".to_string()),
                primary_email_address: Some("owner@example.com".to_string()),
                currency: Some("USD".to_string()),
                created_at: None,
            },
        };

        Self {
            data: Mutex::new(MockData {
                account,
                email_stats: EmailStats::default(),
                growth_stats: GrowthStats::default(),
                subscribers: Vec::new(),
                subscriber_total: None,
                tags: Vec::new(),
                tag_counts: HashMap::new(),
                sequences: Vec::new(),
                sequence_counts: HashMap::new(),
                forms: Vec::new(),
                form_counts: HashMap::new(),
                broadcasts: Vec::new(),
                custom_fields: Vec::new(),
            }),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(HashMap::new()),
            config_error: None,
        }
    }

    fn update(self, f: impl FnOnce(&mut MockData)) -> Self {
        f(&mut self.data.lock().unwrap_or_else(PoisonError::into_inner));
        self
    }

    pub fn with_email_stats(self, stats: EmailStats) -> Self {
        self.update(|d| d.email_stats = stats)
    }

    pub fn with_growth_stats(self, stats: GrowthStats) -> Self {
        self.update(|d| d.growth_stats = stats)
    }

    /// Subscribers returned by `list_subscribers`, with the reported total.
    pub fn with_subscribers(self, subscribers: Vec<Subscriber>, total: Option<u64>) -> Self {
        self.update(|d| {
            d.subscribers = subscribers;
            d.subscriber_total = total;
        })
    }

    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        self.update(|d| d.tags = tags)
    }

    pub fn with_tag_count(self, tag_id: u64, count: u64) -> Self {
        self.update(|d| {
            d.tag_counts.insert(tag_id, count);
        })
    }

    pub fn with_sequences(self, sequences: Vec<Sequence>) -> Self {
        self.update(|d| d.sequences = sequences)
    }

    pub fn with_sequence_count(self, sequence_id: u64, count: u64) -> Self {
        self.update(|d| {
            d.sequence_counts.insert(sequence_id, count);
        })
    }

    pub fn with_forms(self, forms: Vec<Form>) -> Self {
        self.update(|d| d.forms = forms)
    }

    pub fn with_form_count(self, form_id: u64, count: u64) -> Self {
        self.update(|d| {
            d.form_counts.insert(form_id, count);
        })
    }

    pub fn with_broadcasts(self, broadcasts: Vec<Broadcast>) -> Self {
        self.update(|d| d.broadcasts = broadcasts)
    }

    pub fn with_custom_fields(self, fields: Vec<CustomField>) -> Self {
        self.update(|d| d.custom_fields = fields)
    }

    /// Make `check_configuration` report `error`.
    pub fn with_config_error(mut self, error: ApiError) -> Self {
        self.config_error = Some(error);
        self
    }

    /// Make every call to `operation` fail with a server error.
    pub fn failing(self, operation: &str) -> Self {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation.to_string());
        self
    }

    /// Number of calls made to `operation`.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Number of calls made across every operation.
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    fn enter(&self, operation: &str) -> ApiResult<MockData> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation.to_string())
            .or_insert(0) += 1;

        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(operation)
        {
            return Err(ApiError::Server {
                status: 500,
                message: format!("{} failed", operation),
            });
        }

        Ok(self
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn count_page(count: Option<u64>) -> Page<Subscriber> {
        Page::new(
            Vec::new(),
            Pagination {
                total_count: Some(count.unwrap_or(0)),
                ..Default::default()
            },
        )
    }

    fn page_of<T: Clone>(items: &[T], page: &PageRequest, total: Option<u64>) -> Page<T> {
        let per_page = page.per_page.unwrap_or(50) as usize;
        let items: Vec<T> = items.iter().take(per_page).cloned().collect();
        let total_count = if page.include_total_count {
            Some(total.unwrap_or(items.len() as u64))
        } else {
            None
        };
        Page::new(
            items,
            Pagination {
                per_page: per_page as u32,
                total_count,
                ..Default::default()
            },
        )
    }
}

impl Default for MockMarketingApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MarketingApi for MockMarketingApi {
    fn check_configuration(&self) -> ApiResult<()> {
        match &self.config_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn get_account(&self) -> ApiResult<AccountInfo> {
        Ok(self.enter("get_account")?.account)
    }

    async fn get_email_stats(&self) -> ApiResult<EmailStats> {
        Ok(self.enter("get_email_stats")?.email_stats)
    }

    async fn get_growth_stats(&self, _range: Option<DateRange>) -> ApiResult<GrowthStats> {
        Ok(self.enter("get_growth_stats")?.growth_stats)
    }

    async fn list_subscribers(&self, query: &SubscriberQuery) -> ApiResult<Page<Subscriber>> {
        let data = self.enter("list_subscribers")?;
        // Like the API: active subscribers unless a status (or "all") is given
        let status = query.status.as_deref().unwrap_or("active");
        let matching: Vec<Subscriber> = data
            .subscribers
            .into_iter()
            .filter(|s| status == "all" || state_name(s.state) == status)
            .collect();
        Ok(Self::page_of(&matching, &query.page, data.subscriber_total))
    }

    async fn get_subscriber(&self, subscriber_id: u64) -> ApiResult<Subscriber> {
        self.enter("get_subscriber")?
            .subscribers
            .into_iter()
            .find(|s| s.id == subscriber_id)
            .ok_or_else(|| ApiError::NotFound(format!("subscriber {}", subscriber_id)))
    }

    async fn create_subscriber(&self, subscriber: &NewSubscriber) -> ApiResult<Subscriber> {
        let data = self.enter("create_subscriber")?;
        let created = Subscriber {
            id: data.subscribers.iter().map(|s| s.id).max().unwrap_or(0) + 1,
            first_name: subscriber.first_name.clone(),
            email_address: subscriber.email_address.clone(),
            state: subscriber.state.unwrap_or(SubscriberState::Active),
            created_at: None,
            fields: serde_json::Value::Null,
        };
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .push(created.clone());
        Ok(created)
    }

    async fn list_tags(&self, page: &PageRequest) -> ApiResult<Page<Tag>> {
        let data = self.enter("list_tags")?;
        Ok(Self::page_of(&data.tags, page, None))
    }

    async fn create_tag(&self, name: &str) -> ApiResult<Tag> {
        let data = self.enter("create_tag")?;
        let tag = Tag {
            id: data.tags.iter().map(|t| t.id).max().unwrap_or(0) + 1,
            name: name.to_string(),
            created_at: None,
        };
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tags
            .push(tag.clone());
        Ok(tag)
    }

    async fn tag_subscriber(&self, tag_id: u64, email_address: &str) -> ApiResult<Subscriber> {
        let data = self.enter("tag_subscriber")?;
        if !data.tags.iter().any(|t| t.id == tag_id) {
            return Err(ApiError::NotFound(format!("tag {}", tag_id)));
        }
        data.subscribers
            .into_iter()
            .find(|s| s.email_address == email_address)
            .ok_or_else(|| ApiError::NotFound(format!("subscriber {}", email_address)))
    }

    async fn list_tag_subscribers(
        &self,
        tag_id: u64,
        _page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>> {
        let data = self.enter("list_tag_subscribers")?;
        Ok(Self::count_page(data.tag_counts.get(&tag_id).copied()))
    }

    async fn list_sequences(&self, page: &PageRequest) -> ApiResult<Page<Sequence>> {
        let data = self.enter("list_sequences")?;
        Ok(Self::page_of(&data.sequences, page, None))
    }

    async fn list_sequence_subscribers(
        &self,
        sequence_id: u64,
        _page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>> {
        let data = self.enter("list_sequence_subscribers")?;
        Ok(Self::count_page(data.sequence_counts.get(&sequence_id).copied()))
    }

    async fn list_forms(&self, page: &PageRequest) -> ApiResult<Page<Form>> {
        let data = self.enter("list_forms")?;
        Ok(Self::page_of(&data.forms, page, None))
    }

    async fn list_form_subscribers(
        &self,
        form_id: u64,
        _page: &PageRequest,
    ) -> ApiResult<Page<Subscriber>> {
        let data = self.enter("list_form_subscribers")?;
        Ok(Self::count_page(data.form_counts.get(&form_id).copied()))
    }

    async fn list_broadcasts(&self, page: &PageRequest) -> ApiResult<Page<Broadcast>> {
        let data = self.enter("list_broadcasts")?;
        Ok(Self::page_of(&data.broadcasts, page, None))
    }

    async fn get_broadcast(&self, broadcast_id: u64) -> ApiResult<Broadcast> {
        self.enter("get_broadcast")?
            .broadcasts
            .into_iter()
            .find(|b| b.id == broadcast_id)
            .ok_or_else(|| ApiError::NotFound(format!("broadcast {}", broadcast_id)))
    }

    async fn list_custom_fields(&self) -> ApiResult<Vec<CustomField>> {
        Ok(self.enter("list_custom_fields")?.custom_fields)
    }
}

fn state_name(state: SubscriberState) -> &'static str {
    match state {
        SubscriberState::Active => "active",
        SubscriberState::Bounced => "bounced",
        SubscriberState::Cancelled => "cancelled",
        SubscriberState::Complained => "complained",
        SubscriberState::Inactive => "inactive",
        SubscriberState::Unknown => "unknown",
    }
}

/// Subscriber with the given id and state.
pub fn subscriber(id: u64, state: SubscriberState) -> Subscriber {
    Subscriber {
        id,
        first_name: None,
        email_address: format!("subscriber{}@example.com", id),
        state,
        created_at: None,
        fields: serde_json::Value::Null,
    }
}

pub fn tag(id: u64, name: &str, created_at: Option<DateTime<Utc>>) -> Tag {
    Tag {
        id,
        name: name.to_string(),
        created_at,
    }
}

pub fn sequence(id: u64, name: &str, hold: bool, repeat: bool) -> Sequence {
    Sequence {
        id,
        name: name.to_string(),
        hold,
        repeat,
        created_at: None,
    }
}

pub fn form(id: u64, name: &str, conversion_rate: Option<f64>) -> Form {
    Form {
        id,
        name: name.to_string(),
        form_type: Some("embed".to_string()),
        format: None,
        embed_url: None,
        archived: false,
        conversion_rate,
        created_at: None,
    }
}

pub fn custom_field(id: u64, label: &str, key: Option<&str>, field_type: Option<&str>) -> CustomField {
    CustomField {
        id,
        name: Some(label.to_string()),
        key: key.map(str::to_string),
        label: label.to_string(),
        field_type: field_type.map(str::to_string),
    }
}
