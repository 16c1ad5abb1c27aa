use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Remote platform entities. These are read, never persisted or mutated here.

/// Response of `GET /account`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub user: Option<AccountUser>,
    pub account: Account,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountUser {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub primary_email_address: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate email delivery stats (`GET /account/email_stats`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailStats {
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub opened: u64,
    #[serde(default)]
    pub clicked: u64,
    #[serde(default)]
    pub email_stats_mode: Option<String>,
    #[serde(default)]
    pub open_tracking_enabled: bool,
    #[serde(default)]
    pub click_tracking_enabled: bool,
    #[serde(default)]
    pub starting: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ending: Option<DateTime<Utc>>,
}

/// Subscriber growth over a period (`GET /account/growth_stats`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthStats {
    #[serde(default)]
    pub cancellations: u64,
    #[serde(default)]
    pub net_new_subscribers: i64,
    #[serde(default)]
    pub new_subscribers: u64,
    #[serde(default)]
    pub subscribers: u64,
    #[serde(default)]
    pub starting: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ending: Option<DateTime<Utc>>,
}

/// Lifecycle state of a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberState {
    Active,
    Bounced,
    Cancelled,
    Complained,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl Default for SubscriberState {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: u64,
    #[serde(default)]
    pub first_name: Option<String>,
    pub email_address: String,
    #[serde(default)]
    pub state: SubscriberState,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: u64,
    pub name: String,
    /// Held sequences do not send
    #[serde(default)]
    pub hold: bool,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: u64,
    pub name: String,
    #[serde(default, rename = "type")]
    pub form_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub conversion_rate: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub label: String,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preview_text: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub send_at: Option<DateTime<Utc>>,
}

/// Cursor pagination block returned by every list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub start_cursor: Option<String>,
    #[serde(default)]
    pub end_cursor: Option<String>,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }

    /// Total count reported by the server, or the page length when the
    /// total was not requested.
    pub fn total(&self) -> u64 {
        self.pagination
            .total_count
            .unwrap_or(self.items.len() as u64)
    }
}

/// Cursor pagination parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default)]
    pub include_total_count: bool,
}

impl PageRequest {
    pub fn sized(per_page: u32) -> Self {
        Self {
            per_page: Some(per_page),
            ..Default::default()
        }
    }

    pub fn with_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }
}

/// Filters for `GET /subscribers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriberQuery {
    #[serde(flatten)]
    pub page: PageRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubscriber {
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SubscriberState>,
}

/// Inclusive reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_subscriber_state() {
        let subscriber: Subscriber = serde_json::from_value(serde_json::json!({
            "id": 1,
            "email_address": "a@example.com",
            "state": "frozen"
        }))
        .unwrap();
        assert_eq!(subscriber.state, SubscriberState::Unknown);
    }

    #[test]
    fn test_page_total_falls_back_to_len() {
        let page = Page::new(vec![1, 2, 3], Pagination::default());
        assert_eq!(page.total(), 3);

        let page = Page::new(
            vec![1],
            Pagination {
                total_count: Some(250),
                ..Default::default()
            },
        );
        assert_eq!(page.total(), 250);
    }

    #[test]
    fn test_form_type_rename() {
        let form: Form = serde_json::from_value(serde_json::json!({
            "id": 9,
            "name": "Landing",
            "type": "hosted",
            "archived": false
        }))
        .unwrap();
        assert_eq!(form.form_type.as_deref(), Some("hosted"));
        assert!(form.conversion_rate.is_none());
    }
}
