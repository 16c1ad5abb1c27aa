//! Per-resource API groups, borrowed from a [`KitClient`](crate::KitClient).

mod account;
mod broadcasts;
mod custom_fields;
mod forms;
mod sequences;
mod subscribers;
mod tags;

pub use account::AccountApi;
pub use broadcasts::BroadcastsApi;
pub use custom_fields::CustomFieldsApi;
pub use forms::FormsApi;
pub use sequences::SequencesApi;
pub use subscribers::SubscribersApi;
pub use tags::TagsApi;

use kitbridge_core::{Page, Pagination, Subscriber};
use serde::Deserialize;

/// `{"subscribers": [...], "pagination": {...}}`, shared by every
/// `*/subscribers` listing.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscribersPage {
    subscribers: Vec<Subscriber>,
    #[serde(default)]
    pagination: Pagination,
}

impl From<SubscribersPage> for Page<Subscriber> {
    fn from(response: SubscribersPage) -> Self {
        Page::new(response.subscribers, response.pagination)
    }
}
