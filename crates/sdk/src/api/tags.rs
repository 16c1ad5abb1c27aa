//! Tags API endpoints.

use super::subscribers::SubscriberResponse;
use super::SubscribersPage;
use crate::client::KitClient;
use crate::error::KitResult;
use kitbridge_core::{Page, PageRequest, Pagination, Subscriber, Tag};
use serde::{Deserialize, Serialize};

/// Tags API.
pub struct TagsApi<'a> {
    client: &'a KitClient,
}

impl<'a> TagsApi<'a> {
    pub(crate) fn new(client: &'a KitClient) -> Self {
        Self { client }
    }

    /// List tags.
    pub async fn list(&self, page: &PageRequest) -> KitResult<Page<Tag>> {
        let response: ListTagsResponse = self.client.http.get_with_query("tags", page).await?;
        Ok(Page::new(response.tags, response.pagination))
    }

    /// Create a tag.
    pub async fn create(&self, name: &str) -> KitResult<Tag> {
        let response: TagResponse = self.client.http.post("tags", &CreateTagRequest { name }).await?;
        Ok(response.tag)
    }

    /// Tag the subscriber with the given email address.
    pub async fn tag_subscriber(&self, tag_id: u64, email_address: &str) -> KitResult<Subscriber> {
        let response: SubscriberResponse = self
            .client
            .http
            .post(
                &format!("tags/{}/subscribers", tag_id),
                &TagSubscriberRequest { email_address },
            )
            .await?;
        Ok(response.subscriber)
    }

    /// List subscribers carrying a tag.
    pub async fn subscribers(&self, tag_id: u64, page: &PageRequest) -> KitResult<Page<Subscriber>> {
        let response: SubscribersPage = self
            .client
            .http
            .get_with_query(&format!("tags/{}/subscribers", tag_id), page)
            .await?;
        Ok(response.into())
    }
}

#[derive(Debug, Deserialize)]
struct ListTagsResponse {
    tags: Vec<Tag>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct TagResponse {
    tag: Tag,
}

#[derive(Debug, Serialize)]
struct CreateTagRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct TagSubscriberRequest<'a> {
    email_address: &'a str,
}
