//! Subscribers API endpoints.

use super::SubscribersPage;
use crate::client::KitClient;
use crate::error::KitResult;
use kitbridge_core::{NewSubscriber, Page, Subscriber, SubscriberQuery};
use serde::Deserialize;

/// Subscribers API.
pub struct SubscribersApi<'a> {
    client: &'a KitClient,
}

impl<'a> SubscribersApi<'a> {
    pub(crate) fn new(client: &'a KitClient) -> Self {
        Self { client }
    }

    /// List subscribers matching `query`.
    pub async fn list(&self, query: &SubscriberQuery) -> KitResult<Page<Subscriber>> {
        let response: SubscribersPage = self.client.http.get_with_query("subscribers", query).await?;
        Ok(response.into())
    }

    /// Get a single subscriber.
    pub async fn get(&self, subscriber_id: u64) -> KitResult<Subscriber> {
        let response: SubscriberResponse = self
            .client
            .http
            .get(&format!("subscribers/{}", subscriber_id))
            .await?;
        Ok(response.subscriber)
    }

    /// Create a subscriber, or update the one with the same email address.
    pub async fn create(&self, subscriber: &NewSubscriber) -> KitResult<Subscriber> {
        let response: SubscriberResponse = self.client.http.post("subscribers", subscriber).await?;
        Ok(response.subscriber)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriberResponse {
    pub(crate) subscriber: Subscriber,
}
