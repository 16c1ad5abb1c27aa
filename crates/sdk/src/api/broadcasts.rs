//! Broadcasts API endpoints.

use crate::client::KitClient;
use crate::error::KitResult;
use kitbridge_core::{Broadcast, Page, PageRequest, Pagination};
use serde::Deserialize;

/// Broadcasts API.
pub struct BroadcastsApi<'a> {
    client: &'a KitClient,
}

impl<'a> BroadcastsApi<'a> {
    pub(crate) fn new(client: &'a KitClient) -> Self {
        Self { client }
    }

    /// List broadcasts.
    pub async fn list(&self, page: &PageRequest) -> KitResult<Page<Broadcast>> {
        let response: ListBroadcastsResponse = self.client.http.get_with_query("broadcasts", page).await?;
        Ok(Page::new(response.broadcasts, response.pagination))
    }

    /// Get a specific broadcast.
    pub async fn get(&self, broadcast_id: u64) -> KitResult<Broadcast> {
        let response: BroadcastResponse = self
            .client
            .http
            .get(&format!("broadcasts/{}", broadcast_id))
            .await?;
        Ok(response.broadcast)
    }
}

#[derive(Debug, Deserialize)]
struct ListBroadcastsResponse {
    broadcasts: Vec<Broadcast>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct BroadcastResponse {
    broadcast: Broadcast,
}
