//! Sequences API endpoints.

use super::SubscribersPage;
use crate::client::KitClient;
use crate::error::KitResult;
use kitbridge_core::{Page, PageRequest, Pagination, Sequence, Subscriber};
use serde::Deserialize;

/// Sequences API.
pub struct SequencesApi<'a> {
    client: &'a KitClient,
}

impl<'a> SequencesApi<'a> {
    pub(crate) fn new(client: &'a KitClient) -> Self {
        Self { client }
    }

    /// List sequences.
    pub async fn list(&self, page: &PageRequest) -> KitResult<Page<Sequence>> {
        let response: ListSequencesResponse = self.client.http.get_with_query("sequences", page).await?;
        Ok(Page::new(response.sequences, response.pagination))
    }

    /// List subscribers enrolled in a sequence.
    pub async fn subscribers(&self, sequence_id: u64, page: &PageRequest) -> KitResult<Page<Subscriber>> {
        let response: SubscribersPage = self
            .client
            .http
            .get_with_query(&format!("sequences/{}/subscribers", sequence_id), page)
            .await?;
        Ok(response.into())
    }
}

#[derive(Debug, Deserialize)]
struct ListSequencesResponse {
    sequences: Vec<Sequence>,
    #[serde(default)]
    pagination: Pagination,
}
