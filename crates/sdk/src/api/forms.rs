//! Forms API endpoints.

use super::SubscribersPage;
use crate::client::KitClient;
use crate::error::KitResult;
use kitbridge_core::{Form, Page, PageRequest, Pagination, Subscriber};
use serde::Deserialize;

/// Forms and landing pages.
pub struct FormsApi<'a> {
    client: &'a KitClient,
}

impl<'a> FormsApi<'a> {
    pub(crate) fn new(client: &'a KitClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: &PageRequest) -> KitResult<Page<Form>> {
        let response: ListFormsResponse = self.client.http.get_with_query("forms", page).await?;
        Ok(Page::new(response.forms, response.pagination))
    }

    pub async fn subscribers(&self, form_id: u64, page: &PageRequest) -> KitResult<Page<Subscriber>> {
        let response: SubscribersPage = self
            .client
            .http
            .get_with_query(&format!("forms/{}/subscribers", form_id), page)
            .await?;
        Ok(response.into())
    }
}

#[derive(Debug, Deserialize)]
struct ListFormsResponse {
    forms: Vec<Form>,
    #[serde(default)]
    pagination: Pagination,
}
