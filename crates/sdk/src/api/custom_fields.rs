//! Custom fields API endpoints.

use crate::client::KitClient;
use crate::error::KitResult;
use kitbridge_core::{CustomField, PageRequest, Pagination};
use serde::Deserialize;
use tracing::warn;

/// Upper bound on pages followed when listing every custom field
const MAX_PAGES: usize = 10;
const PAGE_SIZE: u32 = 500;

/// Custom fields API.
pub struct CustomFieldsApi<'a> {
    client: &'a KitClient,
}

impl<'a> CustomFieldsApi<'a> {
    pub(crate) fn new(client: &'a KitClient) -> Self {
        Self { client }
    }

    /// List every custom field, following pagination cursors.
    pub async fn list(&self) -> KitResult<Vec<CustomField>> {
        let mut fields = Vec::new();
        let mut page = PageRequest::sized(PAGE_SIZE);

        for _ in 0..MAX_PAGES {
            let response: ListCustomFieldsResponse =
                self.client.http.get_with_query("custom_fields", &page).await?;
            fields.extend(response.custom_fields);

            match response.pagination.end_cursor {
                Some(cursor) if response.pagination.has_next_page => page.after = Some(cursor),
                _ => return Ok(fields),
            }
        }

        warn!(fetched = fields.len(), "Stopped following custom field pages");
        Ok(fields)
    }
}

#[derive(Debug, Deserialize)]
struct ListCustomFieldsResponse {
    custom_fields: Vec<CustomField>,
    #[serde(default)]
    pagination: Pagination,
}
