//! Account API endpoints.

use crate::client::KitClient;
use crate::error::KitResult;
use kitbridge_core::{AccountInfo, DateRange, EmailStats, GrowthStats};
use serde::{Deserialize, Serialize};

/// Account API for the authenticated account and its statistics.
pub struct AccountApi<'a> {
    client: &'a KitClient,
}

impl<'a> AccountApi<'a> {
    pub(crate) fn new(client: &'a KitClient) -> Self {
        Self { client }
    }

    /// Get the current account and user.
    pub async fn get(&self) -> KitResult<AccountInfo> {
        self.client.http.get("account").await
    }

    /// Get email delivery stats for the last 90 days.
    pub async fn email_stats(&self) -> KitResult<EmailStats> {
        let response: StatsResponse<EmailStats> = self.client.http.get("account/email_stats").await?;
        Ok(response.stats)
    }

    /// Get subscriber growth, optionally restricted to a date range.
    pub async fn growth_stats(&self, range: Option<DateRange>) -> KitResult<GrowthStats> {
        let response: StatsResponse<GrowthStats> = match range {
            Some(range) => {
                self.client
                    .http
                    .get_with_query("account/growth_stats", &GrowthQuery::from(range))
                    .await?
            }
            None => self.client.http.get("account/growth_stats").await?,
        };
        Ok(response.stats)
    }
}

#[derive(Debug, Deserialize)]
struct StatsResponse<T> {
    stats: T,
}

#[derive(Debug, Serialize)]
struct GrowthQuery {
    starting: String,
    ending: String,
}

impl From<DateRange> for GrowthQuery {
    fn from(range: DateRange) -> Self {
        Self {
            starting: range.start.format("%Y-%m-%d").to_string(),
            ending: range.end.format("%Y-%m-%d").to_string(),
        }
    }
}
