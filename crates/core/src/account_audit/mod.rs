//! Account audit: fans out reads against the remote platform, tolerates
//! individual failures and scores whatever came back.
//!
//! # Flow
//!
//! 1. Derive the cache key from `account_audit` and the parameters; unless
//!    performance data was requested, serve a cached report.
//! 2. Check the client configuration. This is the only failure that aborts
//!    the audit.
//! 3. Issue eight independent reads concurrently and wait for all of them.
//!    A failed read leaves its section empty and is listed in
//!    `unavailable_sources`.
//! 4. Query subscriber counts for a bounded sample of tags (20), active
//!    sequences (10) and forms (10).
//! 5. Score, recommend, cache with the medium TTL and return.
//!
//! Dropping the future returned by [`AccountAudit::execute`] cancels the
//! outstanding reads at their next suspension point; reads already handed to
//! the transport still complete on the remote side.

mod report;
pub mod scoring;

pub use report::{
    AccountSummary, AuditReport, AutomationOverview, CustomFieldAnalysis, CustomFieldInsight,
    EmailPerformance, FormInsight, LeadCaptureAnalysis, Opportunity, SegmentationAnalysis,
    SequenceInsight, TagUsage, TrackingStatus,
};

use crate::api::{ApiError, ApiResult, MarketingApi};
use crate::cache::{ResponseCache, TtlStrategy};
use crate::clock::{Clock, SystemClock};
use crate::types::{
    AccountInfo, CustomField, DateRange, EmailStats, Form, GrowthStats, Page, PageRequest,
    Sequence, Subscriber, SubscriberQuery, SubscriberState, Tag,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CACHE_PREFIX: &str = "account_audit";

const PAGE_SIZE: u32 = 100;
const TAG_SAMPLE: usize = 20;
const SEQUENCE_SAMPLE: usize = 10;
const FORM_SAMPLE: usize = 10;
const SUMMARY_TAGS: usize = 10;
const ALL_STATES: &str = "all";

/// Options for an audit run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditParams {
    /// Include email open/click performance. Bypasses the cached report.
    #[serde(default)]
    pub include_performance: bool,
    /// Reporting window for growth figures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// List every analysed tag instead of the ten largest
    #[serde(default)]
    pub detailed_segments: bool,
}

/// Failure that prevented the audit from collecting any data
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Account audit failed: {0}")]
    Setup(#[source] ApiError),

    #[error("Account audit failed: invalid parameters: {0}")]
    Params(#[from] serde_json::Error),
}

/// Results of the top-level fan-out; `None` marks a failed read
#[derive(Debug, Default)]
struct AuditData {
    account: Option<AccountInfo>,
    email_stats: Option<EmailStats>,
    growth_stats: Option<GrowthStats>,
    subscribers: Option<Page<Subscriber>>,
    tags: Option<Page<Tag>>,
    sequences: Option<Page<Sequence>>,
    forms: Option<Page<Form>>,
    custom_fields: Option<Vec<CustomField>>,
}

impl AuditData {
    fn unavailable_sources(&self) -> Vec<String> {
        [
            ("account", self.account.is_none()),
            ("email_stats", self.email_stats.is_none()),
            ("growth_stats", self.growth_stats.is_none()),
            ("subscribers", self.subscribers.is_none()),
            ("tags", self.tags.is_none()),
            ("sequences", self.sequences.is_none()),
            ("forms", self.forms.is_none()),
            ("custom_fields", self.custom_fields.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(source, _)| source.to_string())
        .collect()
    }
}

/// Await a remote read, turning a failure into `None`.
async fn settle<T>(source: &str, call: impl Future<Output = ApiResult<T>>) -> Option<T> {
    match call.await {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(source, error = %error, "Audit read failed, continuing without it");
            None
        }
    }
}

/// Orchestrates an account audit over a [`MarketingApi`]
pub struct AccountAudit {
    api: Arc<dyn MarketingApi>,
    cache: Arc<ResponseCache>,
    clock: Arc<dyn Clock>,
}

impl AccountAudit {
    pub fn new(api: Arc<dyn MarketingApi>, cache: Arc<ResponseCache>) -> Self {
        Self::with_clock(api, cache, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(
        api: Arc<dyn MarketingApi>,
        cache: Arc<ResponseCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { api, cache, clock }
    }

    pub fn cache_key(params: &AuditParams) -> Result<String, AuditError> {
        let params = serde_json::to_value(params)?;
        Ok(ResponseCache::generate_key(CACHE_PREFIX, &params))
    }

    /// Produce an audit report.
    ///
    /// Only a configuration problem detected before any read is issued makes
    /// this fail; individual read failures degrade the report instead.
    pub async fn execute(&self, params: &AuditParams) -> Result<AuditReport, AuditError> {
        let key = Self::cache_key(params)?;

        if !params.include_performance {
            if let Some(cached) = self.cache.get(&key) {
                match serde_json::from_value::<AuditReport>(cached) {
                    Ok(report) => {
                        debug!(key = %key, "Serving account audit from cache");
                        return Ok(report);
                    }
                    Err(error) => {
                        warn!(key = %key, error = %error, "Discarding unreadable cached audit");
                    }
                }
            }
        }

        self.api.check_configuration().map_err(AuditError::Setup)?;

        info!(
            include_performance = params.include_performance,
            detailed_segments = params.detailed_segments,
            "Running account audit"
        );

        let data = self.collect(params).await;
        let report = self.build_report(params, data).await;

        match serde_json::to_value(&report) {
            Ok(value) => {
                self.cache.set_with_strategy(&key, value, TtlStrategy::Medium);
            }
            Err(error) => warn!(error = %error, "Could not cache account audit"),
        }

        info!(
            health_score = report.account_summary.health_score,
            unavailable = report.unavailable_sources.len(),
            "Account audit complete"
        );
        Ok(report)
    }

    async fn collect(&self, params: &AuditParams) -> AuditData {
        let page = PageRequest::sized(PAGE_SIZE).with_total_count();
        // The API lists only active subscribers unless asked for every state
        let subscriber_query = SubscriberQuery {
            page: page.clone(),
            status: Some(ALL_STATES.to_string()),
            ..Default::default()
        };
        let api = self.api.as_ref();

        let (
            account,
            email_stats,
            growth_stats,
            subscribers,
            tags,
            sequences,
            forms,
            custom_fields,
        ) = tokio::join!(
            settle("account", api.get_account()),
            settle("email_stats", api.get_email_stats()),
            settle("growth_stats", api.get_growth_stats(params.date_range)),
            settle("subscribers", api.list_subscribers(&subscriber_query)),
            settle("tags", api.list_tags(&page)),
            settle("sequences", api.list_sequences(&page)),
            settle("forms", api.list_forms(&page)),
            settle("custom_fields", api.list_custom_fields()),
        );

        AuditData {
            account,
            email_stats,
            growth_stats,
            subscribers,
            tags,
            sequences,
            forms,
            custom_fields,
        }
    }

    async fn build_report(&self, params: &AuditParams, data: AuditData) -> AuditReport {
        let unavailable_sources = data.unavailable_sources();

        let account_summary = Self::account_summary(params, &data);
        let (segmentation_analysis, automation_overview, lead_capture_analysis) = tokio::join!(
            self.segmentation(params, data.tags.as_ref()),
            self.automation(data.sequences.as_ref()),
            self.lead_capture(data.forms.as_ref()),
        );
        let custom_field_analysis = Self::custom_fields(data.custom_fields.as_deref().unwrap_or(&[]));

        let strategic_recommendations = scoring::strategic_recommendations(
            account_summary.health_score,
            segmentation_analysis.total_tags,
            automation_overview.active_sequences,
            lead_capture_analysis.total_forms,
        );

        AuditReport {
            generated_at: self.clock.now(),
            account_summary,
            segmentation_analysis,
            automation_overview,
            lead_capture_analysis,
            custom_field_analysis,
            strategic_recommendations,
            unavailable_sources,
        }
    }

    fn account_summary(params: &AuditParams, data: &AuditData) -> AccountSummary {
        let mut summary = AccountSummary::default();

        if let Some(info) = &data.account {
            summary.account_name = Some(info.account.name.clone());
            summary.plan_type = info.account.plan_type.clone();
            summary.primary_email = info
                .account
                .primary_email_address
                .clone()
                .or_else(|| info.user.as_ref().map(|u| u.email.clone()));
        }

        if let Some(page) = &data.subscribers {
            summary.total_subscribers = page.total();
            for subscriber in &page.items {
                match subscriber.state {
                    SubscriberState::Bounced => summary.bounced_subscribers += 1,
                    SubscriberState::Complained => summary.complained_subscribers += 1,
                    SubscriberState::Cancelled | SubscriberState::Inactive => {
                        summary.inactive_subscribers += 1
                    }
                    SubscriberState::Active | SubscriberState::Unknown => {}
                }
            }
            summary.active_subscribers = summary.total_subscribers.saturating_sub(
                summary.bounced_subscribers
                    + summary.complained_subscribers
                    + summary.inactive_subscribers,
            );
        }

        if let Some(growth) = &data.growth_stats {
            summary.new_subscribers = growth.new_subscribers;
            summary.net_new_subscribers = growth.net_new_subscribers;
            summary.growth_rate = scoring::growth_rate(growth);
        }

        summary.health_score = scoring::health_score(
            summary.total_subscribers,
            summary.active_subscribers,
            summary.bounced_subscribers,
            summary.complained_subscribers,
        );

        if params.include_performance {
            summary.performance = data.email_stats.as_ref().map(|stats| EmailPerformance {
                emails_sent: stats.sent,
                open_rate: scoring::rate(stats.opened, stats.sent),
                click_rate: scoring::rate(stats.clicked, stats.sent),
                open_tracking_enabled: stats.open_tracking_enabled,
                click_tracking_enabled: stats.click_tracking_enabled,
            });
        }

        summary
    }

    /// Subscriber count of each entity, queried concurrently. A failed query
    /// yields `None` for that entity only.
    async fn subscriber_counts<F, Fut>(&self, source: &str, ids: &[u64], query: F) -> Vec<Option<u64>>
    where
        F: Fn(u64, PageRequest) -> Fut,
        Fut: Future<Output = ApiResult<Page<Subscriber>>>,
    {
        let page = PageRequest::sized(1).with_total_count();
        join_all(ids.iter().map(|&id| {
            let call = query(id, page.clone());
            async move {
                let counted = settle(source, call).await.map(|page| page.total());
                debug!(source, id, subscriber_count = ?counted, "Counted subscribers");
                counted
            }
        }))
        .await
    }

    async fn segmentation(&self, params: &AuditParams, tags: Option<&Page<Tag>>) -> SegmentationAnalysis {
        let Some(tags) = tags else {
            return SegmentationAnalysis::default();
        };

        let sample: Vec<&Tag> = tags.items.iter().take(TAG_SAMPLE).collect();
        let ids: Vec<u64> = sample.iter().map(|t| t.id).collect();
        let api = self.api.as_ref();
        let counts = self
            .subscriber_counts("tag_subscribers", &ids, |id, page| async move {
                api.list_tag_subscribers(id, &page).await
            })
            .await;

        let now = self.clock.now();
        let mut distribution: Vec<TagUsage> = sample
            .iter()
            .zip(counts)
            .map(|(tag, subscriber_count)| TagUsage {
                tag_id: tag.id,
                name: tag.name.clone(),
                subscriber_count,
                usage_frequency: scoring::tag_usage_frequency(tag.created_at, now),
                created_at: tag.created_at,
            })
            .collect();

        if !params.detailed_segments {
            distribution.sort_by(|a, b| b.subscriber_count.cmp(&a.subscriber_count));
            distribution.truncate(SUMMARY_TAGS);
        }

        let (behavioral_tracking_status, behavioral_tags) = scoring::behavioral_tracking(&tags.items);

        SegmentationAnalysis {
            total_tags: tags.total(),
            tags_analyzed: sample.len(),
            tag_usage_distribution: distribution,
            behavioral_tracking_status,
            behavioral_tags,
        }
    }

    async fn automation(&self, sequences: Option<&Page<Sequence>>) -> AutomationOverview {
        let Some(sequences) = sequences else {
            return AutomationOverview::default();
        };

        let active: Vec<&Sequence> = sequences.items.iter().filter(|s| !s.hold).collect();
        let sample: Vec<&Sequence> = active.iter().take(SEQUENCE_SAMPLE).copied().collect();
        let ids: Vec<u64> = sample.iter().map(|s| s.id).collect();
        let api = self.api.as_ref();
        let counts = self
            .subscriber_counts("sequence_subscribers", &ids, |id, page| async move {
                api.list_sequence_subscribers(id, &page).await
            })
            .await;

        let sequence_performance = sample
            .iter()
            .zip(counts)
            .map(|(sequence, subscriber_count)| SequenceInsight {
                sequence_id: sequence.id,
                name: sequence.name.clone(),
                subscriber_count,
                hold: sequence.hold,
                repeat: sequence.repeat,
                optimization_score: scoring::sequence_optimization_score(sequence),
            })
            .collect();

        AutomationOverview {
            total_sequences: sequences.total(),
            active_sequences: active.len(),
            held_sequences: sequences.items.len() - active.len(),
            sequences_analyzed: sample.len(),
            sequence_performance,
        }
    }

    async fn lead_capture(&self, forms: Option<&Page<Form>>) -> LeadCaptureAnalysis {
        let Some(forms) = forms else {
            return LeadCaptureAnalysis::default();
        };

        let sample: Vec<&Form> = forms.items.iter().take(FORM_SAMPLE).collect();
        let ids: Vec<u64> = sample.iter().map(|f| f.id).collect();
        let api = self.api.as_ref();
        let counts = self
            .subscriber_counts("form_subscribers", &ids, |id, page| async move {
                api.list_form_subscribers(id, &page).await
            })
            .await;

        let form_performance = sample
            .iter()
            .zip(counts)
            .map(|(form, subscriber_count)| FormInsight {
                form_id: form.id,
                name: form.name.clone(),
                form_type: form.form_type.clone(),
                subscriber_count,
                conversion_rate: form.conversion_rate,
                subscriber_quality_score: scoring::subscriber_quality_score(form.conversion_rate),
            })
            .collect();

        LeadCaptureAnalysis {
            total_forms: forms.total(),
            forms_analyzed: sample.len(),
            form_performance,
        }
    }

    fn custom_fields(fields: &[CustomField]) -> CustomFieldAnalysis {
        let fields: Vec<CustomFieldInsight> = fields
            .iter()
            .map(|field| CustomFieldInsight {
                field_id: field.id,
                label: field.label.clone(),
                key: field.key.clone(),
                data_quality_score: scoring::data_quality_score(field),
                personalization_opportunity: scoring::personalization_opportunity(field),
            })
            .collect();

        CustomFieldAnalysis {
            total_fields: fields.len(),
            high_opportunity_fields: fields
                .iter()
                .filter(|f| f.personalization_opportunity == Opportunity::High)
                .count(),
            fields,
        }
    }
}
