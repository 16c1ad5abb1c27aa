use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time audit of an account. Built once per audit run and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub account_summary: AccountSummary,
    pub segmentation_analysis: SegmentationAnalysis,
    pub automation_overview: AutomationOverview,
    pub lead_capture_analysis: LeadCaptureAnalysis,
    pub custom_field_analysis: CustomFieldAnalysis,
    pub strategic_recommendations: Vec<String>,
    /// Remote reads that failed; their sections hold zeroed defaults
    pub unavailable_sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_name: Option<String>,
    pub plan_type: Option<String>,
    pub primary_email: Option<String>,
    pub total_subscribers: u64,
    pub active_subscribers: u64,
    pub bounced_subscribers: u64,
    pub complained_subscribers: u64,
    pub inactive_subscribers: u64,
    pub new_subscribers: u64,
    pub net_new_subscribers: i64,
    /// Net growth over the reporting period, in percent
    pub growth_rate: f64,
    /// 0-100
    pub health_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<EmailPerformance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailPerformance {
    pub emails_sent: u64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub open_tracking_enabled: bool,
    pub click_tracking_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentationAnalysis {
    pub total_tags: u64,
    pub tags_analyzed: usize,
    pub tag_usage_distribution: Vec<TagUsage>,
    pub behavioral_tracking_status: TrackingStatus,
    pub behavioral_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagUsage {
    pub tag_id: u64,
    pub name: String,
    /// Absent when the per-tag read failed
    pub subscriber_count: Option<u64>,
    pub usage_frequency: f64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingStatus {
    Advanced,
    Basic,
    #[default]
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutomationOverview {
    pub total_sequences: u64,
    pub active_sequences: usize,
    pub held_sequences: usize,
    pub sequences_analyzed: usize,
    pub sequence_performance: Vec<SequenceInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceInsight {
    pub sequence_id: u64,
    pub name: String,
    pub subscriber_count: Option<u64>,
    pub hold: bool,
    pub repeat: bool,
    /// 0-100
    pub optimization_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadCaptureAnalysis {
    pub total_forms: u64,
    pub forms_analyzed: usize,
    pub form_performance: Vec<FormInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInsight {
    pub form_id: u64,
    pub name: String,
    pub form_type: Option<String>,
    pub subscriber_count: Option<u64>,
    pub conversion_rate: Option<f64>,
    /// 0-100
    pub subscriber_quality_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldAnalysis {
    pub total_fields: usize,
    pub high_opportunity_fields: usize,
    pub fields: Vec<CustomFieldInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldInsight {
    pub field_id: u64,
    pub label: String,
    pub key: Option<String>,
    /// 0-100
    pub data_quality_score: u8,
    pub personalization_opportunity: Opportunity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opportunity {
    High,
    Medium,
    Low,
}
