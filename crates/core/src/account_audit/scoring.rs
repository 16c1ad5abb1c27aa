//! Pure scoring rules used to build an audit report.

use super::report::{Opportunity, TrackingStatus};
use crate::types::{CustomField, GrowthStats, Sequence, Tag};
use chrono::{DateTime, Utc};

/// Tag name fragments that indicate behaviour-based tagging
pub const BEHAVIORAL_KEYWORDS: [&str; 5] = ["clicked", "opened", "purchased", "engaged", "visited"];

pub const HEALTH_THRESHOLD: f64 = 70.0;
pub const MIN_TAGS: u64 = 5;
pub const MIN_ACTIVE_SEQUENCES: usize = 3;
pub const MIN_FORMS: u64 = 2;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `100 * active/total - 50 * (bounced + complained)/total`, clamped to
/// 0-100. A zero total counts as one.
pub fn health_score(total: u64, active: u64, bounced: u64, complained: u64) -> f64 {
    let total = total.max(1) as f64;
    let active_ratio = active as f64 / total;
    let negative_ratio = (bounced + complained) as f64 / total;

    round2((100.0 * active_ratio - 50.0 * negative_ratio).clamp(0.0, 100.0))
}

/// Net new subscribers relative to the base at the start of the period,
/// in percent.
pub fn growth_rate(stats: &GrowthStats) -> f64 {
    let starting_base = (stats.subscribers as i64 - stats.net_new_subscribers).max(1);
    round2(100.0 * stats.net_new_subscribers as f64 / starting_base as f64)
}

/// Percentage of `part` in `whole`, zero when `whole` is zero.
pub fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(100.0 * part as f64 / whole as f64)
    }
}

/// `1 / days since creation`, or 1 for a tag created today. Unknown
/// creation dates score 0.
pub fn tag_usage_frequency(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match created_at {
        Some(created_at) => {
            let days = (now - created_at).num_days();
            if days <= 0 {
                1.0
            } else {
                1.0 / days as f64
            }
        }
        None => 0.0,
    }
}

/// Classify how much behaviour-based tagging an account does, returning the
/// matching tag names.
pub fn behavioral_tracking(tags: &[Tag]) -> (TrackingStatus, Vec<String>) {
    let matching: Vec<String> = tags
        .iter()
        .filter(|tag| {
            let name = tag.name.to_lowercase();
            BEHAVIORAL_KEYWORDS.iter().any(|keyword| name.contains(keyword))
        })
        .map(|tag| tag.name.clone())
        .collect();

    let status = match matching.len() {
        n if n >= 5 => TrackingStatus::Advanced,
        n if n >= 2 => TrackingStatus::Basic,
        _ => TrackingStatus::None,
    };
    (status, matching)
}

pub fn sequence_optimization_score(sequence: &Sequence) -> u8 {
    let name = sequence.name.to_lowercase();
    let mut score: u32 = 50;

    if name.contains("welcome") {
        score += 10;
    }
    if name.contains("nurture") {
        score += 10;
    }
    if !sequence.hold {
        score += 20;
    }
    if sequence.repeat {
        score += 10;
    }
    score.min(100) as u8
}

/// `conversion_rate * 10` capped at 100, or 50 without a conversion rate.
pub fn subscriber_quality_score(conversion_rate: Option<f64>) -> f64 {
    match conversion_rate {
        Some(rate) => round2((rate * 10.0).clamp(0.0, 100.0)),
        None => 50.0,
    }
}

fn field_name(field: &CustomField) -> &str {
    field.name.as_deref().unwrap_or(&field.label)
}

pub fn data_quality_score(field: &CustomField) -> u8 {
    let mut score: u32 = 50;

    if field_name(field).chars().count() > 3 {
        score += 20;
    }
    if field.key.as_deref().is_some_and(|key| !key.trim().is_empty()) {
        score += 20;
    }
    if field.field_type.as_deref() == Some("text") {
        score += 10;
    }
    score.min(100) as u8
}

pub fn personalization_opportunity(field: &CustomField) -> Opportunity {
    let name = field_name(field).to_lowercase();

    if name.contains("name") {
        Opportunity::High
    } else if name.contains("location") || name.contains("state") {
        Opportunity::Medium
    } else if name.contains("specialty") || name.contains("industry") {
        Opportunity::High
    } else {
        Opportunity::Low
    }
}

/// Rule-based recommendations. The last two entries are always present.
pub fn strategic_recommendations(
    health_score: f64,
    total_tags: u64,
    active_sequences: usize,
    total_forms: u64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if health_score < HEALTH_THRESHOLD {
        recommendations.push(
            "Run a re-engagement campaign for inactive subscribers and clean bounced or complained addresses to raise list health".to_string(),
        );
    }
    if total_tags < MIN_TAGS {
        recommendations.push(
            "Expand segmentation: add tags for interests, lifecycle stage and engagement to target content more precisely".to_string(),
        );
    }
    if active_sequences < MIN_ACTIVE_SEQUENCES {
        recommendations.push(
            "Expand automation: build welcome, nurture and re-engagement sequences so subscribers receive timely follow-ups".to_string(),
        );
    }
    if total_forms < MIN_FORMS {
        recommendations.push(
            "Diversify lead capture: add forms or landing pages for different traffic sources and lead magnets".to_string(),
        );
    }

    recommendations.push(
        "Keep branding consistent across forms, landing pages and broadcasts to build recognition and trust".to_string(),
    );
    recommendations.push(
        "Track advanced segments (clicked, opened, purchased, engaged, visited) to personalise campaigns by behaviour".to_string(),
    );

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{custom_field, sequence, tag};
    use chrono::TimeZone;

    #[test]
    fn test_health_score() {
        assert_eq!(health_score(250, 250, 0, 0), 100.0);
        assert_eq!(health_score(100, 80, 10, 10), 70.0);
        // Negative components clamp at zero
        assert_eq!(health_score(10, 0, 5, 5), 0.0);
        // Zero total is treated as one
        assert_eq!(health_score(0, 0, 0, 0), 0.0);
    }

    #[test]
    fn test_growth_rate() {
        let stats = GrowthStats {
            subscribers: 110,
            net_new_subscribers: 10,
            ..Default::default()
        };
        assert_eq!(growth_rate(&stats), 10.0);
        assert_eq!(growth_rate(&GrowthStats::default()), 0.0);
    }

    #[test]
    fn test_tag_usage_frequency() {
        let now = Utc.with_ymd_and_hms(2024, 6, 11, 12, 0, 0).unwrap();

        assert_eq!(tag_usage_frequency(Some(now), now), 1.0);
        assert_eq!(
            tag_usage_frequency(Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()), now),
            0.1
        );
        assert_eq!(tag_usage_frequency(None, now), 0.0);
    }

    #[test]
    fn test_behavioral_tracking_levels() {
        let names = ["Clicked CTA", "opened-weekly", "Purchased", "engaged", "Visited Pricing"];
        let tags: Vec<Tag> = names
            .iter()
            .enumerate()
            .map(|(i, n)| tag(i as u64, n, None))
            .collect();

        assert_eq!(behavioral_tracking(&tags).0, TrackingStatus::Advanced);
        assert_eq!(behavioral_tracking(&tags[..2]).0, TrackingStatus::Basic);
        assert_eq!(behavioral_tracking(&tags[..1]).0, TrackingStatus::None);
        assert_eq!(behavioral_tracking(&[tag(9, "Newsletter", None)]).1.len(), 0);
    }

    #[test]
    fn test_sequence_optimization_score() {
        assert_eq!(sequence_optimization_score(&sequence(1, "Welcome Series", false, false)), 80);
        assert_eq!(sequence_optimization_score(&sequence(2, "Product launch", true, false)), 50);
        assert_eq!(
            sequence_optimization_score(&sequence(3, "Welcome nurture", false, true)),
            100
        );
    }

    #[test]
    fn test_subscriber_quality_score() {
        assert_eq!(subscriber_quality_score(None), 50.0);
        assert_eq!(subscriber_quality_score(Some(4.5)), 45.0);
        assert_eq!(subscriber_quality_score(Some(25.0)), 100.0);
    }

    #[test]
    fn test_custom_field_scores() {
        let first_name = custom_field(1, "First Name", Some("first_name"), Some("text"));
        assert_eq!(data_quality_score(&first_name), 100);
        assert_eq!(personalization_opportunity(&first_name), Opportunity::High);

        let state = custom_field(2, "State", None, None);
        assert_eq!(data_quality_score(&state), 70);
        assert_eq!(personalization_opportunity(&state), Opportunity::Medium);

        let industry = custom_field(3, "Industry", Some(" "), None);
        assert_eq!(data_quality_score(&industry), 70);
        assert_eq!(personalization_opportunity(&industry), Opportunity::High);

        let age = custom_field(4, "Age", Some("age"), None);
        assert_eq!(data_quality_score(&age), 70);
        assert_eq!(personalization_opportunity(&age), Opportunity::Low);
    }

    #[test]
    fn test_recommendation_thresholds() {
        let healthy = strategic_recommendations(90.0, 10, 5, 4);
        assert_eq!(healthy.len(), 2);
        assert!(healthy[0].contains("branding"));

        let struggling = strategic_recommendations(40.0, 2, 1, 1);
        assert_eq!(struggling.len(), 6);
        assert!(struggling[0].contains("re-engagement"));
        assert!(struggling[1].contains("segmentation"));
        assert!(struggling[2].contains("automation"));
        assert!(struggling[3].contains("lead capture"));
    }
}
