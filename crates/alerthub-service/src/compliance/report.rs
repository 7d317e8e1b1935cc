//! Compliance report aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use alerthub_core::config::compliance::ComplianceConfig;
use alerthub_entity::acknowledgment::Acknowledgment;
use alerthub_entity::escalation::Escalation;
use alerthub_entity::notification::Notification;

/// Aggregated compliance figures for one organization and window.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    /// Organization reported on.
    pub organization_id: Uuid,
    /// Window start, inclusive.
    pub start: DateTime<Utc>,
    /// Window end, exclusive.
    pub end: DateTime<Utc>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Notifications created in the window.
    pub total_notifications: u64,
    /// Counts per urgency level.
    pub by_urgency: BTreeMap<String, u64>,
    /// Counts per medical type.
    pub by_medical_type: BTreeMap<String, u64>,
    /// Counts per current status.
    pub by_status: BTreeMap<String, u64>,
    /// Acknowledgments of those notifications.
    pub total_acknowledgments: u64,
    /// Mean acknowledgment response time in seconds.
    pub average_response_time_seconds: Option<f64>,
    /// Share of notifications that reached `acknowledged`, 0.0-1.0.
    pub acknowledgment_rate: f64,
    /// Escalations of those notifications.
    pub total_escalations: u64,
    /// Escalation counts per reason.
    pub escalations_by_reason: BTreeMap<String, u64>,
    /// Suggested improvements.
    pub recommendations: Vec<String>,
}

impl ComplianceReport {
    /// Aggregate the records of one window.
    pub fn build(
        organization_id: Uuid,
        (start, end): (DateTime<Utc>, DateTime<Utc>),
        generated_at: DateTime<Utc>,
        notifications: &[Notification],
        acknowledgments: &[Acknowledgment],
        escalations: &[Escalation],
        thresholds: &ComplianceConfig,
    ) -> Self {
        let mut by_urgency = BTreeMap::new();
        let mut by_medical_type = BTreeMap::new();
        let mut by_status = BTreeMap::new();
        let mut acknowledged = 0u64;
        for n in notifications {
            *by_urgency.entry(n.urgency_level.to_string()).or_insert(0) += 1;
            *by_medical_type.entry(n.medical_type.to_string()).or_insert(0) += 1;
            *by_status.entry(n.status.to_string()).or_insert(0) += 1;
            if n.fully_acknowledged_at.is_some() {
                acknowledged += 1;
            }
        }

        let response_times: Vec<i64> = acknowledgments
            .iter()
            .filter_map(|a| a.response_time_seconds)
            .collect();
        let average_response_time_seconds = if response_times.is_empty() {
            None
        } else {
            Some(response_times.iter().sum::<i64>() as f64 / response_times.len() as f64)
        };

        let mut escalations_by_reason = BTreeMap::new();
        for e in escalations {
            *escalations_by_reason.entry(e.reason.to_string()).or_insert(0) += 1;
        }

        let total = notifications.len() as u64;
        let acknowledgment_rate = if total == 0 {
            0.0
        } else {
            acknowledged as f64 / total as f64
        };

        let mut report = Self {
            organization_id,
            start,
            end,
            generated_at,
            total_notifications: total,
            by_urgency,
            by_medical_type,
            by_status,
            total_acknowledgments: acknowledgments.len() as u64,
            average_response_time_seconds,
            acknowledgment_rate,
            total_escalations: escalations.len() as u64,
            escalations_by_reason,
            recommendations: Vec::new(),
        };
        report.recommendations = report.recommend(thresholds);
        report
    }

    fn recommend(&self, thresholds: &ComplianceConfig) -> Vec<String> {
        let mut out = Vec::new();
        if self.total_notifications == 0 {
            return out;
        }
        if let Some(average) = self.average_response_time_seconds
            && average > thresholds.max_average_response_seconds
        {
            out.push(format!(
                "Average response time is {average:.0}s, above the {:.0}s target. Review on-call coverage and notification channels.",
                thresholds.max_average_response_seconds
            ));
        }
        if self.acknowledgment_rate < thresholds.min_acknowledgment_rate {
            out.push(format!(
                "Only {:.0}% of notifications were fully acknowledged (target {:.0}%). Check recipient lists and acknowledgment requirements.",
                self.acknowledgment_rate * 100.0,
                thresholds.min_acknowledgment_rate * 100.0
            ));
        }
        let ratio = self.total_escalations as f64 / self.total_notifications as f64;
        if ratio > thresholds.max_escalation_ratio {
            out.push(format!(
                "{:.0}% escalation ratio exceeds {:.0}%. Consider longer acknowledgment timeouts or better targeted first recipients.",
                ratio * 100.0,
                thresholds.max_escalation_ratio * 100.0
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerthub_entity::escalation::{EscalationReason, EscalationStatus};
    use alerthub_entity::notification::NotificationStatus;
    use chrono::Duration;

    use crate::testing::{acknowledgment, notification};

    fn escalation(notification_id: Uuid, reason: EscalationReason) -> Escalation {
        Escalation {
            id: Uuid::new_v4(),
            notification_id,
            level: 1,
            reason,
            target_user_ids: vec![],
            target_roles: vec![],
            emergency_contacts: vec![],
            channels: vec![],
            message: "escalated".into(),
            delivery_results: vec![],
            triggered_by: None,
            status: EscalationStatus::Completed,
            created_at: Utc::now(),
            completed_at: None,
            dispatch_claimed_at: None,
        }
    }

    #[test]
    fn test_aggregates_counts_and_rates() {
        let now = Utc::now();
        let org = Uuid::new_v4();
        let mut acked = notification(org);
        acked.status = NotificationStatus::Acknowledged;
        acked.fully_acknowledged_at = Some(now);
        let mut escalated = notification(org);
        escalated.status = NotificationStatus::Escalated;

        let report = ComplianceReport::build(
            org,
            (now - Duration::days(1), now),
            now,
            &[acked.clone(), escalated.clone()],
            &[acknowledgment(acked.id, Some(100)), acknowledgment(escalated.id, Some(500))],
            &[escalation(escalated.id, EscalationReason::NoAcknowledgment)],
            &ComplianceConfig::default(),
        );

        assert_eq!(report.total_notifications, 2);
        assert_eq!(report.by_status.get("acknowledged"), Some(&1));
        assert_eq!(report.by_status.get("escalated"), Some(&1));
        assert_eq!(report.by_urgency.get("critical"), Some(&2));
        assert_eq!(report.average_response_time_seconds, Some(300.0));
        assert_eq!(report.acknowledgment_rate, 0.5);
        assert_eq!(report.escalations_by_reason.get("no_acknowledgment"), Some(&1));
        // 50% rate and 50% escalation ratio; 300s is not above the target.
        assert_eq!(report.recommendations.len(), 2);
    }

    #[test]
    fn test_empty_window_has_no_recommendations() {
        let now = Utc::now();
        let report = ComplianceReport::build(
            Uuid::new_v4(),
            (now - Duration::days(1), now),
            now,
            &[],
            &[],
            &[],
            &ComplianceConfig::default(),
        );
        assert_eq!(report.total_notifications, 0);
        assert_eq!(report.acknowledgment_rate, 0.0);
        assert!(report.average_response_time_seconds.is_none());
        assert!(report.recommendations.is_empty());
    }
}
