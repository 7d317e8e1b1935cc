//! Notification entity model.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::escalation::ChannelDeliveryResult;

use super::channel::DeliveryChannel;
use super::medical_type::MedicalType;
use super::payload::{Attachment, MedicalPayload};
use super::policy::EscalationLevelPolicy;
use super::privacy::PrivacySettings;
use super::status::NotificationStatus;
use super::target::TargetType;
use super::urgency::UrgencyLevel;

/// An urgent medical notification and its delivery/acknowledgment state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Optional team scope.
    pub team_id: Option<Uuid>,
    /// User who created the notification.
    pub created_by: Uuid,
    /// Severity.
    pub urgency_level: UrgencyLevel,
    /// Kind of medical event.
    pub medical_type: MedicalType,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Structured medical details.
    #[sqlx(json)]
    pub payload: MedicalPayload,
    /// How recipients are addressed.
    pub target_type: TargetType,
    /// Player, team or organization id for non-group targets.
    pub target_id: Option<Uuid>,
    /// Resolved recipients, including users added by escalation.
    pub recipient_ids: Vec<Uuid>,
    /// Channels the notification is delivered through.
    #[sqlx(json)]
    pub delivery_channels: Vec<DeliveryChannel>,
    /// Opaque per-channel configuration.
    pub channel_config: serde_json::Value,
    /// Outcome of the initial send, per channel.
    #[sqlx(json)]
    pub delivery_results: Vec<ChannelDeliveryResult>,
    /// Whether recipients must acknowledge.
    pub requires_acknowledgment: bool,
    /// Minutes after sending before level 1 fires.
    pub acknowledgment_timeout_minutes: Option<i32>,
    /// Users who must each acknowledge.
    pub required_acknowledgers: Vec<Uuid>,
    /// Minimum number of acknowledgments.
    pub min_acknowledgments_required: i32,
    /// Whether timers escalate the notification.
    pub enable_escalation: bool,
    /// Ordered escalation levels; entry 0 is level 1.
    #[sqlx(json)]
    pub escalation_policy: Vec<EscalationLevelPolicy>,
    /// Attached files.
    #[sqlx(json)]
    pub attachments: Vec<Attachment>,
    /// Access restrictions.
    #[sqlx(json)]
    pub privacy: PrivacySettings,
    /// Argon2 hash of the access PIN.
    #[serde(skip_serializing, default)]
    pub access_pin_hash: Option<String>,
    /// Lifecycle state.
    pub status: NotificationStatus,
    /// When a scheduled send is due.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When dispatch completed.
    pub sent_at: Option<DateTime<Utc>>,
    /// First acknowledgment time.
    pub first_acknowledged_at: Option<DateTime<Utc>>,
    /// When the acknowledgment policy was satisfied.
    pub fully_acknowledged_at: Option<DateTime<Utc>>,
    /// Most recent escalation time.
    pub escalated_at: Option<DateTime<Utc>>,
    /// When the notification was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved it.
    pub resolved_by: Option<Uuid>,
    /// Closing notes.
    pub resolution_notes: Option<String>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
    /// When the medical content was redacted.
    pub redacted_at: Option<DateTime<Utc>>,
    /// Number of recipients.
    pub total_recipients: i32,
    /// Number of distinct acknowledgers.
    pub acknowledged_count: i32,
    /// Highest escalation level applied; 0 before any escalation.
    pub escalation_level: i32,
    /// Optimistic concurrency counter.
    pub version: i32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Check if the notification is resolved or expired.
    pub fn is_final(&self) -> bool {
        self.status.is_final()
    }

    /// Check if a read or write at `now` should expire the notification.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status.can_expire() && now > self.expires_at
    }

    /// Check if the user is one of the recipients.
    pub fn is_recipient(&self, user_id: Uuid) -> bool {
        self.recipient_ids.contains(&user_id)
    }

    /// Check if the user is an explicitly required acknowledger.
    pub fn is_required_acknowledger(&self, user_id: Uuid) -> bool {
        self.required_acknowledgers.contains(&user_id)
    }

    /// Evaluate the fully-acknowledged predicate against the set of users
    /// that have an acknowledgment record.
    pub fn is_fully_acknowledged(&self, acknowledged_by: &HashSet<Uuid>) -> bool {
        let count = acknowledged_by.len() as i64;
        if count < i64::from(self.min_acknowledgments_required) {
            return false;
        }
        self.required_acknowledgers
            .iter()
            .all(|id| acknowledged_by.contains(id))
    }

    /// Number of configured escalation levels.
    pub fn escalation_level_count(&self) -> i32 {
        i32::try_from(self.escalation_policy.len()).unwrap_or(i32::MAX)
    }

    /// Policy for a 1-based escalation level.
    pub fn level_policy(&self, level: i32) -> Option<&EscalationLevelPolicy> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        self.escalation_policy.get(index)
    }

    /// How long to wait before firing `level`, measured from the send for
    /// level 1 and from the previous fire otherwise.
    ///
    /// Returns `None` when timer escalation to that level is not configured.
    pub fn delay_before_level(&self, level: i32) -> Option<Duration> {
        if !self.enable_escalation {
            return None;
        }
        let policy = self.level_policy(level)?;
        if level == 1 {
            let minutes = self.acknowledgment_timeout_minutes?;
            Some(Duration::minutes(i64::from(minutes)))
        } else {
            Some(Duration::minutes(policy.delay_minutes))
        }
    }

    /// Add users to the recipient set, returning how many were new.
    pub fn add_recipients(&mut self, users: &[Uuid]) -> i32 {
        let mut added = 0;
        for user in users {
            if !self.recipient_ids.contains(user) {
                self.recipient_ids.push(*user);
                added += 1;
            }
        }
        self.total_recipients += added;
        added
    }

    /// Whether the medical content has been redacted.
    pub fn is_redacted(&self) -> bool {
        self.redacted_at.is_some()
    }

    /// Time after which the content should be redacted, if configured.
    pub fn redaction_due_at(&self) -> Option<DateTime<Utc>> {
        let hours = self.privacy.auto_delete_after_hours?;
        let closed_at = match self.status {
            NotificationStatus::Resolved => self.resolved_at?,
            NotificationStatus::Expired => self.expires_at,
            _ => return None,
        };
        Some(closed_at + Duration::hours(hours))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::notification;
    use super::*;

    #[test]
    fn test_predicate_requires_each_required_acknowledger() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut n = notification();
        n.required_acknowledgers = vec![a, b];
        n.min_acknowledgments_required = 2;

        // Two acknowledgments, but not from the required pair.
        let acked: HashSet<Uuid> = [a, c].into_iter().collect();
        assert!(!n.is_fully_acknowledged(&acked));

        let acked: HashSet<Uuid> = [a, b].into_iter().collect();
        assert!(n.is_fully_acknowledged(&acked));
    }

    #[test]
    fn test_predicate_counts_minimum() {
        let mut n = notification();
        n.min_acknowledgments_required = 2;
        let acked: HashSet<Uuid> = [Uuid::new_v4()].into_iter().collect();
        assert!(!n.is_fully_acknowledged(&acked));
    }

    #[test]
    fn test_delay_before_level() {
        let mut n = notification();
        n.escalation_policy = vec![
            EscalationLevelPolicy {
                target_roles: vec!["coach".into()],
                ..Default::default()
            },
            EscalationLevelPolicy {
                delay_minutes: 30,
                target_roles: vec!["admin".into()],
                ..Default::default()
            },
        ];
        assert_eq!(n.delay_before_level(1), Some(Duration::minutes(15)));
        assert_eq!(n.delay_before_level(2), Some(Duration::minutes(30)));
        assert_eq!(n.delay_before_level(3), None);
        assert_eq!(n.delay_before_level(0), None);

        n.acknowledgment_timeout_minutes = None;
        assert_eq!(n.delay_before_level(1), None);

        n.enable_escalation = false;
        assert_eq!(n.delay_before_level(2), None);
    }

    #[test]
    fn test_add_recipients_grows_total_once() {
        let mut n = notification();
        let user = Uuid::new_v4();
        n.recipient_ids = vec![user];
        n.total_recipients = 1;
        let added = n.add_recipients(&[user, Uuid::new_v4()]);
        assert_eq!(added, 1);
        assert_eq!(n.total_recipients, 2);
    }

    #[test]
    fn test_expiry_skips_terminal_states() {
        let mut n = notification();
        let later = n.expires_at + Duration::seconds(1);
        assert!(n.is_past_expiry(later));
        n.status = NotificationStatus::Acknowledged;
        assert!(!n.is_past_expiry(later));
        n.status = NotificationStatus::Resolved;
        assert!(!n.is_past_expiry(later));
    }

    #[test]
    fn test_pin_hash_not_serialized() {
        let mut n = notification();
        n.access_pin_hash = Some("$argon2id$secret".into());
        let json = serde_json::to_value(&n).unwrap();
        assert!(json.get("access_pin_hash").is_none());
    }
}
