//! Escalation message templates.

use alerthub_entity::escalation::EscalationReason;
use alerthub_entity::notification::Notification;

/// Title used for an escalation message.
pub fn escalation_title(notification: &Notification, level: i32) -> String {
    format!("[ESCALATED L{level}] {}", notification.title)
}

/// Body used when neither the caller nor the level policy supplies one.
pub fn template(
    reason: EscalationReason,
    notification: &Notification,
    level: i32,
    acknowledged: usize,
) -> String {
    let title = &notification.title;
    let body = &notification.message;
    match reason {
        EscalationReason::NoAcknowledgment => format!(
            "Escalation level {level}: nobody has acknowledged \"{title}\". Original message: {body}"
        ),
        EscalationReason::InsufficientAcknowledgments => format!(
            "Escalation level {level}: \"{title}\" has {acknowledged} of {} required acknowledgments. \
             Original message: {body}",
            notification
                .min_acknowledgments_required
                .max(i32::try_from(notification.required_acknowledgers.len()).unwrap_or(i32::MAX))
        ),
        EscalationReason::Timeout => format!(
            "Escalation level {level}: \"{title}\" is still open after its response window. \
             Original message: {body}"
        ),
        EscalationReason::Manual => format!(
            "Escalation level {level}: \"{title}\" was escalated by medical staff. \
             Original message: {body}"
        ),
        EscalationReason::SystemError => format!(
            "Escalation level {level}: \"{title}\" is being re-sent after a delivery problem. \
             Original message: {body}"
        ),
    }
}
