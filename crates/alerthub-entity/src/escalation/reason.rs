//! Escalation reason enumeration.

use serde::{Deserialize, Serialize};

use crate::vocabulary;

/// Why an escalation fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "escalation_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// Nobody acknowledged before the timeout.
    NoAcknowledgment,
    /// Some acknowledged, but the policy is not satisfied.
    InsufficientAcknowledgments,
    /// The timeout passed on a notification that needs no acknowledgment.
    Timeout,
    /// Triggered by a person.
    Manual,
    /// Triggered after an internal failure.
    SystemError,
}

vocabulary!(EscalationReason, "escalation reason", {
    NoAcknowledgment => "no_acknowledgment",
    InsufficientAcknowledgments => "insufficient_acknowledgments",
    Timeout => "timeout",
    Manual => "manual",
    SystemError => "system_error",
});

impl EscalationReason {
    /// Reason for a timer fire given the acknowledgment state.
    pub fn for_timer(requires_acknowledgment: bool, acknowledged_count: i32) -> Self {
        if !requires_acknowledgment {
            Self::Timeout
        } else if acknowledged_count == 0 {
            Self::NoAcknowledgment
        } else {
            Self::InsufficientAcknowledgments
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_reason() {
        assert_eq!(EscalationReason::for_timer(false, 0), EscalationReason::Timeout);
        assert_eq!(
            EscalationReason::for_timer(true, 0),
            EscalationReason::NoAcknowledgment
        );
        assert_eq!(
            EscalationReason::for_timer(true, 1),
            EscalationReason::InsufficientAcknowledgments
        );
    }
}
