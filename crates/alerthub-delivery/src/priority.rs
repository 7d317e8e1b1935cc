//! Delivery priority levels.

use serde::{Deserialize, Serialize};

use alerthub_entity::notification::UrgencyLevel;

/// Priority handed to channel backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryPriority {
    /// Background events.
    Low,
    /// Standard events.
    Normal,
    /// Important events.
    High,
    /// Requires immediate attention.
    Urgent,
    /// Life-safety alerts.
    Critical,
}

impl DeliveryPriority {
    /// Default priority for a notification's urgency.
    pub fn for_urgency(urgency: UrgencyLevel) -> Self {
        match urgency {
            UrgencyLevel::Urgent => Self::High,
            UrgencyLevel::Critical => Self::Urgent,
            UrgencyLevel::Emergency => Self::Critical,
        }
    }

    /// One step higher, saturating at critical.
    pub fn raised(self) -> Self {
        match self {
            Self::Low => Self::Normal,
            Self::Normal => Self::High,
            Self::High => Self::Urgent,
            Self::Urgent | Self::Critical => Self::Critical,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for DeliveryPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
