//! Compliance report thresholds.

use serde::{Deserialize, Serialize};

/// Thresholds above/below which the compliance report emits recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Average response time, in seconds, considered too slow.
    #[serde(default = "default_max_response")]
    pub max_average_response_seconds: f64,
    /// Minimum acceptable acknowledgment rate (0.0 - 1.0).
    #[serde(default = "default_min_rate")]
    pub min_acknowledgment_rate: f64,
    /// Maximum acceptable escalations per notification (0.0 - 1.0).
    #[serde(default = "default_max_escalation_ratio")]
    pub max_escalation_ratio: f64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            max_average_response_seconds: default_max_response(),
            min_acknowledgment_rate: default_min_rate(),
            max_escalation_ratio: default_max_escalation_ratio(),
        }
    }
}

fn default_max_response() -> f64 {
    300.0
}

fn default_min_rate() -> f64 {
    0.8
}

fn default_max_escalation_ratio() -> f64 {
    0.3
}
