//! Outbound delivery channel configuration.

use serde::{Deserialize, Serialize};

/// Delivery channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Capacity of the in-app broadcast bus.
    #[serde(default = "default_in_app_buffer")]
    pub in_app_buffer: usize,
    /// Gateway used for e-mail delivery.
    #[serde(default)]
    pub email: Option<GatewayConfig>,
    /// Gateway used for SMS delivery.
    #[serde(default)]
    pub sms: Option<GatewayConfig>,
    /// Gateway used for push delivery.
    #[serde(default)]
    pub push: Option<GatewayConfig>,
    /// Gateway used for voice-call delivery.
    #[serde(default)]
    pub phone: Option<GatewayConfig>,
}

/// HTTP gateway that accepts one message per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Endpoint receiving a JSON POST per recipient.
    pub url: String,
    /// Optional bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            in_app_buffer: default_in_app_buffer(),
            email: None,
            sms: None,
            push: None,
            phone: None,
        }
    }
}

fn default_in_app_buffer() -> usize {
    1024
}

fn default_timeout() -> u64 {
    10
}
