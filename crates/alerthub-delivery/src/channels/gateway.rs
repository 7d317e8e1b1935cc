//! HTTP gateway channel for email, SMS, push and phone delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{debug, warn};

use alerthub_core::config::delivery::GatewayConfig;
use alerthub_core::error::{AppError, ErrorKind};
use alerthub_core::result::AppResult;
use alerthub_entity::notification::DeliveryChannel;

use super::ChannelSender;
use crate::message::{OutboundMessage, Recipient};

/// Posts one JSON document per (recipient, message) to a gateway URL.
///
/// The gateway owns address lookup for directory users, retries and the
/// provider integration.
#[derive(Debug)]
pub struct GatewayChannel {
    channel: DeliveryChannel,
    config: GatewayConfig,
    client: Client,
}

impl GatewayChannel {
    /// Create a gateway sender for a channel.
    pub fn new(channel: DeliveryChannel, config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            channel,
            config,
            client,
        }
    }

    /// Build the request headers.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.config.token
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}"))
        {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Build the JSON payload.
    fn build_payload(&self, recipient: &Recipient, message: &OutboundMessage) -> serde_json::Value {
        json!({
            "channel": self.channel.as_str(),
            "recipient": recipient,
            "notification_id": message.notification_id,
            "title": message.title,
            "message": message.message,
            "priority": message.priority.as_str(),
            "expires_at": message.expires_at.to_rfc3339(),
            "escalation_level": message.escalation_level,
        })
    }
}

#[async_trait]
impl ChannelSender for GatewayChannel {
    fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    fn supports(&self, recipient: &Recipient) -> bool {
        match recipient {
            Recipient::User { .. } => true,
            Recipient::EmergencyContact(contact) => match self.channel {
                DeliveryChannel::Sms | DeliveryChannel::Phone => !contact.phone.is_empty(),
                DeliveryChannel::Email => contact.email.is_some(),
                DeliveryChannel::Push | DeliveryChannel::InApp => false,
            },
        }
    }

    async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> AppResult<()> {
        let response = self
            .client
            .post(&self.config.url)
            .headers(self.build_headers())
            .json(&self.build_payload(recipient, message))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Delivery,
                    format!("{} gateway request failed: {e}", self.channel),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(channel = %self.channel, %status, "Gateway rejected message");
            return Err(AppError::delivery(format!(
                "{} gateway returned {status}: {body}",
                self.channel
            )));
        }

        debug!(
            channel = %self.channel,
            recipient = %recipient.label(),
            notification_id = %message.notification_id,
            "Gateway accepted message"
        );
        Ok(())
    }
}
