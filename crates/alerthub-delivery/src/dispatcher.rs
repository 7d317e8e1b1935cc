//! Delivery dispatcher: fans a message out across channels and recipients.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use alerthub_core::Clock;
use alerthub_core::config::delivery::DeliveryConfig;
use alerthub_entity::escalation::ChannelDeliveryResult;
use alerthub_entity::notification::DeliveryChannel;

use crate::channels::{ChannelSender, GatewayChannel, InAppChannel};
use crate::message::{OutboundMessage, Recipient};

/// Outcome of one dispatch across all requested channels.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// One result per requested channel, in request order.
    pub results: Vec<ChannelDeliveryResult>,
}

impl DispatchReport {
    /// Whether every channel failed.
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| !r.success)
    }

    /// Whether at least one channel failed.
    pub fn partial_failure(&self) -> bool {
        self.results.iter().any(|r| !r.success)
    }
}

/// Routes messages to the sender registered for each channel.
#[derive(Debug, Clone)]
pub struct DeliveryDispatcher {
    senders: HashMap<DeliveryChannel, Arc<dyn ChannelSender>>,
    clock: Arc<dyn Clock>,
}

impl DeliveryDispatcher {
    /// Create a dispatcher with no senders.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            senders: HashMap::new(),
            clock,
        }
    }

    /// Build the in-app bus plus a gateway sender for every configured gateway.
    ///
    /// Returns the in-app channel so callers can subscribe to it.
    pub fn from_config(config: &DeliveryConfig, clock: Arc<dyn Clock>) -> (Self, InAppChannel) {
        let in_app = InAppChannel::new(config.in_app_buffer);
        let mut dispatcher = Self::new(clock).with_sender(Arc::new(in_app.clone()));

        let gateways = [
            (DeliveryChannel::Email, &config.email),
            (DeliveryChannel::Sms, &config.sms),
            (DeliveryChannel::Push, &config.push),
            (DeliveryChannel::Phone, &config.phone),
        ];
        for (channel, gateway) in gateways {
            match gateway {
                Some(gateway) => {
                    dispatcher = dispatcher
                        .with_sender(Arc::new(GatewayChannel::new(channel, gateway.clone())));
                }
                None => debug!(channel = %channel, "No gateway configured; channel disabled"),
            }
        }
        (dispatcher, in_app)
    }

    /// Register (or replace) the sender for its channel.
    pub fn with_sender(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(sender.channel(), sender);
        self
    }

    /// Channels that have a registered sender.
    pub fn registered_channels(&self) -> Vec<DeliveryChannel> {
        DeliveryChannel::ALL
            .iter()
            .copied()
            .filter(|c| self.senders.contains_key(c))
            .collect()
    }

    /// Send `message` to every recipient on every channel.
    ///
    /// Channels run concurrently; a failure on one never affects another.
    pub async fn dispatch(
        &self,
        channels: &[DeliveryChannel],
        recipients: &[Recipient],
        message: &OutboundMessage,
    ) -> DispatchReport {
        let mut unique = Vec::with_capacity(channels.len());
        for channel in channels {
            if !unique.contains(channel) {
                unique.push(*channel);
            }
        }

        let results = join_all(
            unique
                .into_iter()
                .map(|channel| self.dispatch_channel(channel, recipients, message)),
        )
        .await;

        DispatchReport { results }
    }

    async fn dispatch_channel(
        &self,
        channel: DeliveryChannel,
        recipients: &[Recipient],
        message: &OutboundMessage,
    ) -> ChannelDeliveryResult {
        let Some(sender) = self.senders.get(&channel) else {
            warn!(channel = %channel, notification_id = %message.notification_id, "No sender registered");
            return ChannelDeliveryResult {
                channel,
                success: false,
                attempted: 0,
                delivered: 0,
                failed: 0,
                skipped: 0,
                error: Some(format!("No sender registered for channel {channel}")),
                timestamp: self.clock.now(),
            };
        };

        let (reachable, unreachable): (Vec<_>, Vec<_>) =
            recipients.iter().partition(|r| sender.supports(r));

        let outcomes = join_all(reachable.iter().map(|r| sender.send(r, message))).await;

        let mut delivered = 0u32;
        let mut failed = 0u32;
        let mut first_error = None;
        for (recipient, outcome) in reachable.iter().zip(outcomes) {
            match outcome {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        channel = %channel,
                        recipient = %recipient.label(),
                        notification_id = %message.notification_id,
                        error = %e,
                        "Delivery failed"
                    );
                    first_error.get_or_insert(e.message);
                }
            }
        }

        debug!(
            channel = %channel,
            notification_id = %message.notification_id,
            delivered,
            failed,
            skipped = unreachable.len(),
            "Channel dispatch finished"
        );

        ChannelDeliveryResult {
            channel,
            success: failed == 0,
            attempted: reachable.len() as u32,
            delivered,
            failed,
            skipped: unreachable.len() as u32,
            error: first_error,
            timestamp: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerthub_core::error::AppError;
    use alerthub_core::result::AppResult;
    use alerthub_core::{ManualClock, SystemClock};
    use alerthub_entity::notification::EmergencyContact;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    use crate::priority::DeliveryPriority;

    #[derive(Debug)]
    struct StubSender {
        channel: DeliveryChannel,
        fail_for: Option<Uuid>,
        sent: Mutex<Vec<Recipient>>,
    }

    impl StubSender {
        fn new(channel: DeliveryChannel, fail_for: Option<Uuid>) -> Arc<Self> {
            Arc::new(Self {
                channel,
                fail_for,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChannelSender for StubSender {
        fn channel(&self) -> DeliveryChannel {
            self.channel
        }

        fn supports(&self, recipient: &Recipient) -> bool {
            self.channel != DeliveryChannel::Push || recipient.user_id().is_some()
        }

        async fn send(&self, recipient: &Recipient, _message: &OutboundMessage) -> AppResult<()> {
            if recipient.user_id().is_some() && recipient.user_id() == self.fail_for {
                return Err(AppError::delivery("provider down"));
            }
            self.sent.lock().unwrap().push(recipient.clone());
            Ok(())
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            notification_id: Uuid::new_v4(),
            title: "Allergic reaction".into(),
            message: "Epinephrine administered".into(),
            priority: DeliveryPriority::Critical,
            expires_at: Utc::now(),
            escalation_level: 0,
        }
    }

    #[tokio::test]
    async fn test_failure_on_one_channel_does_not_block_others() {
        let bad_user = Uuid::new_v4();
        let good_user = Uuid::new_v4();
        let email = StubSender::new(DeliveryChannel::Email, Some(bad_user));
        let sms = StubSender::new(DeliveryChannel::Sms, None);
        let dispatcher = DeliveryDispatcher::new(Arc::new(SystemClock))
            .with_sender(email.clone())
            .with_sender(sms.clone());

        let recipients = vec![Recipient::from(bad_user), Recipient::from(good_user)];
        let report = dispatcher
            .dispatch(
                &[DeliveryChannel::Email, DeliveryChannel::Sms],
                &recipients,
                &message(),
            )
            .await;

        assert_eq!(report.results.len(), 2);
        let email_result = &report.results[0];
        assert!(!email_result.success);
        assert_eq!(email_result.delivered, 1);
        assert_eq!(email_result.failed, 1);
        assert_eq!(email_result.error.as_deref(), Some("provider down"));
        assert!(report.results[1].success);
        assert_eq!(sms.sent.lock().unwrap().len(), 2);
        assert!(report.partial_failure());
        assert!(!report.all_failed());
    }

    #[tokio::test]
    async fn test_missing_sender_is_failed() {
        let clock = ManualClock::default();
        let dispatcher = DeliveryDispatcher::new(Arc::new(clock.clone()));
        let report = dispatcher
            .dispatch(&[DeliveryChannel::Phone], &[Recipient::from(Uuid::new_v4())], &message())
            .await;
        assert!(report.all_failed());
        assert_eq!(report.results[0].timestamp, clock.now());
    }

    #[tokio::test]
    async fn test_unreachable_recipients_are_skipped() {
        let push = StubSender::new(DeliveryChannel::Push, None);
        let dispatcher = DeliveryDispatcher::new(Arc::new(SystemClock)).with_sender(push);
        let contact = Recipient::EmergencyContact(EmergencyContact {
            name: "Mum".into(),
            phone: "+15550199".into(),
            relationship: Some("mother".into()),
            email: None,
        });
        let report = dispatcher
            .dispatch(
                &[DeliveryChannel::Push, DeliveryChannel::Push],
                &[Recipient::from(Uuid::new_v4()), contact],
                &message(),
            )
            .await;

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert!(result.success);
        assert_eq!(result.attempted, 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_from_config_registers_in_app_only_by_default() {
        let (dispatcher, _bus) =
            DeliveryDispatcher::from_config(&DeliveryConfig::default(), Arc::new(SystemClock));
        assert_eq!(dispatcher.registered_channels(), vec![DeliveryChannel::InApp]);
    }
}
