//! Test harness: in-memory stores, a manual clock, a small roster and a
//! recording channel sender.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use alerthub_core::config::compliance::ComplianceConfig;
use alerthub_core::config::escalation::EscalationConfig;
use alerthub_core::error::AppError;
use alerthub_core::result::AppResult;
use alerthub_core::traits::directory::DirectoryUser;
use alerthub_core::{Clock, ManualClock};
use alerthub_database::repositories::EscalationTaskStore;
use alerthub_database::{MemoryStore, Stores};
use alerthub_delivery::{ChannelSender, DeliveryDispatcher, OutboundMessage, Recipient};
use alerthub_entity::acknowledgment::{Acknowledgment, AcknowledgmentMethod};
use alerthub_entity::notification::{
    DeliveryChannel, EscalationLevelPolicy, MedicalPayload, MedicalType, Notification,
    NotificationStatus, PrivacySettings, TargetType, UrgencyLevel,
};
use alerthub_entity::user::UserRole;

use crate::acknowledgment::{AcknowledgeRequest, AckOutcome, AcknowledgmentTracker};
use crate::compliance::ComplianceReporter;
use crate::context::RequestContext;
use crate::deps::ServiceDeps;
use crate::directory::StaticDirectory;
use crate::escalation::{EscalationEngine, FireOutcome};
use crate::notification::{CreateNotification, NotificationService, SendOutcome};

/// Sender that records every delivery and optionally fails.
#[derive(Debug)]
pub struct RecordingSender {
    channel: DeliveryChannel,
    fail: bool,
    sent: Mutex<Vec<(Recipient, OutboundMessage)>>,
}

impl RecordingSender {
    pub fn new(channel: DeliveryChannel) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: false,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(channel: DeliveryChannel) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(Recipient, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn users_reached(&self, escalation_level: i32) -> Vec<Uuid> {
        self.sent()
            .into_iter()
            .filter(|(_, m)| m.escalation_level == escalation_level)
            .filter_map(|(r, _)| r.user_id())
            .collect()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    fn supports(&self, recipient: &Recipient) -> bool {
        match recipient {
            Recipient::User { .. } => true,
            Recipient::EmergencyContact(_) => self.channel == DeliveryChannel::Sms,
        }
    }

    async fn send(&self, recipient: &Recipient, message: &OutboundMessage) -> AppResult<()> {
        if self.fail {
            return Err(AppError::delivery("gateway unavailable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), message.clone()));
        Ok(())
    }
}

/// Sender whose deliveries never finish, standing in for a process that
/// dies mid-dispatch.
#[derive(Debug)]
pub struct StalledSender;

#[async_trait]
impl ChannelSender for StalledSender {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::InApp
    }

    fn supports(&self, _recipient: &Recipient) -> bool {
        true
    }

    async fn send(&self, _recipient: &Recipient, _message: &OutboundMessage) -> AppResult<()> {
        std::future::pending().await
    }
}

/// Everything a service test needs.
pub struct Harness {
    pub clock: ManualClock,
    pub store: MemoryStore,
    pub deps: ServiceDeps,
    pub in_app: Arc<RecordingSender>,
    pub sms: Arc<RecordingSender>,
    pub engine: Arc<EscalationEngine>,
    pub notifications: NotificationService,
    pub tracker: AcknowledgmentTracker,
    pub reporter: ComplianceReporter,
    pub org: Uuid,
    pub team: Uuid,
    pub medic: RequestContext,
    pub coach: RequestContext,
    pub players: Vec<RequestContext>,
    pub outsider: RequestContext,
}

impl Harness {
    pub fn new() -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        let store = MemoryStore::new();
        let org = Uuid::new_v4();
        let team = Uuid::new_v4();

        let medic = RequestContext::new(Uuid::new_v4(), org, UserRole::MedicalStaff);
        let coach = RequestContext::new(Uuid::new_v4(), org, UserRole::Coach);
        let players: Vec<_> = (0..4)
            .map(|_| RequestContext::new(Uuid::new_v4(), org, UserRole::Player))
            .collect();
        let outsider = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::MedicalStaff);

        let mut roster = vec![
            user(&medic, "Dr. Reyes", "medical_staff", vec![team]),
            user(&coach, "Coach Lind", "coach", vec![team]),
            user(&outsider, "Dr. Elsewhere", "medical_staff", vec![]),
        ];
        for (i, player) in players.iter().enumerate() {
            roster.push(user(player, &format!("Player {}", i + 1), "player", vec![team]));
        }

        let clock_handle: Arc<dyn Clock> = Arc::new(clock.clone());
        let deps = ServiceDeps::new(
            Stores::memory(store.clone()),
            Arc::new(StaticDirectory::new(roster)),
            clock_handle.clone(),
            3,
        );

        let in_app = RecordingSender::new(DeliveryChannel::InApp);
        let sms = RecordingSender::new(DeliveryChannel::Sms);
        let dispatcher = Arc::new(
            DeliveryDispatcher::new(clock_handle)
                .with_sender(in_app.clone())
                .with_sender(sms.clone()),
        );
        let engine = Arc::new(EscalationEngine::new(
            deps.clone(),
            dispatcher.clone(),
            EscalationConfig::default(),
        ));

        Self {
            notifications: NotificationService::new(deps.clone(), dispatcher, engine.clone(), 24),
            tracker: AcknowledgmentTracker::new(deps.clone()),
            reporter: ComplianceReporter::new(deps.clone(), ComplianceConfig::default()),
            deps,
            engine,
            clock,
            store,
            in_app,
            sms,
            org,
            team,
            medic,
            coach,
            players,
            outsider,
        }
    }

    /// A second engine over the same stores that delivers through `sender`.
    pub fn engine_with(&self, sender: Arc<dyn ChannelSender>) -> EscalationEngine {
        let dispatcher = DeliveryDispatcher::new(self.deps.clock.clone()).with_sender(sender);
        EscalationEngine::new(
            self.deps.clone(),
            Arc::new(dispatcher),
            EscalationConfig::default(),
        )
    }

    pub fn player(&self, index: usize) -> &RequestContext {
        &self.players[index]
    }

    /// A request targeting the first two players, escalating to the coach
    /// after 15 minutes and to medical staff 10 minutes later.
    pub fn request(&self) -> CreateNotification {
        CreateNotification {
            team_id: None,
            urgency_level: UrgencyLevel::Critical,
            medical_type: MedicalType::InjuryAlert,
            title: "Head impact".into(),
            message: "Concussion protocol started".into(),
            payload: MedicalPayload::default(),
            target_type: TargetType::CustomGroup,
            target_id: None,
            recipient_ids: vec![self.players[0].user_id, self.players[1].user_id],
            delivery_channels: vec![DeliveryChannel::InApp],
            channel_config: serde_json::Value::Null,
            requires_acknowledgment: true,
            acknowledgment_timeout_minutes: Some(15),
            required_acknowledgers: vec![],
            min_acknowledgments_required: 1,
            enable_escalation: true,
            escalation_policy: vec![
                EscalationLevelPolicy {
                    delay_minutes: 0,
                    target_users: vec![self.coach.user_id],
                    ..EscalationLevelPolicy::default()
                },
                EscalationLevelPolicy {
                    delay_minutes: 10,
                    target_roles: vec!["medical_staff".into()],
                    ..EscalationLevelPolicy::default()
                },
            ],
            attachments: vec![],
            privacy: PrivacySettings::default(),
            access_pin: None,
            scheduled_for: None,
            expires_at: None,
        }
    }

    pub async fn create(&self, request: CreateNotification) -> SendOutcome {
        self.notifications.create(&self.medic, request).await.unwrap()
    }

    pub async fn ack(&self, ctx: &RequestContext, id: Uuid) -> AppResult<AckOutcome> {
        self.tracker
            .acknowledge(ctx, id, &AcknowledgeRequest::default())
            .await
    }

    pub async fn load(&self, id: Uuid) -> Notification {
        alerthub_database::repositories::NotificationStore::find_by_id(&self.store, id)
            .await
            .unwrap()
            .unwrap()
    }

    /// Advance the clock and fire every task that became due.
    pub async fn advance_and_fire(&self, minutes: i64) -> Vec<FireOutcome> {
        self.clock.advance(Duration::minutes(minutes));
        let now = self.clock.now();
        let due = EscalationTaskStore::claim_due(&self.store, now, now - Duration::minutes(5), 100)
            .await
            .unwrap();
        let mut outcomes = Vec::new();
        for task in due {
            outcomes.push(self.engine.fire(&task).await.unwrap());
        }
        outcomes
    }
}

fn user(ctx: &RequestContext, name: &str, role: &str, team_ids: Vec<Uuid>) -> DirectoryUser {
    DirectoryUser {
        id: ctx.user_id,
        organization_id: ctx.organization_id,
        display_name: name.into(),
        role: role.into(),
        team_ids,
    }
}

/// A delivered notification fixture for pure aggregation tests.
pub fn notification(org: Uuid) -> Notification {
    let now = Utc::now();
    Notification {
        id: Uuid::new_v4(),
        organization_id: org,
        team_id: None,
        created_by: Uuid::new_v4(),
        urgency_level: UrgencyLevel::Critical,
        medical_type: MedicalType::InjuryAlert,
        title: "Sprain".into(),
        message: "Ice".into(),
        payload: MedicalPayload::default(),
        target_type: TargetType::CustomGroup,
        target_id: None,
        recipient_ids: vec![],
        delivery_channels: vec![DeliveryChannel::InApp],
        channel_config: serde_json::Value::Null,
        delivery_results: vec![],
        requires_acknowledgment: true,
        acknowledgment_timeout_minutes: None,
        required_acknowledgers: vec![],
        min_acknowledgments_required: 1,
        enable_escalation: false,
        escalation_policy: vec![],
        attachments: vec![],
        privacy: PrivacySettings::default(),
        access_pin_hash: None,
        status: NotificationStatus::Delivered,
        scheduled_for: None,
        sent_at: Some(now),
        first_acknowledged_at: None,
        fully_acknowledged_at: None,
        escalated_at: None,
        resolved_at: None,
        resolved_by: None,
        resolution_notes: None,
        expires_at: now + Duration::hours(1),
        redacted_at: None,
        total_recipients: 0,
        acknowledged_count: 0,
        escalation_level: 0,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

/// An acknowledgment fixture.
pub fn acknowledgment(notification_id: Uuid, response_time_seconds: Option<i64>) -> Acknowledgment {
    Acknowledgment {
        id: Uuid::new_v4(),
        notification_id,
        user_id: Uuid::new_v4(),
        user_name: "Player".into(),
        user_role: "player".into(),
        method: AcknowledgmentMethod::InApp,
        message: None,
        device_info: None,
        location: None,
        response_time_seconds,
        escalation_level: 0,
        is_emergency_contact: false,
        created_at: Utc::now(),
    }
}
