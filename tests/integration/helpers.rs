//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::{TimeZone, Utc};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tower::ServiceExt;
use uuid::Uuid;

use alerthub_api::{AppState, build_app};
use alerthub_core::config::{AppConfig, StoreBackend};
use alerthub_core::traits::directory::DirectoryUser;
use alerthub_core::{Clock, ManualClock};
use alerthub_database::{MemoryStore, Stores};
use alerthub_delivery::DeliveryDispatcher;
use alerthub_delivery::channels::InAppChannel;
use alerthub_entity::user::UserRole;
use alerthub_service::{
    AcknowledgmentTracker, ComplianceReporter, EscalationEngine, NotificationService,
    RequestContext, ServiceDeps, StaticDirectory,
};
use alerthub_worker::EscalationRunner;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Clock shared by every service
    pub clock: ManualClock,
    /// Backing store, for direct inspection
    pub store: MemoryStore,
    /// Escalation runner, polled by hand
    pub runner: EscalationRunner,
    /// Lifecycle manager, for driving the sweeps
    pub notifications: Arc<NotificationService>,
    /// Organization of the roster
    pub org: Uuid,
    /// Team every player belongs to
    pub team: Uuid,
    pub medic: RequestContext,
    pub coach: RequestContext,
    pub admin: RequestContext,
    pub players: Vec<RequestContext>,
    /// Medical staff of another organization
    pub outsider: RequestContext,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 14, 0, 0).unwrap());
        let store = MemoryStore::new();
        let org = Uuid::new_v4();
        let team = Uuid::new_v4();

        let medic = RequestContext::new(Uuid::new_v4(), org, UserRole::MedicalStaff);
        let coach = RequestContext::new(Uuid::new_v4(), org, UserRole::Coach);
        let admin = RequestContext::new(Uuid::new_v4(), org, UserRole::Admin);
        let players: Vec<_> = (0..3)
            .map(|_| RequestContext::new(Uuid::new_v4(), org, UserRole::Player))
            .collect();
        let outsider = RequestContext::new(Uuid::new_v4(), Uuid::new_v4(), UserRole::MedicalStaff);

        let mut roster = vec![
            user(&medic, "Dr. Reyes", vec![team]),
            user(&coach, "Coach Lind", vec![team]),
            user(&admin, "Club Admin", vec![]),
            user(&outsider, "Dr. Elsewhere", vec![]),
        ];
        for (i, player) in players.iter().enumerate() {
            roster.push(user(player, &format!("Player {}", i + 1), vec![team]));
        }

        let mut config = AppConfig::default();
        config.database.backend = StoreBackend::Memory;

        let clock_handle: Arc<dyn Clock> = Arc::new(clock.clone());
        let deps = ServiceDeps::new(
            Stores::memory(store.clone()),
            Arc::new(StaticDirectory::new(roster)),
            clock_handle.clone(),
            config.escalation.conflict_retries,
        );
        let dispatcher = Arc::new(
            DeliveryDispatcher::new(clock_handle.clone())
                .with_sender(Arc::new(InAppChannel::new(64))),
        );
        let engine = Arc::new(EscalationEngine::new(
            deps.clone(),
            dispatcher.clone(),
            config.escalation.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(
            deps.clone(),
            dispatcher,
            engine.clone(),
            config.escalation.default_expiry_hours,
        ));
        let tracker = Arc::new(AcknowledgmentTracker::new(deps.clone()));
        let reporter = Arc::new(ComplianceReporter::new(deps, config.compliance.clone()));

        let runner = EscalationRunner::new(
            Arc::new(store.clone()),
            engine.clone(),
            clock_handle,
            config.escalation.clone(),
            "integration".into(),
        );

        let state = AppState::new(config, notifications.clone(), tracker, engine, reporter);

        Self {
            router: build_app(state),
            clock,
            store,
            runner,
            notifications,
            org,
            team,
            medic,
            coach,
            admin,
            players,
            outsider,
        }
    }

    pub fn player(&self, index: usize) -> &RequestContext {
        &self.players[index]
    }

    /// Request body for a notification to the first two players that
    /// escalates to the coach after 15 minutes.
    pub fn notification_body(&self) -> Value {
        json!({
            "urgency_level": "critical",
            "medical_type": "injury_alert",
            "title": "Head impact",
            "message": "Concussion protocol started",
            "target_type": "custom_group",
            "recipient_ids": [self.players[0].user_id, self.players[1].user_id],
            "delivery_channels": ["in_app"],
            "acknowledgment_timeout_minutes": 15,
            "enable_escalation": true,
            "escalation_policy": [
                {"delay_minutes": 0, "target_users": [self.coach.user_id]}
            ]
        })
    }

    /// Create a notification as the medic and return its id.
    pub async fn create(&self, body: Value) -> Uuid {
        let response = self
            .request("POST", "/api/notifications", Some(body), Some(&self.medic))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.id("/data/notification/id")
    }

    /// Acknowledge with an empty body.
    pub async fn ack(&self, actor: &RequestContext, id: Uuid) -> TestResponse {
        self.request(
            "POST",
            &format!("/api/notifications/{id}/acknowledge"),
            Some(json!({})),
            Some(actor),
        )
        .await
    }

    /// Fetch the detail view as the medic.
    pub async fn detail(&self, id: Uuid) -> Value {
        let response = self
            .request("GET", &format!("/api/notifications/{id}"), None, Some(&self.medic))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["data"].clone()
    }

    /// Fire every escalation task that is due now; returns how many fired.
    pub async fn fire_due(&self) -> usize {
        let semaphore = Arc::new(Semaphore::new(8));
        let handles = self.runner.poll(&semaphore).await.expect("poll");
        let fired = handles.len();
        for handle in handles {
            handle.await.expect("escalation task panicked");
        }
        fired
    }

    /// Advance the clock, then fire what became due.
    pub async fn advance_and_fire(&self, minutes: i64) -> usize {
        self.clock.advance_minutes(minutes);
        self.fire_due().await
    }

    /// Send a request as `actor` (no identity headers when `None`).
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        actor: Option<&RequestContext>,
    ) -> TestResponse {
        self.request_with_headers(method, path, body, actor, &[]).await
    }

    /// Send a request with extra headers.
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        actor: Option<&RequestContext>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        if let Some(actor) = actor {
            req = req
                .header("x-user-id", actor.user_id.to_string())
                .header("x-organization-id", actor.organization_id.to_string())
                .header("x-user-role", actor.role.to_string());
        }
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let body = match body {
            Some(b) => {
                req = req.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&b).expect("Failed to serialize body"))
            }
            None => Body::empty(),
        };
        let req = req.body(body).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

fn user(ctx: &RequestContext, name: &str, team_ids: Vec<Uuid>) -> DirectoryUser {
    DirectoryUser {
        id: ctx.user_id,
        organization_id: ctx.organization_id,
        display_name: name.into(),
        role: ctx.role.to_string(),
        team_ids,
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// Read a UUID at a JSON pointer.
    pub fn id(&self, pointer: &str) -> Uuid {
        let raw = self
            .body
            .pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("no string at {pointer} in {}", self.body));
        Uuid::parse_str(raw).expect("invalid uuid")
    }

    /// The `error` code of an error response.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
