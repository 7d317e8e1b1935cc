//! Notification lifecycle endpoints.

use chrono::Duration;
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use alerthub_core::Clock;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_create_sends_immediately() {
    let app = TestApp::new();
    let response = app
        .request(
            "POST",
            "/api/notifications",
            Some(app.notification_body()),
            Some(&app.medic),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let data = &response.body["data"];
    assert_eq!(data["notification"]["status"], "delivered");
    assert_eq!(data["notification"]["total_recipients"], 2);
    assert_eq!(data["partial_failure"], false);
    assert_eq!(data["delivery"][0]["channel"], "in_app");
    assert!(data["notification"].get("access_pin_hash").is_none());
}

#[tokio::test]
async fn test_create_requires_medical_role_and_identity() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/notifications",
            Some(app.notification_body()),
            Some(&app.coach),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("POST", "/api/notifications", Some(app.notification_body()), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = TestApp::new();

    let mut body = app.notification_body();
    body["delivery_channels"] = json!([]);
    body["title"] = json!("");
    let response = app
        .request("POST", "/api/notifications", Some(body), Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["delivery_channels"].is_array());
    assert!(response.body["details"]["title"].is_array());

    let mut body = app.notification_body();
    body["min_acknowledgments_required"] = json!(3);
    let response = app
        .request("POST", "/api/notifications", Some(body), Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");

    let mut body = app.notification_body();
    body["urgency_level"] = json!("mild");
    let response = app
        .request("POST", "/api/notifications", Some(body), Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_team_target_reaches_every_member() {
    let app = TestApp::new();
    let mut body = app.notification_body();
    body["target_type"] = json!("team");
    body["target_id"] = json!(app.team);
    body["recipient_ids"] = json!([]);
    let id = app.create(body).await;

    let detail = app.detail(id).await;
    // Medic, coach and three players.
    assert_eq!(detail["notification"]["total_recipients"], 5);
}

#[tokio::test]
async fn test_expired_on_read_then_acknowledgment_rejected() {
    let app = TestApp::new();
    let mut body = app.notification_body();
    body["expires_at"] = json!(app.clock.now() + Duration::hours(1));
    let id = app.create(body).await;

    app.clock.advance(Duration::hours(2));

    let detail = app.detail(id).await;
    assert_eq!(detail["notification"]["status"], "expired");

    let response = app.ack(app.player(0), id).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_FINAL");
}

#[tokio::test]
async fn test_list_active_filters_and_hides_final() {
    let app = TestApp::new();
    let critical = app.create(app.notification_body()).await;
    let mut body = app.notification_body();
    body["urgency_level"] = json!("emergency");
    let emergency = app.create(body).await;
    let resolved = app.create(app.notification_body()).await;
    let response = app
        .request(
            "POST",
            &format!("/api/notifications/{resolved}/resolve"),
            Some(json!({"notes": "False alarm"})),
            Some(&app.medic),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["resolution_notes"], "False alarm");

    let response = app
        .request("GET", "/api/notifications", None, Some(app.player(0)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total"], 2);
    let ids: Vec<_> = response.body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&critical.to_string()));
    assert!(ids.contains(&emergency.to_string()));
    assert!(response.body["data"]["items"][0].get("message").is_none());

    let response = app
        .request(
            "GET",
            "/api/notifications?urgency_level=emergency&per_page=10",
            None,
            Some(&app.medic),
        )
        .await;
    assert_eq!(response.body["data"]["total"], 1);
    assert_eq!(response.body["data"]["items"][0]["id"], emergency.to_string());
    assert_eq!(response.body["data"]["per_page"], 10);

    let response = app
        .request("GET", "/api/notifications", None, Some(&app.outsider))
        .await;
    assert_eq!(response.body["data"]["total"], 0);
}

#[tokio::test]
async fn test_resolve_is_final() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;
    let path = format!("/api/notifications/{id}/resolve");

    let response = app
        .request("POST", &path, Some(json!({})), Some(app.player(0)))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("POST", &path, Some(json!({})), Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["resolved_by"], app.medic.user_id.to_string());

    let response = app
        .request("POST", &path, Some(json!({})), Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    assert_eq!(app.advance_and_fire(60).await, 0);
}

#[tokio::test]
async fn test_detail_privacy_and_pin() {
    let app = TestApp::new();
    let mut body = app.notification_body();
    body["privacy"] = json!({"restrict_to_medical_staff": true, "require_pin": true});
    body["access_pin"] = json!("4821");
    let id = app.create(body).await;
    let path = format!("/api/notifications/{id}");

    let response = app.request("GET", &path, None, Some(&app.medic)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request_with_headers(
            "GET",
            &path,
            None,
            Some(&app.medic),
            &[("x-notification-pin", "0000")],
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request_with_headers(
            "GET",
            &path,
            None,
            Some(app.player(0)),
            &[("x-notification-pin", "4821")],
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request_with_headers(
            "GET",
            &path,
            None,
            Some(&app.medic),
            &[("x-notification-pin", "4821")],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["notification"]["message"], "Concussion protocol started");
}

#[tokio::test]
async fn test_detail_of_other_organization_is_not_found() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;

    let response = app
        .request("GET", &format!("/api/notifications/{id}"), None, Some(&app.outsider))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request("GET", "/api/notifications/not-a-uuid", None, Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "GET",
            &format!("/api/notifications/{}", Uuid::new_v4()),
            None,
            Some(&app.medic),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scheduled_notification_waits_for_the_sweep() {
    let app = TestApp::new();
    let mut body = app.notification_body();
    body["scheduled_for"] = json!(app.clock.now() + Duration::minutes(30));
    let id = app.create(body).await;

    assert_eq!(app.detail(id).await["notification"]["status"], "draft");
    let response = app.ack(app.player(0), id).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    app.clock.advance(Duration::minutes(30));
    alerthub_worker::scheduler::lifecycle_sweep(&app.notifications, 10).await;

    assert_eq!(app.detail(id).await["notification"]["status"], "delivered");
    assert_eq!(app.ack(app.player(0), id).await.status, StatusCode::CREATED);
}
