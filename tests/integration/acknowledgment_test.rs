//! Acknowledgment endpoints.

use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_acknowledgment_is_idempotent() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;
    let path = format!("/api/notifications/{id}/acknowledge");

    let first = app
        .request(
            "POST",
            &path,
            Some(json!({"method": "in_app", "message": "On my way", "location": "Pitch 2"})),
            Some(app.player(0)),
        )
        .await;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.body);
    assert_eq!(first.body["data"]["created"], true);
    assert_eq!(first.body["data"]["acknowledgment"]["user_name"], "Player 1");

    let second = app
        .request("POST", &path, Some(json!({"method": "sms_reply"})), Some(app.player(0)))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["data"]["created"], false);
    assert_eq!(
        second.body["data"]["acknowledgment"]["id"],
        first.body["data"]["acknowledgment"]["id"]
    );
    assert_eq!(second.body["data"]["acknowledgment"]["method"], "in_app");
    assert_eq!(second.body["data"]["acknowledged_count"], 1);

    let detail = app.detail(id).await;
    assert_eq!(detail["acknowledgments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_acknowledgments_transition_once() {
    let app = TestApp::new();
    let mut body = app.notification_body();
    body["min_acknowledgments_required"] = json!(2);
    let id = app.create(body).await;

    let (a, b) = futures::join!(app.ack(app.player(0), id), app.ack(app.player(1), id));
    assert_eq!(a.status, StatusCode::CREATED);
    assert_eq!(b.status, StatusCode::CREATED);
    let transitions = [&a, &b]
        .iter()
        .filter(|r| r.body["data"]["status"] == "acknowledged")
        .count();
    assert_eq!(transitions, 1);

    let detail = app.detail(id).await;
    assert_eq!(detail["notification"]["acknowledged_count"], 2);
    assert_eq!(detail["notification"]["status"], "acknowledged");
    assert_eq!(detail["progress"]["fully_acknowledged"], true);
    assert_eq!(detail["progress"]["percentage"], 100.0);
}

#[tokio::test]
async fn test_only_recipients_can_acknowledge() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;

    let response = app.ack(app.player(2), id).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.ack(&app.outsider, id).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.ack(app.player(0), Uuid::new_v4()).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_acknowledgment_reports_each_id() {
    let app = TestApp::new();
    let first = app.create(app.notification_body()).await;
    let second = app.create(app.notification_body()).await;
    let missing = Uuid::new_v4();

    let response = app
        .request(
            "POST",
            "/api/notifications/acknowledge/bulk",
            Some(json!({
                "notification_ids": [first, second, missing, first],
                "acknowledgment": {"method": "push_action"}
            })),
            Some(app.player(1)),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let results = response.body["data"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    for result in results {
        let ok = result["notification_id"] != missing.to_string();
        assert_eq!(result["success"], ok, "{result}");
    }
    let failed = results
        .iter()
        .find(|r| r["notification_id"] == missing.to_string())
        .unwrap();
    assert_eq!(failed["error_kind"], "NotFound");
    assert_eq!(results[0]["acknowledgment"]["method"], "push_action");

    assert_eq!(app.detail(first).await["notification"]["status"], "acknowledged");
}

#[tokio::test]
async fn test_bulk_acknowledgment_validates_the_id_list() {
    let app = TestApp::new();
    let response = app
        .request(
            "POST",
            "/api/notifications/acknowledge/bulk",
            Some(json!({"notification_ids": []})),
            Some(app.player(0)),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
    assert!(response.body["details"]["notification_ids"].is_array());
}

#[tokio::test]
async fn test_resolved_notification_rejects_new_acknowledgments() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;

    let response = app
        .request(
            "POST",
            &format!("/api/notifications/{id}/resolve"),
            Some(json!({})),
            Some(&app.medic),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "resolved");

    let response = app.ack(app.player(0), id).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_FINAL");
}
