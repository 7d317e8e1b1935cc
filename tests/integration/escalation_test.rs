//! Escalation timers and manual escalation through the API.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_immediate_acknowledgment_prevents_escalation() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;

    let response = app.ack(app.player(0), id).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["status"], "acknowledged");

    assert_eq!(app.advance_and_fire(30).await, 0);

    let detail = app.detail(id).await;
    assert_eq!(detail["notification"]["status"], "acknowledged");
    assert_eq!(detail["notification"]["escalation_level"], 0);
    assert!(detail["escalations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unacknowledged_notification_escalates_once() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;

    assert_eq!(app.advance_and_fire(14).await, 0);
    assert_eq!(app.advance_and_fire(1).await, 1);
    assert_eq!(app.advance_and_fire(60).await, 0);

    let detail = app.detail(id).await;
    assert_eq!(detail["notification"]["status"], "escalated");
    assert_eq!(detail["notification"]["escalation_level"], 1);
    let escalations = detail["escalations"].as_array().unwrap();
    assert_eq!(escalations.len(), 1);
    assert_eq!(escalations[0]["level"], 1);
    assert_eq!(escalations[0]["reason"], "no_acknowledgment");
    assert_eq!(escalations[0]["status"], "completed");

    // The coach was reached and may now acknowledge.
    let response = app.ack(&app.coach, id).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["status"], "acknowledged");
}

#[tokio::test]
async fn test_missing_required_acknowledger_escalates_until_they_ack() {
    let app = TestApp::new();
    let mut body = app.notification_body();
    body["required_acknowledgers"] = json!([app.player(0).user_id, app.player(1).user_id]);
    body["escalation_policy"] = json!([
        {"delay_minutes": 0, "target_users": [app.coach.user_id]},
        {"delay_minutes": 10, "target_roles": ["medical_staff"]}
    ]);
    let id = app.create(body).await;

    let response = app.ack(app.player(0), id).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["fully_acknowledged"], false);

    assert_eq!(app.advance_and_fire(15).await, 1);
    let detail = app.detail(id).await;
    assert_eq!(
        detail["escalations"][0]["reason"],
        "insufficient_acknowledgments"
    );

    let response = app.ack(app.player(1), id).await;
    assert_eq!(response.body["data"]["status"], "acknowledged");
    assert_eq!(response.body["data"]["fully_acknowledged"], true);

    assert_eq!(app.advance_and_fire(30).await, 0);
    let detail = app.detail(id).await;
    assert_eq!(detail["notification"]["escalation_level"], 1);
    assert_eq!(detail["escalations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_manual_escalation_and_policy_no_op() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;
    let path = format!("/api/notifications/{id}/escalate");

    let response = app
        .request("POST", &path, Some(json!({})), Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["data"]["escalation"]["level"], 1);
    assert_eq!(response.body["data"]["escalation"]["reason"], "manual");
    assert_eq!(
        response.body["data"]["escalation"]["triggered_by"],
        app.medic.user_id.to_string()
    );

    // No second level in the policy: a timer-style reason does nothing.
    let response = app
        .request("POST", &path, Some(json!({"reason": "timeout"})), Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"].is_null());

    // The level-1 timer was superseded by the manual escalation.
    assert_eq!(app.advance_and_fire(60).await, 0);
    assert_eq!(app.detail(id).await["notification"]["escalation_level"], 1);
}

#[tokio::test]
async fn test_manual_escalation_requires_medical_role() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;

    let response = app
        .request(
            "POST",
            &format!("/api/notifications/{id}/escalate"),
            Some(json!({})),
            Some(&app.coach),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "FORBIDDEN");
}

#[tokio::test]
async fn test_escalating_a_resolved_notification_is_rejected() {
    let app = TestApp::new();
    let id = app.create(app.notification_body()).await;
    let response = app
        .request(
            "POST",
            &format!("/api/notifications/{id}/resolve"),
            Some(json!({"notes": "Cleared by physician"})),
            Some(&app.admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            &format!("/api/notifications/{id}/escalate"),
            Some(json!({})),
            Some(&app.medic),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_FINAL");
}
