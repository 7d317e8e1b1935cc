//! Compliance reporting endpoint.

use http::StatusCode;

use crate::helpers::TestApp;

const WINDOW: &str = "start=2026-05-04T13:00:00Z&end=2026-05-04T16:00:00Z";

#[tokio::test]
async fn test_report_aggregates_window() {
    let app = TestApp::new();
    let answered = app.create(app.notification_body()).await;
    let ignored = app.create(app.notification_body()).await;

    assert_eq!(app.ack(app.player(0), answered).await.status, StatusCode::CREATED);
    assert_eq!(app.advance_and_fire(15).await, 1);
    assert_eq!(
        app.detail(ignored).await["notification"]["status"],
        "escalated"
    );

    let response = app
        .request(
            "GET",
            &format!("/api/compliance/report?{WINDOW}"),
            None,
            Some(&app.admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let report = &response.body["data"];
    assert_eq!(report["total_notifications"], 2);
    assert_eq!(report["by_urgency"]["critical"], 2);
    assert_eq!(report["by_status"]["acknowledged"], 1);
    assert_eq!(report["by_status"]["escalated"], 1);
    assert_eq!(report["total_acknowledgments"], 1);
    assert_eq!(report["average_response_time_seconds"], 0.0);
    assert_eq!(report["acknowledgment_rate"], 0.5);
    assert_eq!(report["total_escalations"], 1);
    assert_eq!(report["escalations_by_reason"]["no_acknowledgment"], 1);
    assert!(report["recommendations"].is_array());
}

#[tokio::test]
async fn test_report_scoped_to_organization_and_window() {
    let app = TestApp::new();
    app.create(app.notification_body()).await;

    let response = app
        .request(
            "GET",
            &format!("/api/compliance/report?{WINDOW}"),
            None,
            Some(&app.outsider),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total_notifications"], 0);
    assert_eq!(response.body["data"]["acknowledgment_rate"], 0.0);
    assert_eq!(
        response.body["data"]["recommendations"].as_array().map(Vec::len),
        Some(0)
    );

    let response = app
        .request(
            "GET",
            "/api/compliance/report?start=2026-05-05T00:00:00Z&end=2026-05-06T00:00:00Z",
            None,
            Some(&app.medic),
        )
        .await;
    assert_eq!(response.body["data"]["total_notifications"], 0);
}

#[tokio::test]
async fn test_report_rejects_bad_requests() {
    let app = TestApp::new();

    let response = app
        .request(
            "GET",
            &format!("/api/compliance/report?{WINDOW}"),
            None,
            Some(&app.coach),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "GET",
            "/api/compliance/report?start=2026-05-04T16:00:00Z&end=2026-05-04T13:00:00Z",
            None,
            Some(&app.medic),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}
