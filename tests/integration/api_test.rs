//! Vocabulary and health endpoints.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_needs_no_identity() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["store"], "memory");
    assert!(response.body["data"].get("database_reachable").is_none());
}

#[tokio::test]
async fn test_vocabulary_listing() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/vocabulary", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let kinds: Vec<_> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds.len(), 7);
    assert!(kinds.contains(&"escalation_reasons".to_string()));

    let response = app
        .request("GET", "/api/vocabulary/urgency_levels", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["values"],
        serde_json::json!(["urgent", "critical", "emergency"])
    );

    let response = app.request("GET", "/api/vocabulary/colours", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();
    let response = app
        .request("GET", "/api/nothing-here", None, Some(&app.medic))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
