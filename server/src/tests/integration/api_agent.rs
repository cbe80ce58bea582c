use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::tests::{fixtures, response_json, test_app};

fn audit_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "data": {
            "hostname": "FIN-PC-042",
            "softwares": [
                {"Name": "Google Chrome", "Version": "126.0.6478.127"},
                {"Name": "7-Zip", "Version": "23.01"}
            ],
            "model": "OptiPlex 7090",
            "os": "Windows 11 Pro",
            "serialNumber": "8HJK2L3"
        }
    }))
    .unwrap()
}

fn audit_request(org_id: Option<&str>, api_key: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/api/v1/agent/audit")
        .method("POST")
        .header("content-type", "application/json");
    if let Some(org_id) = org_id {
        builder = builder.header("x-org-id", org_id);
    }
    if let Some(api_key) = api_key {
        builder = builder.header("x-api-key", api_key);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_audit_rejects_non_post() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/api/v1/agent/audit")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_audit_without_credentials_is_unauthorized() {
    let app = test_app().await;
    let org_id = Uuid::new_v4().to_string();

    let no_headers = app
        .router
        .clone()
        .oneshot(audit_request(None, None, audit_body()))
        .await
        .unwrap();
    assert_eq!(no_headers.status(), StatusCode::UNAUTHORIZED);

    let no_key = app
        .router
        .clone()
        .oneshot(audit_request(Some(&org_id), None, audit_body()))
        .await
        .unwrap();
    assert_eq!(no_key.status(), StatusCode::UNAUTHORIZED);

    let bad_uuid = app
        .router
        .oneshot(audit_request(Some("not-a-uuid"), Some("upk_x"), audit_body()))
        .await
        .unwrap();
    assert_eq!(bad_uuid.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_audit_auth_failure_wins_over_bad_payload() {
    let app = test_app().await;

    let response = app
        .router
        .oneshot(audit_request(None, None, b"not json at all".to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_audit_unknown_org_is_forbidden() {
    let app = test_app().await;
    let org_id = Uuid::new_v4().to_string();

    let response = app
        .router
        .oneshot(audit_request(Some(&org_id), Some("upk_whatever"), audit_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_audit_wrong_or_missing_key_is_forbidden() {
    let app = test_app().await;
    let org = fixtures::org_with_key("upk_right");
    let keyless = {
        let mut o = fixtures::org();
        o.agent_api_key = None;
        o
    };
    app.store.insert_organization(org.clone());
    app.store.insert_organization(keyless.clone());

    let wrong_key = app
        .router
        .clone()
        .oneshot(audit_request(
            Some(&org.id.to_string()),
            Some("upk_wrong"),
            audit_body(),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_key.status(), StatusCode::FORBIDDEN);

    let unprovisioned = app
        .router
        .oneshot(audit_request(
            Some(&keyless.id.to_string()),
            Some("upk_right"),
            audit_body(),
        ))
        .await
        .unwrap();
    assert_eq!(unprovisioned.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_audit_malformed_json_is_bad_request() {
    let app = test_app().await;
    let org = fixtures::org_with_key("upk_right");
    app.store.insert_organization(org.clone());

    let response = app
        .router
        .oneshot(audit_request(
            Some(&org.id.to_string()),
            Some("upk_right"),
            b"{broken".to_vec(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_missing_data_or_hostname_is_bad_request() {
    let app = test_app().await;
    let org = fixtures::org_with_key("upk_right");
    app.store.insert_organization(org.clone());
    let org_id = org.id.to_string();

    let no_data = serde_json::to_vec(&json!({"unexpected": true})).unwrap();
    let response = app
        .router
        .clone()
        .oneshot(audit_request(Some(&org_id), Some("upk_right"), no_data))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let no_hostname = serde_json::to_vec(&json!({"data": {"model": "OptiPlex"}})).unwrap();
    let response = app
        .router
        .oneshot(audit_request(Some(&org_id), Some("upk_right"), no_hostname))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(app.store.assets().is_empty());
}

#[tokio::test]
async fn test_audit_success_registers_asset_and_returns_its_id() {
    let app = test_app().await;
    let org = fixtures::org_with_key("upk_right");
    app.store.insert_organization(org.clone());

    let response = app
        .router
        .oneshot(audit_request(
            Some(&org.id.to_string()),
            Some("upk_right"),
            audit_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    let asset_id = Uuid::parse_str(body["assetId"].as_str().unwrap()).unwrap();

    let assets = app.store.assets();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].id, asset_id);
    assert_eq!(assets[0].name, "FIN-PC-042");
    assert_eq!(assets[0].org_id, org.id);
}

#[tokio::test]
async fn test_audit_updates_an_already_known_asset() {
    let app = test_app().await;
    let org = fixtures::org_with_key("upk_right");
    app.store.insert_organization(org.clone());
    let existing = fixtures::asset(org.id, "FIN-PC-042", "desktop", "active");
    let existing_id = existing.id;
    app.store.insert_asset(existing);

    let response = app
        .router
        .oneshot(audit_request(
            Some(&org.id.to_string()),
            Some("upk_right"),
            audit_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["assetId"].as_str().unwrap(), existing_id.to_string());
    assert_eq!(app.store.assets().len(), 1);
}
