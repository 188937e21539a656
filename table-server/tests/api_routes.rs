//! HTTP 路由测试 (tower oneshot, 不监听端口)

mod common;

use axum::Router;
use axum::body::Body;
use common::*;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use table_server::api::build_app;
use table_server::auth::StaffRole;
use tower::ServiceExt;

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_and_request_id() {
    let env = setup();
    let app = build_app(&env.state);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_scan_session_and_order_over_http() {
    let env = setup();
    let app = build_app(&env.state);

    let (status, body) = send(&app, "POST", "/api/scan", None, Some(json!({ "salt": SALT_T1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "started");
    let token = body["session"]["token"].as_str().unwrap().to_string();
    let passphrase = body["session"]["passphrase"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passphrase"], passphrase.as_str());
    assert_eq!(body["table_id"], "t1");

    let draft = json!({
        "items": [
            { "menu_item_id": "soup", "quantity": 1 },
            { "menu_item_id": "soup", "quantity": 2 }
        ]
    });
    let (status, body) = send(&app, "POST", "/api/orders", Some(&token), Some(draft)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_price"], 15.0);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    let order_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/tables/t1/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}/status"),
        Some(&token),
        Some(json!({ "status": "closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], shared::ErrorCode::OrderTransitionUnavailable.code());
}

#[tokio::test]
async fn test_passphrase_prompt_over_http() {
    let env = setup();
    let app = build_app(&env.state);

    send(&app, "POST", "/api/scan", None, Some(json!({ "salt": SALT_T1 }))).await;
    let (status, body) = send(&app, "POST", "/api/scan", None, Some(json!({ "salt": SALT_T1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "passphrase_required");
    assert!(body.get("session").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/api/scan",
        None,
        Some(json!({ "salt": SALT_T1, "passphrase": "ZZZZZZ" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staff_endpoints_require_staff() {
    let env = setup();
    let app = build_app(&env.state);

    let (status, _) = send(&app, "GET", "/api/tables", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/tables", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = env.staff_token(StaffRole::Manager, "place-1", "biz-1");
    let (status, body) = send(&app, "GET", "/api/tables", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let tables = body.as_array().unwrap();
    assert_eq!(tables.len(), 3);
    assert!(tables.iter().all(|t| t.get("salt").is_none()));
}

#[tokio::test]
async fn test_staff_table_management_over_http() {
    let env = setup();
    let app = build_app(&env.state);
    let token = env.staff_token(StaffRole::Manager, "place-1", "biz-1");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/tables/t2/disabled",
        Some(&token),
        Some(json!({ "disabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["disabled"], true);

    let (status, _) = send(&app, "POST", "/api/scan", None, Some(json!({ "salt": SALT_T2 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/tables/t2/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["type"], "staff_needed");

    let (status, _) = send(&app, "DELETE", "/api/tables/t2/notifications", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/api/tables/t2/notifications", Some(&token), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(&app, "POST", "/api/tables/t1/salt", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["salt"], SALT_T1);

    // Other place's table
    let (status, _) = send(&app, "POST", "/api/tables/t9/salt", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_free_table_over_http() {
    let env = setup();
    let app = build_app(&env.state);
    let token = env.staff_token(StaffRole::Waiter, "place-1", "biz-1");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/tables/status",
        Some(&token),
        Some(json!({ "salt": SALT_T1, "status": "reserved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Bool(true));
    assert_eq!(env.table("t1").status, shared::models::TableStatus::Reserved);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/tables/status",
        None,
        Some(json!({ "salt": SALT_T1, "status": "empty" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
