//! Common test utilities

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ledgerd::store::AtomicityMode;
use ledgerd::{api, build_wallet};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::util::ServiceExt;

/// Build the full application over a fresh in-memory wallet with the
/// default initial balance of 100.00.
pub fn test_app() -> Router {
    test_app_with_mode(AtomicityMode::Transactional)
}

pub fn test_app_with_mode(mode: AtomicityMode) -> Router {
    api::app(build_wallet(dec!(100), mode))
}

/// Fire one request at the app and return status plus parsed body.
/// Non-JSON bodies (e.g. the health check) come back as a JSON string.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

/// Create an account and return its id, asserting success.
pub async fn create_account(app: &Router, name: &str, email: &str, initial: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/v1/accounts",
        Some(json!({
            "name": name,
            "email": email,
            "initial_balance": initial,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "account creation failed: {body}");
    body["id"].as_str().unwrap().to_string()
}

/// Fetch an account's balance as the raw JSON string value.
pub async fn balance_of(app: &Router, account_id: &str) -> String {
    let (status, body) = request(
        app,
        "GET",
        &format!("/api/v1/accounts/{account_id}/balance"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "balance read failed: {body}");
    body["balance"].as_str().unwrap().to_string()
}
