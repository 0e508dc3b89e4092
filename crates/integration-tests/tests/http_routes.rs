//! Router tests driven through `tower::ServiceExt::oneshot`.
//!
//! The database pool points at a closed port, so these cover routing,
//! middleware and error mapping up to the point a handler needs storage.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use qacart_integration_tests::{test_config, unreachable_pool};
use qacart_storefront::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    qacart_storefront::app(AppState::new(test_config(), unreachable_pool()))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", "198.51.100.7")
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_without_database() {
    let response = app().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_malformed_code_is_invalid_without_touching_storage() {
    let response = app()
        .oneshot(get("/api/certificates/verify/not-a-code"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["isValid"], Value::Bool(false));
    assert!(body.get("certificate").is_none());
    assert_eq!(body["message"], "No valid certificate matches this code");
}

#[tokio::test]
async fn test_progress_requires_sign_in() {
    let response = app()
        .oneshot(get("/api/courses/playwright/progress"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["error"], "sign in required");
}

#[tokio::test]
async fn test_claim_requires_sign_in() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/courses/playwright/certificate")
        .header("x-forwarded-for", "198.51.100.7")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"studentName":"Sara Ali"}"#))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-7f3a")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "edge-7f3a");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app().oneshot(get("/api/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsigned_session_cookie_is_ignored() {
    // A well-formed session ID without a signature never reaches the store,
    // which here would fail the request instead of answering 401.
    let request = Request::builder()
        .uri("/api/courses/playwright/progress")
        .header("x-forwarded-for", "198.51.100.7")
        .header("cookie", "qacart_session=AAAAAAAAAAAAAAAAAAAAAA")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
