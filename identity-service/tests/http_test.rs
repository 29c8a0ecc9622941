//! HTTP surface tests driven through the router with `tower::ServiceExt`.

mod common;

use common::TestApp;
use http_body_util::BodyExt;
use identity_service::services::TokenGenerator;
use serde_json::{json, Value};
use service_core::axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

fn magic_link_body(redirect_url: &str) -> Value {
    json!({
        "apiKey": "key1234567",
        "emailTo": "User@Example.com",
        "emailFrom": "noreply@example.com",
        "redirectUrl": redirect_url,
        "metadata": { "expirationMinutes": 5, "emailBody": "Click to sign in" }
    })
}

async fn issue_token(app: &TestApp) -> String {
    let (status, body) = send(
        app.router(),
        post_json("/v1/magiclink/verify", magic_link_body("https://app.example/cb")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let link = body["magic_link"].as_str().expect("magic_link present");
    link.split("?token=")
        .nth(1)
        .expect("token query parameter")
        .to_string()
}

#[tokio::test]
async fn create_account_returns_201_with_tenant_slug() {
    let app = TestApp::new();
    let (status, body) = send(
        app.router(),
        post_json(
            "/v1/account/new",
            json!({ "name": "  Acme Corp ", "email": "Owner@Acme.test" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Acme Corp");
    assert_eq!(body["email"], "owner@acme.test");
    assert_eq!(body["status"], "active");
    assert_eq!(body["tenant_slug"].as_str().unwrap().split('-').count(), 3);
    assert_eq!(app.row_counts(), (1, 1, 1));
}

#[tokio::test]
async fn duplicate_account_email_returns_409() {
    let app = TestApp::new();
    let body = json!({ "name": "Acme", "email": "owner@acme.test" });

    let (first, _) = send(app.router(), post_json("/v1/account/new", body.clone())).await;
    assert_eq!(first, StatusCode::CREATED);

    let (status, error) = send(app.router(), post_json("/v1/account/new", body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "unique_conflict");
    assert_eq!(app.row_counts(), (1, 1, 1));
}

#[tokio::test]
async fn account_name_with_markup_returns_400() {
    let app = TestApp::new();
    let (status, error) = send(
        app.router(),
        post_json(
            "/v1/account/new",
            json!({ "name": "<script>", "email": "owner@acme.test" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_input");
    assert_eq!(app.row_counts(), (0, 0, 0));
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/account/new")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, error) = send(app.router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_input");
}

#[tokio::test]
async fn magic_link_request_returns_link_and_normalized_recipients() {
    let app = TestApp::new();
    let (status, body) = send(
        app.router(),
        post_json("/v1/magiclink/verify", magic_link_body("https://app.example/cb")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Magic link generated successfully");
    assert!(body["magic_link"]
        .as_str()
        .unwrap()
        .starts_with("https://app.example/cb?token="));
    assert_eq!(body["email_to"], "user@example.com");
    assert_eq!(body["email_body"], "Click to sign in");
}

#[tokio::test]
async fn magic_link_to_private_network_returns_400() {
    let app = TestApp::new();
    let (status, error) = send(
        app.router(),
        post_json("/v1/magiclink/verify", magic_link_body("http://192.168.1.10/cb")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_input");
}

#[tokio::test]
async fn callback_redeems_once_then_reports_already_used() {
    let app = TestApp::new();
    let token = issue_token(&app).await;
    let uri = format!("/v1/magiclink/callback?token={}", token);

    let (status, body) = send(app.router(), get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 86400);

    let claims = app
        .state
        .assertions
        .verify(body["access_token"].as_str().unwrap())
        .expect("assertion verifies");
    let stored = app.store.magic_link(claims.sub.parse().unwrap()).unwrap();
    assert!(stored.expect("link stored").used_at.is_some());

    let (status, error) = send(app.router(), get(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["code"], "already_used");
}

#[tokio::test]
async fn callback_ignores_whitespace_around_the_token() {
    let app = TestApp::new();
    let token = issue_token(&app).await;

    let (status, body) = send(
        app.router(),
        get(&format!("/v1/magiclink/callback?token=%20{}%20", token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn callback_for_expired_link_returns_401_expired() {
    let app = TestApp::new();
    let token = issue_token(&app).await;
    app.clock.advance(chrono::Duration::minutes(6));

    let (status, error) = send(
        app.router(),
        get(&format!("/v1/magiclink/callback?token={}", token)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["code"], "expired");
}

#[tokio::test]
async fn callback_with_unknown_or_short_token_is_rejected() {
    let app = TestApp::new();

    let (status, error) = send(
        app.router(),
        get(&format!(
            "/v1/magiclink/callback?token={}",
            TokenGenerator.generate()
        )),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "not_found");

    let (status, error) = send(app.router(), get("/v1/magiclink/callback?token=short")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_input");

    let (status, _) = send(app.router(), get("/v1/magiclink/callback")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_store_status() {
    let app = TestApp::new();
    let (status, body) = send(app.router(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "identity-service-test");
    assert_eq!(body["checks"]["store"], "up");
}

#[tokio::test]
async fn openapi_document_lists_all_routes() {
    let app = TestApp::new();
    let (status, body) = send(app.router(), get("/.well-known/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    for path in [
        "/health",
        "/v1/account/new",
        "/v1/magiclink/verify",
        "/v1/magiclink/callback",
    ] {
        assert!(body["paths"].get(path).is_some(), "missing {}", path);
    }
}

#[tokio::test]
async fn responses_carry_request_id_and_hardening_headers() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-abc")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-abc");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}
