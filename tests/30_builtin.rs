mod common;

use axum::http::StatusCode;
use common::{bearer_request, json_request, read_json};
use seedler_api::access::AccessLevel;
use seedler_api::auth::{generate_jwt, Claims};
use seedler_api::{build_router, handlers, AppConfig, AppState};
use serde_json::json;
use tower::ServiceExt;

fn app() -> axum::Router {
    let registry = handlers::builtin_registry().unwrap();
    build_router(AppState::new(AppConfig::development(), registry))
}

fn token(level: AccessLevel) -> String {
    let claims = Claims::new("k-42".into(), "hazel".into(), level, 1);
    generate_jwt(&claims, &AppConfig::development().security).unwrap()
}

#[tokio::test]
async fn echo_keeps_caller_keys_apart_from_metadata() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/system/echo",
            json!({ "method": "dropAll", "user": { "access_level": "system" } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["body"]["method"], "echo");
    assert_eq!(body["body"]["body"]["method"], "dropAll");
    assert_eq!(body["body"]["body"]["user"]["access_level"], "system");
}

#[tokio::test]
async fn get_info_reports_resolution() {
    let response = app()
        .oneshot(json_request("POST", "/api/v1/system/get/info", json!({})))
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["code"], "SUCCESS");
    assert_eq!(body["body"]["method"], "getInfo");
    assert_eq!(body["body"]["version"], "v1");
    assert_eq!(body["body"]["httpMethod"], "POST");
    assert_eq!(body["body"]["authenticated"], false);
}

#[tokio::test]
async fn whoami_returns_token_identity() {
    let response = app()
        .oneshot(bearer_request(
            "GET",
            "/api/v1/keepers/whoami",
            &token(AccessLevel::Keeper),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(
        body["body"],
        json!({ "id": "k-42", "username": "hazel", "access_level": "keeper" })
    );
}

#[tokio::test]
async fn whoami_requires_identity() {
    let response = app()
        .oneshot(json_request("GET", "/api/v1/keepers/whoami", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn support_desk_needs_support_level() {
    let response = app()
        .oneshot(bearer_request(
            "GET",
            "/api/v1/keepers/get/support",
            &token(AccessLevel::Keeper),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(bearer_request(
            "GET",
            "/api/v1/keepers/get/support",
            &token(AccessLevel::Root),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["body"]["agent"], "hazel");
}

#[tokio::test]
async fn tenure_privileges_compare_on_their_own_scale() {
    let response = app()
        .oneshot(bearer_request(
            "POST",
            "/api/v1/tenures/checkPrivilege",
            &token(AccessLevel::Keeper),
            json!({ "privilege": "surveyor", "required": "watcher" }),
        ))
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["body"]["allowed"], true);

    let response = app()
        .oneshot(bearer_request(
            "POST",
            "/api/v1/tenures/check_privilege",
            &token(AccessLevel::Keeper),
            json!({ "privilege": "watcher", "required": "landowner" }),
        ))
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["body"]["allowed"], false);
}

#[tokio::test]
async fn tenure_check_rejects_unknown_privileges() {
    let response = app()
        .oneshot(bearer_request(
            "POST",
            "/api/v1/tenures/checkPrivilege",
            &token(AccessLevel::Keeper),
            json!({ "privilege": "ranger", "required": "watcher" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "INVALID_BODY");
    assert_eq!(body["body"]["field"], "privilege");
}

#[tokio::test]
async fn invalid_token_is_rejected_with_envelope() {
    let response = app()
        .oneshot(bearer_request("GET", "/api/v1/system/ping", "not-a-jwt", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert_eq!(read_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_body_is_invalid() {
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/system/echo")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{broken"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "INVALID_BODY");
}

#[tokio::test]
async fn root_lists_registered_methods() {
    let response = app()
        .oneshot(
            axum::http::Request::builder()
                .uri("/")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let methods = body["methods"].as_array().unwrap();
    assert!(methods.iter().any(|m| {
        m["api_name"] == "keepers"
            && m["method_name"] == "getSupport"
            && m["effective_level"] == "support"
    }));
}
