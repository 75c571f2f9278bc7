//! HTTP Adapter Tests
//!
//! Tests for the object-storage and identity-provider REST clients against
//! mock servers.

use bytes::Bytes;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fb_platform::service::{AuthGateway, HttpAuthConfig, HttpAuthGateway};
use fb_platform::storage::{HttpPosterStorage, HttpStorageConfig, ObjectInfo, PosterStorage};
use fb_platform::PlatformError;

fn storage_for(server: &MockServer) -> HttpPosterStorage {
    HttpPosterStorage::new(HttpStorageConfig {
        base_url: server.uri(),
        service_key: "service-key".into(),
        bucket: "event-posters".into(),
    })
}

fn auth_for(server: &MockServer) -> HttpAuthGateway {
    HttpAuthGateway::new(HttpAuthConfig {
        base_url: server.uri(),
        anon_key: "anon-key".into(),
    })
}

fn token_body(user_id: Uuid) -> serde_json::Value {
    json!({
        "access_token": "access-1",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-1",
        "user": { "id": user_id, "email": "coach@example.com", "aud": "authenticated" }
    })
}

// ============================================================================
// Poster Storage
// ============================================================================

#[tokio::test]
async fn test_upload_sends_headers_and_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/event-posters/u1/e1-17.png"))
        .and(header("authorization", "Bearer service-key"))
        .and(header("apikey", "service-key"))
        .and(header("x-upsert", "false"))
        .and(header("cache-control", "max-age=3600"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "event-posters/u1/e1-17.png" })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = storage_for(&server);
    let url = storage
        .upload("u1/e1-17.png", Bytes::from_static(b"png"), "image/png")
        .await
        .unwrap();

    assert_eq!(
        url,
        format!("{}/storage/v1/object/public/event-posters/u1/e1-17.png", server.uri())
    );
}

#[tokio::test]
async fn test_upload_conflict_is_storage_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusCode": "409",
            "error": "Duplicate",
            "message": "The resource already exists"
        })))
        .mount(&server)
        .await;

    let err = storage_for(&server)
        .upload("u1/p.png", Bytes::from_static(b"png"), "image/png")
        .await
        .unwrap_err();

    match err {
        PlatformError::Storage { message } => assert_eq!(message, "The resource already exists"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_sends_prefixes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/event-posters"))
        .and(body_json(json!({ "prefixes": ["u1/p.png"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    storage_for(&server).delete("u1/p.png").await.unwrap();
}

#[tokio::test]
async fn test_object_info_reads_reported_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/info/event-posters/u1/flat.png"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "u1/flat.png",
            "size": 2048,
            "content_type": "image/png"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/info/event-posters/u1/nested.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "u1/nested.gif",
            "metadata": { "size": 80000000, "mimetype": "image/gif" }
        })))
        .mount(&server)
        .await;

    let storage = storage_for(&server);
    let flat = storage.object_info("u1/flat.png").await.unwrap().unwrap();
    assert_eq!(flat, ObjectInfo { size: 2048, content_type: "image/png".into() });

    let nested = storage.object_info("u1/nested.gif").await.unwrap().unwrap();
    assert_eq!(nested, ObjectInfo { size: 80_000_000, content_type: "image/gif".into() });
}

#[tokio::test]
async fn test_object_info_missing_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/info/event-posters/u1/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/info/event-posters/u1/legacy.png"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": "404",
            "error": "not_found",
            "message": "Object not found"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/object/info/event-posters/u1/broken.png"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "backend down" })))
        .mount(&server)
        .await;

    let storage = storage_for(&server);
    assert!(storage.object_info("u1/gone.png").await.unwrap().is_none());
    assert!(storage.object_info("u1/legacy.png").await.unwrap().is_none());
    let err = storage.object_info("u1/broken.png").await.unwrap_err();
    assert!(matches!(err, PlatformError::Storage { .. }));
}

// ============================================================================
// Auth Gateway
// ============================================================================

#[tokio::test]
async fn test_sign_in_returns_session() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({ "email": "coach@example.com", "password": "password123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(user_id)))
        .mount(&server)
        .await;

    let session = auth_for(&server)
        .sign_in("coach@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(session.expires_in, 3600);
    assert_eq!(session.user.id, user_id);
}

#[tokio::test]
async fn test_sign_in_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let err = auth_for(&server).sign_in("coach@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, PlatformError::InvalidCredentials));
}

#[tokio::test]
async fn test_sign_up_pending_confirmation() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id,
            "email": "coach@example.com",
            "confirmation_sent_at": "2026-06-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let outcome = auth_for(&server)
        .sign_up("coach@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(outcome.user.id, user_id);
    assert!(outcome.session.is_none());
}

#[tokio::test]
async fn test_sign_up_autoconfirmed_returns_session() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(user_id)))
        .mount(&server)
        .await;

    let outcome = auth_for(&server)
        .sign_up("coach@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(outcome.user.id, user_id);
    assert_eq!(outcome.session.unwrap().access_token, "access-1");
}

#[tokio::test]
async fn test_sign_up_provider_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "msg": "User already registered"
        })))
        .mount(&server)
        .await;

    let err = auth_for(&server)
        .sign_up("coach@example.com", "password123")
        .await
        .unwrap_err();
    match err {
        PlatformError::AuthProvider { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "User already registered");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_current_user_with_bearer_token() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id,
            "email": "coach@example.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "invalid JWT" })))
        .mount(&server)
        .await;

    let auth = auth_for(&server);
    let user = auth.current_user("access-1").await.unwrap().unwrap();
    assert_eq!(user.id, user_id);
    assert!(auth.current_user("expired").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sign_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    auth_for(&server).sign_out("access-1").await.unwrap();
}
