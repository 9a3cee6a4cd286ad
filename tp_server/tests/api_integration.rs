//! Integration tests for the HTTP API over the in-memory room store.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use serde_json::{Value, json};
use std::sync::Arc;
use teen_patti::{RoomConfig, RoomEngine, db::MemoryRoomStore, notify::ChannelHub, room::UserId};
use tower::ServiceExt; // For `oneshot` method
use tp_server::api::{self, AppState, IdentityVerifier, identity::AccessTokenClaims};

const SECRET: &str = "test_secret_key_for_testing_only_32b";

struct TestServer {
    app: axum::Router,
    store: Arc<MemoryRoomStore>,
}

impl TestServer {
    fn new() -> Self {
        let store = Arc::new(MemoryRoomStore::new());
        let hub = Arc::new(ChannelHub::default());
        let engine = RoomEngine::new(store.clone(), hub.clone(), RoomConfig::default());
        let state = AppState {
            engine: Arc::new(engine),
            store: store.clone(),
            hub,
            identity: Arc::new(IdentityVerifier::new(SECRET)),
        };
        Self {
            app: api::create_router(state),
            store,
        }
    }

    async fn funded(self, users: &[UserId], balance: i64) -> Self {
        for &user in users {
            self.store.set_balance(user, balance).await;
        }
        self
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn post(&self, user: UserId, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token(user)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn get(&self, user: UserId, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token(user)))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}

fn token(user: UserId) -> String {
    let now = get_current_timestamp() as i64;
    let claims = AccessTokenClaims {
        sub: user,
        exp: now + 900,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

// ============================================================================
// Health & Auth
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let server = TestServer::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = server.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let server = TestServer::new();
    let request = Request::builder()
        .uri("/api/v1/rooms")
        .body(Body::empty())
        .unwrap();

    let (status, body) = server.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_forged_token_is_unauthorized() {
    let server = TestServer::new();
    let forged = encode(
        &Header::default(),
        &AccessTokenClaims {
            sub: 1,
            exp: get_current_timestamp() as i64 + 900,
            iat: 0,
        },
        &EncodingKey::from_secret(b"another_secret_that_is_long_enough"),
    )
    .unwrap();
    let request = Request::builder()
        .uri("/api/v1/rooms")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();

    let (status, _) = server.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Room Endpoints
// ============================================================================

#[tokio::test]
async fn test_create_and_join_private_room() {
    let server = TestServer::new().funded(&[1, 2], 100).await;

    let (status, created) = server
        .post(1, "/api/v1/rooms/private", json!({ "stake": 10 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["room"]["kind"], "private");
    assert_eq!(created["room"]["capacity"], 7);
    assert_eq!(created["room"]["pot_limit"], 40);
    assert_eq!(created["room"]["display_threshold"], 300);
    assert_eq!(created["members"].as_array().unwrap().len(), 1);

    let code = created["room"]["join_code"].as_str().unwrap().to_lowercase();
    let (status, joined) = server
        .post(2, "/api/v1/rooms/private/join", json!({ "code": code }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["room"]["id"], created["room"]["id"]);
    assert_eq!(joined["room"]["member_count"], 2);
}

#[tokio::test]
async fn test_unknown_code_is_not_found() {
    let server = TestServer::new().funded(&[1], 100).await;

    let (status, body) = server
        .post(1, "/api/v1/rooms/private/join", json!({ "code": "ZZZZZZ" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_insufficient_balance_is_bad_request() {
    let server = TestServer::new().funded(&[1], 5).await;

    let (status, _) = server
        .post(1, "/api/v1/rooms/public", json!({ "stake": 10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No wallet at all behaves like a zero balance
    let (status, _) = server
        .post(99, "/api/v1/rooms/public", json!({ "stake": 10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_room_is_conflict() {
    let server = TestServer::new().funded(&[1], 100).await;

    let (status, _) = server
        .post(1, "/api/v1/rooms/public", json!({ "stake": 10 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .post(1, "/api/v1/rooms/private", json!({ "stake": 10 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_public_matchmaking_shares_room() {
    let server = TestServer::new().funded(&[1, 2], 100).await;

    let (_, first) = server
        .post(1, "/api/v1/rooms/public", json!({ "stake": 20 }))
        .await;
    let (_, second) = server
        .post(2, "/api/v1/rooms/public", json!({ "stake": 20 }))
        .await;

    assert_eq!(first["room"]["id"], second["room"]["id"]);
    assert_eq!(second["room"]["capacity"], 5);
    assert_eq!(second["room"]["member_count"], 2);
}

#[tokio::test]
async fn test_leave_room() {
    let server = TestServer::new().funded(&[1], 100).await;

    let (_, created) = server
        .post(1, "/api/v1/rooms/private", json!({ "stake": 10 }))
        .await;
    let (status, left) = server.post(1, "/api/v1/rooms/leave", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(left["room"]["member_count"], 0);
    assert_eq!(left["room"]["is_active"], false);

    let uri = format!("/api/v1/rooms/{}", created["room"]["id"]);
    let (status, _) = server.get(1, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.post(1, "/api/v1/rooms/leave", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_game_collects_and_deals() {
    let server = TestServer::new().funded(&[1, 2], 100).await;

    let (_, created) = server
        .post(1, "/api/v1/rooms/private", json!({ "stake": 10 }))
        .await;
    let code = created["room"]["join_code"].as_str().unwrap().to_string();
    server
        .post(2, "/api/v1/rooms/private/join", json!({ "code": code }))
        .await;

    let uri = format!("/api/v1/rooms/{}/start", created["room"]["id"]);
    let (status, body) = server.post(1, &uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_collected"], 20);
    assert_eq!(body["room"]["status"], "running");
    assert_eq!(body["hands"].as_array().unwrap().len(), 2);
    for dealt in body["hands"].as_array().unwrap() {
        assert_eq!(dealt["hand"].as_array().unwrap().len(), 3);
    }

    assert_eq!(server.store.balance_of(1).await, Some(90));
    assert_eq!(server.store.balance_of(2).await, Some(90));

    // Already running
    let (status, _) = server.post(2, &uri, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_start_game_needs_quorum() {
    let server = TestServer::new().funded(&[1], 100).await;

    let (_, created) = server
        .post(1, "/api/v1/rooms/private", json!({ "stake": 10 }))
        .await;
    let uri = format!("/api/v1/rooms/{}/start", created["room"]["id"]);

    let (status, _) = server.post(1, &uri, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(server.store.balance_of(1).await, Some(100));
}

#[tokio::test]
async fn test_start_game_by_outsider_is_not_found() {
    let server = TestServer::new().funded(&[1, 3], 100).await;

    let (_, created) = server
        .post(1, "/api/v1/rooms/private", json!({ "stake": 10 }))
        .await;
    let uri = format!("/api/v1/rooms/{}/start", created["room"]["id"]);

    let (status, _) = server.post(3, &uri, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_rooms_filters() {
    let server = TestServer::new().funded(&[1, 2, 3], 100).await;

    server
        .post(1, "/api/v1/rooms/private", json!({ "stake": 10 }))
        .await;
    server
        .post(2, "/api/v1/rooms/public", json!({ "stake": 10 }))
        .await;
    server
        .post(3, "/api/v1/rooms/public", json!({ "stake": 50 }))
        .await;

    let (status, all) = server.get(1, "/api/v1/rooms").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, public) = server.get(1, "/api/v1/rooms?kind=public").await;
    assert_eq!(public.as_array().unwrap().len(), 2);

    let (_, stake) = server.get(1, "/api/v1/rooms?kind=public&stake=50").await;
    assert_eq!(stake.as_array().unwrap().len(), 1);

    let (_, paged) = server.get(1, "/api/v1/rooms?page=2&rows=2").await;
    assert_eq!(paged.as_array().unwrap().len(), 1);
}
