//! HTTP/WebSocket API for the room server.
//!
//! # Modules
//!
//! - [`rooms`]: Room creation, matchmaking, joining, leaving, starting and listing
//! - [`websocket`]: Push channel delivering room events
//! - [`middleware`]: Authentication middleware for protected endpoints
//! - [`identity`]: Verification of bearer tokens from the identity service
//! - [`errors`]: Mapping of engine errors onto HTTP status codes
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                          - Health check (public)
//! GET  /ws?token=<jwt>                  - Event push channel
//! POST /api/v1/rooms/private            - Create private room   {stake}
//! POST /api/v1/rooms/public             - Join public room      {stake}
//! POST /api/v1/rooms/private/join       - Join by code          {code}
//! POST /api/v1/rooms/leave              - Leave current room
//! POST /api/v1/rooms/{id}/start         - Start the game now
//! GET  /api/v1/rooms                    - List rooms
//! GET  /api/v1/rooms/{id}               - Room with members
//! ```
//!
//! Errors are returned as `{"error": "<message>"}`.
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod errors;
pub mod identity;
pub mod middleware;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use teen_patti::{RoomEngine, db::RoomStore, notify::ChannelHub};
use tower_http::cors::CorsLayer;

pub use identity::IdentityVerifier;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// # Fields
///
/// - `engine`: Room engine handling every room operation
/// - `store`: Store behind the engine, used for balances and health checks
/// - `hub`: Per-user event queues feeding the WebSocket connections
/// - `identity`: Bearer token verification
pub struct AppState<S: RoomStore> {
    pub engine: Arc<RoomEngine<S>>,
    pub store: Arc<S>,
    pub hub: Arc<ChannelHub>,
    pub identity: Arc<IdentityVerifier>,
}

impl<S: RoomStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            store: self.store.clone(),
            hub: self.hub.clone(),
            identity: self.identity.clone(),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use teen_patti::{RoomConfig, RoomEngine, db::MemoryRoomStore, notify::ChannelHub};
/// # use tp_server::api::{AppState, IdentityVerifier, create_router};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryRoomStore::new());
/// let hub = Arc::new(ChannelHub::default());
/// let engine = RoomEngine::new(store.clone(), hub.clone(), RoomConfig::default());
/// let state = AppState {
///     engine: Arc::new(engine),
///     store,
///     hub,
///     identity: Arc::new(IdentityVerifier::new("secret_of_at_least_thirty_two_bytes")),
/// };
///
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router<S: RoomStore>(state: AppState<S>) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check::<S>))
        // WebSocket route handles its own auth via query parameter
        .route("/ws", get(websocket::websocket_handler::<S>))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router; every room endpoint requires authentication.
fn create_v1_router<S: RoomStore>(state: AppState<S>) -> Router<AppState<S>> {
    Router::new()
        .route("/rooms", get(rooms::list_rooms::<S>))
        .route("/rooms/private", post(rooms::create_private_room::<S>))
        .route("/rooms/private/join", post(rooms::join_private_room::<S>))
        .route("/rooms/public", post(rooms::join_public_room::<S>))
        .route("/rooms/leave", post(rooms::leave_room::<S>))
        .route("/rooms/{room_id}", get(rooms::get_room::<S>))
        .route("/rooms/{room_id}/start", post(rooms::start_game::<S>))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware::<S>,
        ))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","database":true}
/// ```
async fn health_check<S: RoomStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let db_healthy = state.store.health_check().await.is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
    });

    (status_code, Json(response))
}
