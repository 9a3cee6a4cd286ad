//! Room API handlers.
//!
//! Every endpoint requires a bearer token. Successful seat changes answer
//! with the room and its members; events for the other members go out
//! over their push connections.
//!
//! # Examples
//!
//! Find a public game at stake 10:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/rooms/public \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"stake": 10}'
//! ```
//!
//! Join a friend's private room:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/rooms/private/join \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"code": "K7Q2XM"}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use teen_patti::{
    Caller, RoomResult,
    db::RoomStore,
    notify::DealtMember,
    room::{MemberCollection, Pagination, Room, RoomFilter, RoomId, RoomKind, RoomSnapshot, RoomStatus},
};

use super::{
    AppState,
    errors::{ApiError, outcome_label},
};
use crate::{logging::log_room_operation, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct StakeRequest {
    pub stake: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinCodeRequest {
    pub code: String,
}

/// Query string of `GET /rooms`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListRoomsQuery {
    pub kind: Option<RoomKind>,
    pub status: Option<RoomStatus>,
    pub stake: Option<i64>,
    pub page: Option<u32>,
    pub rows: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameStartResponse {
    pub room: Room,
    pub total_collected: i64,
    pub players: Vec<MemberCollection>,
    pub hands: Vec<DealtMember>,
}

/// Count and log the outcome of an operation, then convert errors for the client.
fn finish<T>(
    operation: &'static str,
    caller: &Caller,
    room_id: impl Fn(&T) -> Option<RoomId>,
    result: RoomResult<T>,
) -> Result<T, ApiError> {
    match result {
        Ok(value) => {
            metrics::room_operations_total(operation, "ok");
            log_room_operation(operation, caller.user_id, room_id(&value), "ok");
            Ok(value)
        }
        Err(e) => {
            let outcome = outcome_label(e.kind());
            metrics::room_operations_total(operation, outcome);
            log_room_operation(operation, caller.user_id, None, outcome);
            Err(e.into())
        }
    }
}

fn snapshot_room(snapshot: &RoomSnapshot) -> Option<RoomId> {
    Some(snapshot.room.id)
}

/// Create a private room owned by the caller.
///
/// # Request Body
///
/// ```json
/// { "stake": 25 }
/// ```
///
/// # Response
///
/// `201 Created` with the room (including its join code) and members.
///
/// # Errors
///
/// - `400 Bad Request`: Stake not positive or balance below the stake
/// - `409 Conflict`: Caller already sits in a room
pub async fn create_private_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<StakeRequest>,
) -> Result<(StatusCode, Json<RoomSnapshot>), ApiError> {
    let result = state.engine.create_private_room(&caller, request.stake).await;
    let snapshot = finish("create_private", &caller, snapshot_room, result)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Seat the caller in a public room at the given stake.
///
/// # Errors
///
/// - `400 Bad Request`: Stake not positive or balance below the stake
/// - `409 Conflict`: Caller already sits in a room
pub async fn join_public_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<StakeRequest>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let result = state.engine.join_public_room(&caller, request.stake).await;
    finish("join_public", &caller, snapshot_room, result).map(Json)
}

/// Join a private room by its code.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed code or balance below the stake
/// - `404 Not Found`: No active room holds the code
/// - `409 Conflict`: Room full, game running, or caller already seated
pub async fn join_private_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<JoinCodeRequest>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let result = state.engine.join_private_room(&caller, &request.code).await;
    finish("join_private", &caller, snapshot_room, result).map(Json)
}

/// Leave the caller's current room.
///
/// # Errors
///
/// - `404 Not Found`: Caller is not seated anywhere
pub async fn leave_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let result = state.engine.leave_room(&caller).await;
    finish("leave", &caller, snapshot_room, result).map(Json)
}

/// Start the game in the caller's room without waiting for the countdown.
///
/// # Errors
///
/// - `404 Not Found`: Room missing, or caller not seated in it
/// - `409 Conflict`: Game running, or fewer than two funded members
pub async fn start_game<S: RoomStore>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<Caller>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<GameStartResponse>, ApiError> {
    let result = state.engine.start_game(&caller, room_id).await;
    let start = finish("start_game", &caller, |_| Some(room_id), result)?;

    metrics::games_started_total();
    metrics::pot_size(start.collection.collected_total);

    Ok(Json(GameStartResponse {
        room: start.collection.room,
        total_collected: start.collection.collected_total,
        players: start.collection.members,
        hands: start.hands,
    }))
}

/// List active rooms, newest first.
///
/// # Query Parameters
///
/// - `kind`: `private` or `public`
/// - `status`: `waiting` or `running`
/// - `stake`: exact stake
/// - `page`, `rows`: 1-based page and page size (default 10, max 100)
pub async fn list_rooms<S: RoomStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let filter = RoomFilter {
        kind: query.kind,
        status: query.status,
        stake: query.stake,
        include_inactive: false,
    };
    let page = Pagination::new(query.page.unwrap_or(1), query.rows.unwrap_or_default());

    let rooms = state.engine.list_rooms(&filter, page).await?;
    Ok(Json(rooms))
}

/// Get an active room with its members.
///
/// # Errors
///
/// - `404 Not Found`: Unknown or inactive room
pub async fn get_room<S: RoomStore>(
    State(state): State<AppState<S>>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let snapshot = state.engine.get_room(room_id).await?;
    Ok(Json(snapshot))
}
