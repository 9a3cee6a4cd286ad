//! Events the room engine publishes.

use crate::game::Card;
use crate::room::{RoomId, RoomSnapshot, UserId, collector::MemberCollection};
use serde::{Deserialize, Serialize};

/// One member's dealt hand as published to the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealtMember {
    pub user_id: UserId,
    pub hand: Vec<Card>,
    pub hand_value: i32,
}

/// Serialized as `{"event": "<name>", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Sent to the creator of a room
    RoomCreated { room: RoomSnapshot },

    PlayerJoined { user_id: UserId, room: RoomSnapshot },

    PlayerLeft { user_id: UserId, room: RoomSnapshot },

    /// The room needs more members before a countdown can start
    WaitForGame { room_id: RoomId, message: String },

    GameCountdownUpdate { room_id: RoomId, seconds_remaining: u32 },

    GameStarted {
        room_id: RoomId,
        total_collected: i64,
        players: Vec<MemberCollection>,
    },

    DealCards { room_id: RoomId, members: Vec<DealtMember> },

    GameStartFailed { room_id: RoomId, reason: String },
}

impl RoomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::RoomCreated { .. } => "room_created",
            RoomEvent::PlayerJoined { .. } => "player_joined",
            RoomEvent::PlayerLeft { .. } => "player_left",
            RoomEvent::WaitForGame { .. } => "wait_for_game",
            RoomEvent::GameCountdownUpdate { .. } => "game_countdown_update",
            RoomEvent::GameStarted { .. } => "game_started",
            RoomEvent::DealCards { .. } => "deal_cards",
            RoomEvent::GameStartFailed { .. } => "game_start_failed",
        }
    }

    pub fn wait_for_game(room_id: RoomId) -> Self {
        RoomEvent::WaitForGame {
            room_id,
            message: "Waiting for more players to join".to_string(),
        }
    }
}
