//! Notification bus: delivery of room events to users and room channels.

pub mod events;
pub mod hub;

pub use events::{DealtMember, RoomEvent};
pub use hub::ChannelHub;

use crate::room::{RoomId, UserId};
use async_trait::async_trait;

/// Fire-and-forget event delivery. Implementations never report failure
/// back to the engine; undeliverable events are dropped.
#[async_trait]
pub trait NotificationBus: Send + Sync + 'static {
    async fn send_to_user(&self, user_id: UserId, event: RoomEvent);

    async fn send_to_room(&self, room_id: RoomId, event: RoomEvent);

    /// Subscribe a user to a room's channel
    async fn join_channel(&self, user_id: UserId, room_id: RoomId);

    async fn leave_channel(&self, user_id: UserId, room_id: RoomId);
}
