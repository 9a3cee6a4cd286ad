//! Membership ledger: the record of which user sits in which room.

use super::{
    errors::RoomResult,
    models::{Membership, MembershipId, PlayState, RoomId, UserId},
};
use crate::game::Card;
use async_trait::async_trait;

/// Membership reads and writes inside a room transaction.
///
/// A user holds at most one active membership across all rooms. Callers
/// keep `Room::member_count` in step with `add_member`/`remove_member` in
/// the same transaction.
#[async_trait]
pub trait MembershipLedger: Send {
    /// The caller's active membership in any room
    async fn find_active_membership(&mut self, user_id: UserId) -> RoomResult<Option<Membership>>;

    /// Active members of a room, oldest first (ties broken by id)
    async fn all_members(&mut self, room_id: RoomId) -> RoomResult<Vec<Membership>>;

    /// Seats a user in a room in the `Waiting` play state.
    ///
    /// # Errors
    ///
    /// * `RoomError::AlreadyElsewhere` - the user already has an active
    ///   membership
    async fn add_member(&mut self, room_id: RoomId, user_id: UserId) -> RoomResult<Membership>;

    async fn remove_member(&mut self, membership_id: MembershipId) -> RoomResult<()>;

    /// Sets the play state of every active member of a room
    ///
    /// # Returns
    ///
    /// * `RoomResult<u64>` - Number of memberships updated
    async fn set_play_state(&mut self, room_id: RoomId, state: PlayState) -> RoomResult<u64>;

    async fn set_member_play_state(
        &mut self,
        membership_id: MembershipId,
        state: PlayState,
    ) -> RoomResult<()>;

    /// Stores a dealt hand and its scalar value
    async fn record_hand(
        &mut self,
        membership_id: MembershipId,
        hand: &[Card],
        hand_value: i32,
    ) -> RoomResult<()>;
}
