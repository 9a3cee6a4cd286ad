//! Store trait definitions for testability and dependency injection.
//!
//! Room operations run as units of work: a `RoomTx` is opened with
//! `RoomStore::begin`, used for every read and write the operation needs,
//! then committed. Dropping a transaction without committing rolls it back.

use async_trait::async_trait;

use crate::room::{
    MembershipLedger, NewRoom, Pagination, Room, RoomFilter, RoomId, RoomResult, UserId,
    models::Membership,
};
use crate::wallet::FundsLedger;

/// Entry point to a room store
#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    type Tx: RoomTx;

    /// Open a unit of work
    async fn begin(&self) -> RoomResult<Self::Tx>;

    /// Read a room by id, active or not
    async fn get_room(&self, room_id: RoomId) -> RoomResult<Option<Room>>;

    /// Rooms matching a filter, newest first
    async fn list_rooms(&self, filter: &RoomFilter, page: Pagination) -> RoomResult<Vec<Room>>;

    /// Active members of a room in join order
    async fn room_members(&self, room_id: RoomId) -> RoomResult<Vec<Membership>>;

    /// Current wallet balance, `None` when the user has no wallet
    async fn wallet_balance(&self, user_id: UserId) -> RoomResult<Option<i64>>;

    /// Round trip to the backing store
    async fn health_check(&self) -> RoomResult<()>;
}

/// One open unit of work against a room store.
///
/// Locks are taken in a fixed order to avoid deadlocks: user, public
/// bucket, room, then membership and wallet rows.
#[async_trait]
pub trait RoomTx: MembershipLedger + FundsLedger + Send + 'static {
    /// Serialize seat changes for one user until the transaction ends
    async fn lock_user(&mut self, user_id: UserId) -> RoomResult<()>;

    /// Serialize public matchmaking for one stake until the transaction ends
    async fn lock_public_bucket(&mut self, stake: i64) -> RoomResult<()>;

    /// Read and lock a room row
    async fn lock_room(&mut self, room_id: RoomId) -> RoomResult<Option<Room>>;

    /// Read and lock the active private room holding a join code
    async fn lock_room_by_code(&mut self, code: &str) -> RoomResult<Option<Room>>;

    /// Oldest active, waiting public room at this stake with a free seat,
    /// locked
    async fn find_open_public_room(&mut self, stake: i64) -> RoomResult<Option<Room>>;

    /// Whether an active room already holds this join code
    async fn code_in_use(&mut self, code: &str) -> RoomResult<bool>;

    /// Insert a room with no members
    ///
    /// # Errors
    ///
    /// * `RoomError::DuplicateCode` - the join code is held by an active room
    async fn insert_room(&mut self, room: &NewRoom) -> RoomResult<Room>;

    /// Persist the mutable fields of a room
    ///
    /// # Returns
    ///
    /// * `RoomResult<Room>` - The stored room with its new `updated_at`
    async fn save_room(&mut self, room: &Room) -> RoomResult<Room>;

    async fn commit(self) -> RoomResult<()>;
}
