//! Rooms: registry, membership, pot collection and the game start flow.
//!
//! [`RoomEngine`] is the entry point. It is generic over a [`RoomStore`]
//! so the same code runs against Postgres in production and an in-memory
//! store in tests.
//!
//! [`RoomStore`]: crate::db::RoomStore

pub mod clock;
pub mod code;
pub mod collector;
pub mod config;
pub mod engine;
pub mod errors;
pub mod membership;
pub mod models;
pub mod registry;

pub use clock::{CountdownExpiry, GameClock};
pub use collector::{Collection, MemberCollection, PotCollector};
pub use config::RoomConfig;
pub use engine::{GameStart, RoomEngine};
pub use errors::{ErrorKind, RoomError, RoomResult};
pub use membership::MembershipLedger;
pub use models::{
    Caller, DEFAULT_PAGE_ROWS, MAX_PAGE_ROWS, Membership, MembershipId, NewRoom, Pagination,
    PlayState, Room, RoomFilter, RoomId, RoomKind, RoomSnapshot, RoomStatus, UserId,
};
pub use registry::{Departure, RoomRegistry, Seating};
