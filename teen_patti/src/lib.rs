//! # Teen Patti
//!
//! Room and game session engine for a three-card Teen Patti table.
//!
//! Players are seated in private rooms (joined by code) or public rooms
//! (matched by stake). Once enough players sit in a waiting room a
//! countdown runs; on expiry the stake is collected from every funded
//! member, a shuffled deck is dealt three cards per payer and each hand is
//! ranked.
//!
//! ## Core Modules
//!
//! - [`room`]: Registry, pot collector, game clock and the [`RoomEngine`]
//! - [`game`]: Cards, deck, dealing and hand ranking
//! - [`wallet`]: Balances and the append-only wallet ledger
//! - [`notify`]: Room events and their delivery to connected users
//! - [`db`]: Store traits with Postgres and in-memory implementations
//!
//! ## Example
//!
//! ```
//! use teen_patti::game::{Card, HandCategory, Suit, rank_hand};
//!
//! let hand = [Card(10, Suit::Spade), Card(11, Suit::Spade), Card(12, Suit::Spade)];
//! assert_eq!(rank_hand(&hand).category, HandCategory::PureSequence);
//! ```

/// Store layer: unit-of-work traits and their backends.
pub mod db;

/// Cards, dealing and hand evaluation.
pub mod game;

/// Room events and the notification bus.
pub mod notify;

/// Rooms and the game start flow.
pub mod room;
pub use room::{Caller, RoomConfig, RoomEngine, RoomError, RoomResult};

/// Wallet balances and ledger entries.
pub mod wallet;
