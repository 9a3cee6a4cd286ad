//! Cards, three-card hand ranking and dealing.

pub mod dealer;
pub mod entities;
pub mod ranking;

pub use dealer::{CARDS_PER_HAND, DealError, DealtHand, MAX_SEATS, deal};
pub use entities::{Card, Deck, Suit, Value};
pub use ranking::{HandCategory, HandRank, hand_value, rank_hand};
