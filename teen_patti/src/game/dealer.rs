//! Deals three-card hands from a freshly shuffled deck.

use super::{
    entities::{Card, DECK_SIZE, Deck},
    ranking::{HandRank, rank_hand},
};
use rand::Rng;
use thiserror::Error;

pub const CARDS_PER_HAND: usize = 3;

/// Largest number of seats one deck can serve.
pub const MAX_SEATS: usize = DECK_SIZE / CARDS_PER_HAND;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DealError {
    #[error("Deck exhausted: {requested} cards requested, {available} available")]
    DeckExhausted { requested: usize, available: usize },
}

/// A seat paired with the hand it was dealt.
#[derive(Clone, Debug)]
pub struct DealtHand<T> {
    pub seat: T,
    pub cards: [Card; CARDS_PER_HAND],
    pub rank: HandRank,
}

/// Shuffles a new deck and deals consecutive three-card slices to the seats
/// in the order given: seat `i` receives cards `[3i, 3i + 3)`.
///
/// # Errors
///
/// * `DealError::DeckExhausted` - more than 17 seats
pub fn deal<T, R: Rng + ?Sized>(
    seats: Vec<T>,
    rng: &mut R,
) -> Result<Vec<DealtHand<T>>, DealError> {
    let requested = seats.len() * CARDS_PER_HAND;
    if requested > DECK_SIZE {
        return Err(DealError::DeckExhausted {
            requested,
            available: DECK_SIZE,
        });
    }

    let mut deck = Deck::default();
    deck.shuffle_with(rng);

    let mut draw = || {
        deck.deal_card().ok_or(DealError::DeckExhausted {
            requested,
            available: DECK_SIZE,
        })
    };

    let mut hands = Vec::with_capacity(seats.len());
    for seat in seats {
        let cards = [draw()?, draw()?, draw()?];
        hands.push(DealtHand {
            seat,
            rank: rank_hand(&cards),
            cards,
        });
    }
    Ok(hands)
}
