use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card suits, in the order a fresh deck is built.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Card rank. Two is 2u8, ..., King is 13u8, Ace is always 14u8.
pub type Value = u8;

pub const LOWEST_VALUE: Value = 2;
pub const ACE: Value = 14;

/// A card is a tuple of a rank value and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    pub fn value(&self) -> Value {
        self.0
    }

    pub fn suit(&self) -> Suit {
        self.1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

pub const DECK_SIZE: usize = 52;

#[derive(Clone, Debug)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
    pub deck_idx: usize,
}

impl Deck {
    /// Next card off the top, or `None` once all 52 are out.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    /// Uniform Fisher-Yates shuffle driven by the given generator.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn remaining(&self) -> usize {
        DECK_SIZE - self.deck_idx
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards: [Card; DECK_SIZE] = [Card(LOWEST_VALUE, Suit::Spade); DECK_SIZE];
        for (i, suit) in Suit::ALL.into_iter().enumerate() {
            for (j, value) in (LOWEST_VALUE..=ACE).enumerate() {
                cards[13 * i + j] = Card(value, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_default_deck_is_complete() {
        let deck = Deck::default();
        let unique: HashSet<Card> = deck.cards().iter().copied().collect();
        assert_eq!(unique.len(), DECK_SIZE);
        assert!(deck.cards().iter().all(|c| (2..=14).contains(&c.value())));
        assert_eq!(deck.cards()[0], Card(2, Suit::Spade));
        assert_eq!(deck.cards()[51], Card(14, Suit::Club));
    }

    #[test]
    fn test_deal_until_exhausted() {
        let mut deck = Deck::default();
        for _ in 0..DECK_SIZE {
            assert!(deck.deal_card().is_some());
        }
        assert_eq!(deck.remaining(), 0);
        assert!(deck.deal_card().is_none());
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut a = Deck::default();
        let mut b = Deck::default();
        a.shuffle_with(&mut StdRng::seed_from_u64(7));
        b.shuffle_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.cards(), b.cards());

        let unique: HashSet<Card> = a.cards().iter().copied().collect();
        assert_eq!(unique.len(), DECK_SIZE);
    }

    #[test]
    fn test_shuffle_resets_index() {
        let mut deck = Deck::default();
        deck.deal_card();
        deck.deal_card();
        deck.shuffle();
        assert_eq!(deck.deck_idx, 0);
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card(10, Suit::Spade).to_string(), "10♠");
        assert_eq!(Card(14, Suit::Heart).to_string(), "A♥");
        assert_eq!(Card(12, Suit::Club).to_string(), "Q♣");
    }
}
