//! Three-card hand ranking.
//!
//! Categories from weakest to strongest: high card, pair, color (flush),
//! sequence (run), pure sequence (suited run), trail (three of a kind).
//! Aces only play high, so Q-K-A is a sequence and A-2-3 is not.

use super::entities::{Card, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of one category band in the scalar hand value. Tie-break keys
/// pack three ranks in base 16, which stays below 4096.
pub const CATEGORY_BAND: i32 = 10_000;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandCategory {
    HighCard,
    Pair,
    Color,
    Sequence,
    PureSequence,
    Trail,
}

impl HandCategory {
    fn band(self) -> i32 {
        match self {
            Self::HighCard => 0,
            Self::Pair => 1,
            Self::Color => 2,
            Self::Sequence => 3,
            Self::PureSequence => 4,
            Self::Trail => 5,
        }
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::Pair => "pair",
            Self::Color => "color",
            Self::Sequence => "sequence",
            Self::PureSequence => "pure sequence",
            Self::Trail => "trail",
        };
        write!(f, "{repr}")
    }
}

/// Structured strength of a three-card hand.
///
/// Field order matters: the derived `Ord` compares the category first and
/// then the tie-break ranks lexicographically.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandRank {
    pub category: HandCategory,
    pub tiebreak: [Value; 3],
}

impl HandRank {
    /// Scalar form persisted alongside a dealt hand. Comparing two values
    /// gives the same answer as comparing the structured ranks.
    pub fn value(&self) -> i32 {
        let [a, b, c] = self.tiebreak.map(i32::from);
        self.category.band() * CATEGORY_BAND + a * 256 + b * 16 + c
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.category, self.value())
    }
}

/// Ranks a three-card hand.
pub fn rank_hand(cards: &[Card; 3]) -> HandRank {
    // Descending by rank: high, middle, low.
    let mut values = cards.map(|c| c.value());
    values.sort_unstable_by(|a, b| b.cmp(a));
    let [high, mid, low] = values;

    let suited = cards.iter().all(|c| c.suit() == cards[0].suit());
    let run = high == mid + 1 && mid == low + 1;

    if high == low {
        return HandRank {
            category: HandCategory::Trail,
            tiebreak: [high, 0, 0],
        };
    }
    if run {
        let category = if suited {
            HandCategory::PureSequence
        } else {
            HandCategory::Sequence
        };
        return HandRank {
            category,
            tiebreak: [high, 0, 0],
        };
    }
    if suited {
        return HandRank {
            category: HandCategory::Color,
            tiebreak: values,
        };
    }
    if high == mid {
        return HandRank {
            category: HandCategory::Pair,
            tiebreak: [high, low, 0],
        };
    }
    if mid == low {
        return HandRank {
            category: HandCategory::Pair,
            tiebreak: [mid, high, 0],
        };
    }
    HandRank {
        category: HandCategory::HighCard,
        tiebreak: values,
    }
}

/// Scalar value of a hand; shorthand for `rank_hand(cards).value()`.
pub fn hand_value(cards: &[Card; 3]) -> i32 {
    rank_hand(cards).value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit::{Club, Diamond, Heart, Spade};

    fn hand(cards: [Card; 3]) -> HandRank {
        rank_hand(&cards)
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            hand([Card(9, Spade), Card(9, Heart), Card(9, Club)]).category,
            HandCategory::Trail
        );
        assert_eq!(
            hand([Card(10, Spade), Card(11, Spade), Card(12, Spade)]).category,
            HandCategory::PureSequence
        );
        assert_eq!(
            hand([Card(4, Spade), Card(5, Heart), Card(6, Spade)]).category,
            HandCategory::Sequence
        );
        assert_eq!(
            hand([Card(2, Heart), Card(9, Heart), Card(13, Heart)]).category,
            HandCategory::Color
        );
        assert_eq!(
            hand([Card(2, Club), Card(2, Diamond), Card(9, Heart)]).category,
            HandCategory::Pair
        );
        assert_eq!(
            hand([Card(4, Club), Card(7, Diamond), Card(13, Heart)]).category,
            HandCategory::HighCard
        );
    }

    #[test]
    fn test_reference_ordering() {
        let pure = hand([Card(10, Spade), Card(11, Spade), Card(12, Spade)]);
        let pair = hand([Card(2, Club), Card(2, Diamond), Card(9, Heart)]);
        let high = hand([Card(4, Club), Card(7, Diamond), Card(13, Heart)]);

        assert!(pure > pair);
        assert!(pair > high);
        assert!(pure.value() > pair.value());
        assert!(pair.value() > high.value());
    }

    #[test]
    fn test_ace_plays_high_only() {
        let top = hand([Card(12, Club), Card(13, Heart), Card(14, Spade)]);
        assert_eq!(top.category, HandCategory::Sequence);
        assert_eq!(top.tiebreak[0], 14);

        let wheel = hand([Card(14, Club), Card(2, Heart), Card(3, Spade)]);
        assert_eq!(wheel.category, HandCategory::HighCard);
    }

    #[test]
    fn test_weakest_trail_beats_strongest_pure_sequence() {
        let trail = hand([Card(2, Club), Card(2, Heart), Card(2, Spade)]);
        let pure = hand([Card(12, Spade), Card(13, Spade), Card(14, Spade)]);
        assert!(trail > pure);
        assert!(trail.value() > pure.value());
    }

    #[test]
    fn test_best_high_card_below_worst_pair() {
        let high = hand([Card(11, Club), Card(13, Heart), Card(14, Heart)]);
        let pair = hand([Card(2, Club), Card(2, Heart), Card(3, Spade)]);
        assert_eq!(high.category, HandCategory::HighCard);
        assert!(pair > high);
        assert!(pair.value() > high.value());
    }

    #[test]
    fn test_pair_tiebreak_uses_pair_then_kicker() {
        let low_kicker = hand([Card(8, Club), Card(8, Heart), Card(3, Spade)]);
        let high_kicker = hand([Card(8, Diamond), Card(8, Spade), Card(12, Spade)]);
        let bigger_pair = hand([Card(9, Club), Card(9, Heart), Card(2, Spade)]);

        assert_eq!(low_kicker.tiebreak, [8, 3, 0]);
        assert_eq!(high_kicker.tiebreak, [8, 12, 0]);
        assert!(high_kicker > low_kicker);
        assert!(bigger_pair > high_kicker);
    }

    #[test]
    fn test_sequence_ignores_suits_beyond_purity() {
        let a = hand([Card(5, Club), Card(6, Heart), Card(7, Spade)]);
        let b = hand([Card(5, Heart), Card(6, Diamond), Card(7, Club)]);
        assert_eq!(a, b);
        assert_eq!(a.value(), b.value());
    }

    #[test]
    fn test_high_card_compares_all_ranks() {
        let a = hand([Card(13, Club), Card(9, Heart), Card(5, Spade)]);
        let b = hand([Card(13, Diamond), Card(9, Spade), Card(4, Heart)]);
        assert!(a > b);
        assert!(a.value() > b.value());
    }

    #[test]
    fn test_value_bands() {
        let trail = hand([Card(14, Club), Card(14, Heart), Card(14, Spade)]);
        assert_eq!(trail.value(), 5 * CATEGORY_BAND + 14 * 256);

        let pair = hand([Card(2, Club), Card(2, Diamond), Card(9, Heart)]);
        assert_eq!(pair.value(), CATEGORY_BAND + 2 * 256 + 9 * 16);

        let high = hand([Card(4, Club), Card(7, Diamond), Card(13, Heart)]);
        assert_eq!(high.value(), 13 * 256 + 7 * 16 + 4);
    }
}
