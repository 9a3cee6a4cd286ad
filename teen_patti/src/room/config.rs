//! Room engine configuration.

use crate::game::MAX_SEATS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Room engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Seats in a private room (default: 7)
    pub private_capacity: i32,

    /// Seats in a public room (default: 5)
    pub public_capacity: i32,

    /// Length of a private join code (default: 6)
    pub join_code_length: usize,

    /// Fresh codes tried before giving up on a private room (default: 8)
    pub join_code_attempts: u32,

    /// Countdown length once a room has enough members (default: 10)
    pub countdown_secs: u32,

    /// Interval between countdown updates in milliseconds (default: 1000)
    pub tick_millis: u64,

    /// Paying members needed to start a game (default: 2)
    pub min_participants: usize,

    /// Pot limit as a multiple of the stake (default: 4)
    pub pot_limit_multiplier: i64,

    /// Display threshold as a multiple of the stake (default: 30)
    pub display_threshold_multiplier: i64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            private_capacity: 7,
            public_capacity: 5,
            join_code_length: 6,
            join_code_attempts: 8,
            countdown_secs: 10,
            tick_millis: 1000,
            min_participants: 2,
            pot_limit_multiplier: 4,
            display_threshold_multiplier: 30,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_participants < 2 {
            return Err("Minimum participants must be at least 2".to_string());
        }

        for (name, capacity) in [
            ("Private", self.private_capacity),
            ("Public", self.public_capacity),
        ] {
            let seats = usize::try_from(capacity).unwrap_or(0);
            if seats < self.min_participants || seats > MAX_SEATS {
                return Err(format!(
                    "{name} capacity must be between {} and {MAX_SEATS}",
                    self.min_participants
                ));
            }
        }

        if !(4..=16).contains(&self.join_code_length) {
            return Err("Join code length must be between 4 and 16".to_string());
        }

        if self.join_code_attempts == 0 {
            return Err("Join code attempts must be at least 1".to_string());
        }

        if self.countdown_secs == 0 || self.tick_millis == 0 {
            return Err("Countdown and tick interval must be positive".to_string());
        }

        if self.pot_limit_multiplier <= 0 || self.display_threshold_multiplier <= 0 {
            return Err("Stake multipliers must be positive".to_string());
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}
