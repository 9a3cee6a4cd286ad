//! Wallet data models.

use crate::room::{RoomId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Wallet model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wallet entry model (ledger line)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: i64,
    pub user_id: UserId,
    pub room_id: Option<RoomId>,
    pub amount: i64,
    pub balance_after: i64,
    pub direction: EntryDirection,
    pub entry_type: EntryType,
    pub idempotency_key: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDirection::Debit => write!(f, "debit"),
            EntryDirection::Credit => write!(f, "credit"),
        }
    }
}

impl FromStr for EntryDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(EntryDirection::Debit),
            "credit" => Ok(EntryDirection::Credit),
            other => Err(format!("unknown entry direction: {other}")),
        }
    }
}

/// Entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Stake taken from a member when a room's game starts
    PotStake,
    Deposit,
    Withdrawal,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::PotStake => write!(f, "pot_stake"),
            EntryType::Deposit => write!(f, "deposit"),
            EntryType::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pot_stake" => Ok(EntryType::PotStake),
            "deposit" => Ok(EntryType::Deposit),
            "withdrawal" => Ok(EntryType::Withdrawal),
            other => Err(format!("unknown entry type: {other}")),
        }
    }
}

/// A single debit request against a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debit {
    pub user_id: UserId,
    pub room_id: Option<RoomId>,
    pub amount: i64,
    pub entry_type: EntryType,
    pub idempotency_key: String,
    pub description: Option<String>,
}

impl Debit {
    /// The stake a member pays into a room's pot. A room collects at most
    /// once, so the key is stable per (room, user).
    pub fn pot_stake(room_id: RoomId, user_id: UserId, stake: i64) -> Self {
        Self {
            user_id,
            room_id: Some(room_id),
            amount: stake,
            entry_type: EntryType::PotStake,
            idempotency_key: format!("pot_{room_id}_{user_id}"),
            description: Some(format!("Pot stake for room {room_id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_parse() {
        for entry_type in [EntryType::PotStake, EntryType::Deposit, EntryType::Withdrawal] {
            assert_eq!(entry_type.to_string().parse::<EntryType>(), Ok(entry_type));
        }
        assert!("rake".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_pot_stake_key_is_stable() {
        let a = Debit::pot_stake(3, 11, 50);
        let b = Debit::pot_stake(3, 11, 50);
        assert_eq!(a.idempotency_key, "pot_3_11");
        assert_eq!(a, b);
        assert_eq!(a.entry_type, EntryType::PotStake);
    }
}
