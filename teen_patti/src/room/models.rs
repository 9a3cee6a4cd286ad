//! Room and membership data models.

use super::{config::RoomConfig, errors::RoomError};
use crate::game::Card;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub type UserId = i64;
pub type RoomId = i64;
pub type MembershipId = i64;

/// Default page size for room listings
pub const DEFAULT_PAGE_ROWS: u32 = 10;

/// Largest page a listing will return
pub const MAX_PAGE_ROWS: u32 = 100;

/// Private rooms are joined by code; public rooms through matchmaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Private,
    Public,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKind::Private => write!(f, "private"),
            RoomKind::Public => write!(f, "public"),
        }
    }
}

impl FromStr for RoomKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(RoomKind::Private),
            "public" => Ok(RoomKind::Public),
            other => Err(format!("unknown room kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Running,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Waiting => write!(f, "waiting"),
            RoomStatus::Running => write!(f, "running"),
        }
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(RoomStatus::Waiting),
            "running" => Ok(RoomStatus::Running),
            other => Err(format!("unknown room status: {other}")),
        }
    }
}

/// Per-member state within a room. A member moves to `Running` once their
/// stake has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Waiting,
    Running,
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::Waiting => write!(f, "waiting"),
            PlayState::Running => write!(f, "running"),
        }
    }
}

impl FromStr for PlayState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(PlayState::Waiting),
            "running" => Ok(PlayState::Running),
            other => Err(format!("unknown play state: {other}")),
        }
    }
}

/// Room model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    /// Present only on private rooms
    pub join_code: Option<String>,
    pub owner_id: UserId,
    pub capacity: i32,
    pub member_count: i32,
    /// Entry amount each member pays when the game starts
    pub stake: i64,
    pub pot_limit: i64,
    pub display_threshold: i64,
    pub total_collected: i64,
    pub status: RoomStatus,
    pub is_active: bool,
    pub winner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn is_full(&self) -> bool {
        self.member_count >= self.capacity
    }

    pub fn is_waiting(&self) -> bool {
        self.status == RoomStatus::Waiting
    }

    /// Visible to lookups and open to new members
    pub fn is_open(&self) -> bool {
        self.is_active && self.is_waiting() && !self.is_full()
    }
}

/// Values for a room row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub kind: RoomKind,
    pub join_code: Option<String>,
    pub owner_id: UserId,
    pub capacity: i32,
    pub stake: i64,
    pub pot_limit: i64,
    pub display_threshold: i64,
}

impl NewRoom {
    /// # Errors
    ///
    /// * `RoomError::InvalidStake` - stake is not positive or the derived
    ///   limits overflow
    pub fn private(
        owner_id: UserId,
        stake: i64,
        join_code: String,
        config: &RoomConfig,
    ) -> Result<Self, RoomError> {
        Self::build(
            RoomKind::Private,
            Some(join_code),
            owner_id,
            config.private_capacity,
            stake,
            config,
        )
    }

    pub fn public(owner_id: UserId, stake: i64, config: &RoomConfig) -> Result<Self, RoomError> {
        Self::build(
            RoomKind::Public,
            None,
            owner_id,
            config.public_capacity,
            stake,
            config,
        )
    }

    fn build(
        kind: RoomKind,
        join_code: Option<String>,
        owner_id: UserId,
        capacity: i32,
        stake: i64,
        config: &RoomConfig,
    ) -> Result<Self, RoomError> {
        validate_stake(stake)?;
        let pot_limit = stake
            .checked_mul(config.pot_limit_multiplier)
            .ok_or(RoomError::InvalidStake(stake))?;
        let display_threshold = stake
            .checked_mul(config.display_threshold_multiplier)
            .ok_or(RoomError::InvalidStake(stake))?;

        Ok(Self {
            kind,
            join_code,
            owner_id,
            capacity,
            stake,
            pot_limit,
            display_threshold,
        })
    }
}

/// # Errors
///
/// * `RoomError::InvalidStake` - stake is zero or negative
pub fn validate_stake(stake: i64) -> Result<(), RoomError> {
    if stake <= 0 {
        return Err(RoomError::InvalidStake(stake));
    }
    Ok(())
}

/// A user's seat in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
    pub play_state: PlayState,
    pub hand: Option<Vec<Card>>,
    pub hand_value: Option<i32>,
}

/// Authenticated identity plus the balance snapshot taken at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub balance: i64,
}

/// A room together with its current members in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room: Room,
    pub members: Vec<Membership>,
}

/// Room listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFilter {
    pub kind: Option<RoomKind>,
    pub status: Option<RoomStatus>,
    pub stake: Option<i64>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        (self.include_inactive || room.is_active)
            && self.kind.is_none_or(|k| room.kind == k)
            && self.status.is_none_or(|s| room.status == s)
            && self.stake.is_none_or(|s| room.stake == s)
    }
}

/// 1-based page selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub rows: u32,
}

impl Pagination {
    pub fn new(page: u32, rows: u32) -> Self {
        Self { page, rows }
    }

    /// Rows per page: 10 when unset, never above 100
    pub fn limit(&self) -> u32 {
        match self.rows {
            0 => DEFAULT_PAGE_ROWS,
            rows => rows.min(MAX_PAGE_ROWS),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit())
    }
}
