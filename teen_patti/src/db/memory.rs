//! In-process room store.
//!
//! All state lives behind one async mutex. A transaction holds the lock for
//! its whole lifetime and works on a copy, so units of work are serial and
//! a dropped transaction leaves no trace.

use super::repository::{RoomStore, RoomTx};
use crate::game::Card;
use crate::room::{
    MembershipLedger, NewRoom, Pagination, Room, RoomError, RoomFilter, RoomId, RoomKind,
    RoomResult, RoomStatus, UserId,
    models::{Membership, MembershipId, PlayState},
};
use crate::wallet::{
    Debit, EntryDirection, FundsLedger, WalletEntry, WalletError, WalletResult,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    rooms: BTreeMap<RoomId, Room>,
    memberships: BTreeMap<MembershipId, Membership>,
    wallets: HashMap<UserId, i64>,
    entries: Vec<WalletEntry>,
    next_room_id: RoomId,
    next_membership_id: MembershipId,
}

impl MemoryState {
    fn members_of(&self, room_id: RoomId) -> Vec<Membership> {
        let mut members: Vec<Membership> = self
            .memberships
            .values()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
        members
    }
}

/// Room store kept in memory, used by tests and local runs
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a user's wallet balance, creating the wallet if needed
    pub async fn set_balance(&self, user_id: UserId, balance: i64) {
        self.state.lock().await.wallets.insert(user_id, balance);
    }

    pub async fn balance_of(&self, user_id: UserId) -> Option<i64> {
        self.state.lock().await.wallets.get(&user_id).copied()
    }

    /// Every ledger line written so far, oldest first
    pub async fn wallet_entries(&self) -> Vec<WalletEntry> {
        self.state.lock().await.entries.clone()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    type Tx = MemoryRoomTx;

    async fn begin(&self) -> RoomResult<MemoryRoomTx> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemoryRoomTx { guard, work })
    }

    async fn get_room(&self, room_id: RoomId) -> RoomResult<Option<Room>> {
        Ok(self.state.lock().await.rooms.get(&room_id).cloned())
    }

    async fn list_rooms(&self, filter: &RoomFilter, page: Pagination) -> RoomResult<Vec<Room>> {
        let state = self.state.lock().await;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(state
            .rooms
            .values()
            .rev()
            .filter(|room| filter.matches(room))
            .skip(offset)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn room_members(&self, room_id: RoomId) -> RoomResult<Vec<Membership>> {
        Ok(self.state.lock().await.members_of(room_id))
    }

    async fn wallet_balance(&self, user_id: UserId) -> RoomResult<Option<i64>> {
        Ok(self.balance_of(user_id).await)
    }

    async fn health_check(&self) -> RoomResult<()> {
        Ok(())
    }
}

/// Open transaction on a [`MemoryRoomStore`]
pub struct MemoryRoomTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl MembershipLedger for MemoryRoomTx {
    async fn find_active_membership(&mut self, user_id: UserId) -> RoomResult<Option<Membership>> {
        Ok(self
            .work
            .memberships
            .values()
            .find(|m| m.user_id == user_id)
            .cloned())
    }

    async fn all_members(&mut self, room_id: RoomId) -> RoomResult<Vec<Membership>> {
        Ok(self.work.members_of(room_id))
    }

    async fn add_member(&mut self, room_id: RoomId, user_id: UserId) -> RoomResult<Membership> {
        if self.work.memberships.values().any(|m| m.user_id == user_id) {
            return Err(RoomError::AlreadyElsewhere);
        }

        self.work.next_membership_id += 1;
        let membership = Membership {
            id: self.work.next_membership_id,
            room_id,
            user_id,
            joined_at: Utc::now(),
            play_state: PlayState::Waiting,
            hand: None,
            hand_value: None,
        };
        self.work
            .memberships
            .insert(membership.id, membership.clone());
        Ok(membership)
    }

    async fn remove_member(&mut self, membership_id: MembershipId) -> RoomResult<()> {
        self.work
            .memberships
            .remove(&membership_id)
            .map(|_| ())
            .ok_or(RoomError::NotMember)
    }

    async fn set_play_state(&mut self, room_id: RoomId, state: PlayState) -> RoomResult<u64> {
        let mut updated = 0;
        for membership in self.work.memberships.values_mut() {
            if membership.room_id == room_id {
                membership.play_state = state;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn set_member_play_state(
        &mut self,
        membership_id: MembershipId,
        state: PlayState,
    ) -> RoomResult<()> {
        let membership = self
            .work
            .memberships
            .get_mut(&membership_id)
            .ok_or(RoomError::NotMember)?;
        membership.play_state = state;
        Ok(())
    }

    async fn record_hand(
        &mut self,
        membership_id: MembershipId,
        hand: &[Card],
        hand_value: i32,
    ) -> RoomResult<()> {
        let membership = self
            .work
            .memberships
            .get_mut(&membership_id)
            .ok_or(RoomError::NotMember)?;
        membership.hand = Some(hand.to_vec());
        membership.hand_value = Some(hand_value);
        Ok(())
    }
}

#[async_trait]
impl FundsLedger for MemoryRoomTx {
    async fn balance(&mut self, user_id: UserId) -> WalletResult<i64> {
        self.work
            .wallets
            .get(&user_id)
            .copied()
            .ok_or(WalletError::WalletNotFound(user_id))
    }

    async fn debit(&mut self, debit: &Debit) -> WalletResult<i64> {
        if debit.amount <= 0 {
            return Err(WalletError::InvalidAmount(debit.amount));
        }
        if self
            .work
            .entries
            .iter()
            .any(|e| e.idempotency_key == debit.idempotency_key)
        {
            return Err(WalletError::DuplicateTransaction(
                debit.idempotency_key.clone(),
            ));
        }

        let balance = self
            .work
            .wallets
            .get_mut(&debit.user_id)
            .ok_or(WalletError::WalletNotFound(debit.user_id))?;
        if *balance < debit.amount {
            return Err(WalletError::InsufficientBalance {
                user_id: debit.user_id,
                available: *balance,
                required: debit.amount,
            });
        }
        *balance -= debit.amount;
        let balance_after = *balance;

        let id = self.work.entries.len() as i64 + 1;
        self.work.entries.push(WalletEntry {
            id,
            user_id: debit.user_id,
            room_id: debit.room_id,
            amount: -debit.amount,
            balance_after,
            direction: EntryDirection::Debit,
            entry_type: debit.entry_type,
            idempotency_key: debit.idempotency_key.clone(),
            description: debit.description.clone(),
            created_at: Utc::now(),
        });
        Ok(balance_after)
    }
}

#[async_trait]
impl RoomTx for MemoryRoomTx {
    async fn lock_user(&mut self, _user_id: UserId) -> RoomResult<()> {
        Ok(())
    }

    async fn lock_public_bucket(&mut self, _stake: i64) -> RoomResult<()> {
        Ok(())
    }

    async fn lock_room(&mut self, room_id: RoomId) -> RoomResult<Option<Room>> {
        Ok(self.work.rooms.get(&room_id).cloned())
    }

    async fn lock_room_by_code(&mut self, code: &str) -> RoomResult<Option<Room>> {
        Ok(self
            .work
            .rooms
            .values()
            .find(|r| r.is_active && r.kind == RoomKind::Private && r.join_code.as_deref() == Some(code))
            .cloned())
    }

    async fn find_open_public_room(&mut self, stake: i64) -> RoomResult<Option<Room>> {
        Ok(self
            .work
            .rooms
            .values()
            .find(|r| r.kind == RoomKind::Public && r.stake == stake && r.is_open())
            .cloned())
    }

    async fn code_in_use(&mut self, code: &str) -> RoomResult<bool> {
        Ok(self
            .work
            .rooms
            .values()
            .any(|r| r.is_active && r.join_code.as_deref() == Some(code)))
    }

    async fn insert_room(&mut self, room: &NewRoom) -> RoomResult<Room> {
        if let Some(code) = room.join_code.as_deref() {
            if self.code_in_use(code).await? {
                return Err(RoomError::DuplicateCode);
            }
        }

        self.work.next_room_id += 1;
        let now = Utc::now();
        let stored = Room {
            id: self.work.next_room_id,
            kind: room.kind,
            join_code: room.join_code.clone(),
            owner_id: room.owner_id,
            capacity: room.capacity,
            member_count: 0,
            stake: room.stake,
            pot_limit: room.pot_limit,
            display_threshold: room.display_threshold,
            total_collected: 0,
            status: RoomStatus::Waiting,
            is_active: true,
            winner_id: None,
            created_at: now,
            updated_at: now,
        };
        self.work.rooms.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save_room(&mut self, room: &Room) -> RoomResult<Room> {
        let stored = self
            .work
            .rooms
            .get_mut(&room.id)
            .ok_or(RoomError::NotFound)?;
        stored.member_count = room.member_count;
        stored.total_collected = room.total_collected;
        stored.status = room.status;
        stored.is_active = room.is_active;
        stored.winner_id = room.winner_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn commit(mut self) -> RoomResult<()> {
        *self.guard = self.work;
        Ok(())
    }
}
