//! Pot collection at game start.

use super::{
    errors::{RoomError, RoomResult},
    membership::MembershipLedger,
    models::{
        Membership, MembershipId, PlayState, Room, RoomId, RoomStatus, UserId, validate_stake,
    },
};
use crate::db::{RoomStore, RoomTx};
use crate::wallet::{Debit, FundsLedger, WalletError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What happened to one waiting member during collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCollection {
    pub user_id: UserId,
    pub membership_id: MembershipId,
    /// Amount debited; zero for an excluded member
    pub amount: i64,
    pub insufficient_balance: bool,
    pub balance_after: Option<i64>,
}

/// Result of a successful collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// The room after the switch to `Running`
    pub room: Room,
    pub collected_total: i64,
    /// Every member that was waiting, in join order
    pub members: Vec<MemberCollection>,
}

impl Collection {
    /// Members whose stake was taken, in join order
    pub fn payers(&self) -> impl Iterator<Item = &MemberCollection> {
        self.members.iter().filter(|m| !m.insufficient_balance)
    }
}

/// Takes the stake from every funded member of a room in one transaction.
pub struct PotCollector<S: RoomStore> {
    store: Arc<S>,
    min_participants: usize,
}

impl<S: RoomStore> Clone for PotCollector<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            min_participants: self.min_participants,
        }
    }
}

impl<S: RoomStore> PotCollector<S> {
    pub fn new(store: Arc<S>, min_participants: usize) -> Self {
        Self {
            store,
            min_participants,
        }
    }

    /// Collect `stake` from each waiting member that can afford it.
    ///
    /// Members short of the stake are skipped and stay `Waiting`. When at
    /// least `min_participants` can pay, every payer is debited, switched to
    /// `Running`, and the room moves to `Running` with the total recorded.
    /// Otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - room missing or inactive
    /// * `RoomError::GameInProgress` - room already running
    /// * `RoomError::InsufficientParticipants` - too few funded members
    pub async fn collect(&self, room_id: RoomId, stake: i64) -> RoomResult<Collection> {
        validate_stake(stake)?;

        let mut tx = self.store.begin().await?;
        let mut room = tx
            .lock_room(room_id)
            .await?
            .filter(|r| r.is_active)
            .ok_or(RoomError::NotFound)?;
        if !room.is_waiting() {
            return Err(RoomError::GameInProgress);
        }

        let waiting: Vec<Membership> = tx
            .all_members(room_id)
            .await?
            .into_iter()
            .filter(|m| m.play_state == PlayState::Waiting)
            .collect();

        let mut assessed = Vec::with_capacity(waiting.len());
        for membership in waiting {
            let balance = match tx.balance(membership.user_id).await {
                Ok(balance) => balance,
                Err(WalletError::WalletNotFound(_)) => 0,
                Err(e) => return Err(e.into()),
            };
            assessed.push((membership, balance >= stake));
        }

        let funded = assessed.iter().filter(|(_, can_pay)| *can_pay).count();
        if funded < self.min_participants {
            log::info!(
                "Room {} cannot start: {} of {} members funded, {} required",
                room_id,
                funded,
                assessed.len(),
                self.min_participants
            );
            return Err(RoomError::InsufficientParticipants {
                funded,
                required: self.min_participants,
            });
        }

        let mut members = Vec::with_capacity(assessed.len());
        for (membership, can_pay) in &assessed {
            if *can_pay {
                let balance_after = tx
                    .debit(&Debit::pot_stake(room_id, membership.user_id, stake))
                    .await?;
                members.push(MemberCollection {
                    user_id: membership.user_id,
                    membership_id: membership.id,
                    amount: stake,
                    insufficient_balance: false,
                    balance_after: Some(balance_after),
                });
            } else {
                log::info!(
                    "User {} skipped in room {}: balance below stake {}",
                    membership.user_id,
                    room_id,
                    stake
                );
                members.push(MemberCollection {
                    user_id: membership.user_id,
                    membership_id: membership.id,
                    amount: 0,
                    insufficient_balance: true,
                    balance_after: None,
                });
            }
        }

        if funded == members.len() {
            tx.set_play_state(room_id, PlayState::Running).await?;
        } else {
            for member in members.iter().filter(|m| !m.insufficient_balance) {
                tx.set_member_play_state(member.membership_id, PlayState::Running)
                    .await?;
            }
        }

        let collected_total = i64::try_from(funded)
            .ok()
            .and_then(|n| n.checked_mul(stake))
            .ok_or(RoomError::InvalidStake(stake))?;
        room.total_collected = collected_total;
        room.status = RoomStatus::Running;
        let room = tx.save_room(&room).await?;
        tx.commit().await?;

        log::info!(
            "Collected {} from {} members in room {}",
            collected_total,
            funded,
            room_id
        );

        Ok(Collection {
            room,
            collected_total,
            members,
        })
    }
}
