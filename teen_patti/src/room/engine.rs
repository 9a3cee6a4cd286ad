//! Room engine: the inbound surface tying the registry, pot collector,
//! game clock, card dealer and notification bus together.
//!
//! Every operation commits its store work first and only then publishes
//! events, so subscribers never hear about state that was rolled back.
//! Post-commit work for a room (events, countdown decisions, game runs) is
//! serialized by a per-room gate and always acts on a fresh read of the
//! room, never on the snapshot its own commit produced.

use super::{
    clock::{CountdownExpiry, GameClock},
    collector::{Collection, PotCollector},
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    membership::MembershipLedger,
    models::{Caller, Pagination, Room, RoomFilter, RoomId, RoomSnapshot},
    registry::{Departure, RoomRegistry, Seating},
};
use crate::db::{RoomStore, RoomTx};
use crate::game::deal;
use crate::notify::{DealtMember, NotificationBus, RoomEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Outcome of a game start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStart {
    pub collection: Collection,
    /// Hands dealt to the paying members, in join order
    pub hands: Vec<DealtMember>,
}

pub struct RoomEngine<S: RoomStore> {
    store: Arc<S>,
    registry: RoomRegistry<S>,
    collector: PotCollector<S>,
    clock: Arc<GameClock>,
    bus: Arc<dyn NotificationBus>,
    config: Arc<RoomConfig>,
    gates: Arc<Mutex<HashMap<RoomId, Arc<Mutex<()>>>>>,
}

impl<S: RoomStore> Clone for RoomEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
            collector: self.collector.clone(),
            clock: self.clock.clone(),
            bus: self.bus.clone(),
            config: self.config.clone(),
            gates: self.gates.clone(),
        }
    }
}

impl<S: RoomStore> RoomEngine<S> {
    pub fn new(store: Arc<S>, bus: Arc<dyn NotificationBus>, config: RoomConfig) -> Self {
        let config = Arc::new(config);
        Self {
            registry: RoomRegistry::new(store.clone(), config.clone()),
            collector: PotCollector::new(store.clone(), config.min_participants),
            clock: Arc::new(GameClock::new(&config, bus.clone())),
            store,
            bus,
            config,
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Create a private room with the caller as owner and sole member.
    pub async fn create_private_room(&self, caller: &Caller, stake: i64) -> RoomResult<RoomSnapshot> {
        let seating = self.registry.create_private(caller, stake).await?;
        self.after_seated(caller, &seating).await;
        Ok(seating.snapshot)
    }

    /// Seat the caller in a public room at this stake, creating one when
    /// every room is full.
    pub async fn join_public_room(&self, caller: &Caller, stake: i64) -> RoomResult<RoomSnapshot> {
        let seating = self.registry.match_or_create_public(caller, stake).await?;
        self.after_seated(caller, &seating).await;
        Ok(seating.snapshot)
    }

    pub async fn join_private_room(&self, caller: &Caller, code: &str) -> RoomResult<RoomSnapshot> {
        let seating = self.registry.join_private(caller, code).await?;
        self.after_seated(caller, &seating).await;
        Ok(seating.snapshot)
    }

    /// Remove the caller from their room.
    ///
    /// # Errors
    ///
    /// * `RoomError::NotMember` - caller is not seated anywhere
    pub async fn leave_room(&self, caller: &Caller) -> RoomResult<RoomSnapshot> {
        let departure = self.registry.leave(caller.user_id).await?;
        self.after_departure(&departure).await;
        Ok(departure.snapshot)
    }

    /// Start the caller's room now instead of waiting for the countdown.
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - room missing or inactive
    /// * `RoomError::NotMember` - caller is not seated in this room
    /// * `RoomError::GameInProgress` - the game already started
    /// * `RoomError::InsufficientParticipants` - too few funded members
    pub async fn start_game(&self, caller: &Caller, room_id: RoomId) -> RoomResult<GameStart> {
        self.registry.get(room_id).await?.ok_or(RoomError::NotFound)?;

        let _turn = self.enter_room(room_id).await;
        let snapshot = self.registry.get(room_id).await?.ok_or(RoomError::NotFound)?;
        if !snapshot.members.iter().any(|m| m.user_id == caller.user_id) {
            return Err(RoomError::NotMember);
        }
        if !snapshot.room.is_waiting() {
            return Err(RoomError::GameInProgress);
        }

        self.clock.cancel(room_id).await;
        log::info!("User {} started room {} manually", caller.user_id, room_id);
        self.run_game(&snapshot.room).await
    }

    pub async fn list_rooms(&self, filter: &RoomFilter, page: Pagination) -> RoomResult<Vec<Room>> {
        self.registry.list(filter, page).await
    }

    /// An active room with its members
    ///
    /// # Errors
    ///
    /// * `RoomError::NotFound` - unknown or inactive room
    pub async fn get_room(&self, room_id: RoomId) -> RoomResult<RoomSnapshot> {
        self.registry.get(room_id).await?.ok_or(RoomError::NotFound)
    }

    pub async fn countdown_active(&self, room_id: RoomId) -> bool {
        self.clock.is_running(room_id).await
    }

    /// Stop every countdown; used on server shutdown
    pub async fn shutdown(&self) {
        self.clock.shutdown().await;
    }

    /// Wait for this room's turn. Held across a fresh read and whatever is
    /// decided from it.
    async fn enter_room(&self, room_id: RoomId) -> OwnedMutexGuard<()> {
        let gate = self.gates.lock().await.entry(room_id).or_default().clone();
        gate.lock_owned().await
    }

    /// Latest committed state of an active room
    async fn current(&self, room_id: RoomId) -> Option<RoomSnapshot> {
        match self.registry.get(room_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Failed to reload room {}: {}", room_id, e);
                None
            }
        }
    }

    async fn after_seated(&self, caller: &Caller, seating: &Seating) {
        let room_id = seating.snapshot.room.id;
        let _turn = self.enter_room(room_id).await;
        self.bus.join_channel(caller.user_id, room_id).await;

        let current = self.current(room_id).await;
        if seating.created {
            self.bus
                .send_to_user(
                    caller.user_id,
                    RoomEvent::RoomCreated {
                        room: seating.snapshot.clone(),
                    },
                )
                .await;
        } else {
            self.bus
                .send_to_room(
                    room_id,
                    RoomEvent::PlayerJoined {
                        user_id: caller.user_id,
                        room: current.clone().unwrap_or_else(|| seating.snapshot.clone()),
                    },
                )
                .await;
        }

        // Gone or already started: a later operation owns the clock now.
        let Some(room) = current.map(|snapshot| snapshot.room) else {
            return;
        };
        if !room.is_waiting() {
            return;
        }
        if self.has_quorum(&room) {
            self.clock.start(room_id, Arc::new(self.clone())).await;
        } else {
            self.bus
                .send_to_room(room_id, RoomEvent::wait_for_game(room_id))
                .await;
        }
    }

    async fn after_departure(&self, departure: &Departure) {
        let room_id = departure.snapshot.room.id;
        let _turn = self.enter_room(room_id).await;

        let current = self.current(room_id).await;
        self.bus
            .send_to_room(
                room_id,
                RoomEvent::PlayerLeft {
                    user_id: departure.user_id,
                    room: current.clone().unwrap_or_else(|| departure.snapshot.clone()),
                },
            )
            .await;
        self.bus.leave_channel(departure.user_id, room_id).await;

        let Some(room) = current.map(|snapshot| snapshot.room) else {
            if departure.deactivated {
                self.clock.cancel(room_id).await;
                self.gates.lock().await.remove(&room_id);
            }
            return;
        };
        if !room.is_waiting() || self.has_quorum(&room) {
            return;
        }
        if self.clock.cancel(room_id).await {
            log::info!("Room {} dropped below quorum, countdown stopped", room_id);
        }
        self.bus
            .send_to_room(room_id, RoomEvent::wait_for_game(room_id))
            .await;
    }

    fn has_quorum(&self, room: &Room) -> bool {
        usize::try_from(room.member_count).unwrap_or(0) >= self.config.min_participants
    }

    /// Collect the pot, deal to the payers and store their hands.
    async fn run_game(&self, room: &Room) -> RoomResult<GameStart> {
        let collection = self.collector.collect(room.id, room.stake).await?;

        self.bus
            .send_to_room(
                room.id,
                RoomEvent::GameStarted {
                    room_id: room.id,
                    total_collected: collection.collected_total,
                    players: collection.members.clone(),
                },
            )
            .await;

        let payers: Vec<_> = collection.payers().cloned().collect();
        let dealt = deal(payers, &mut rand::rng())?;

        let mut tx = self.store.begin().await?;
        let mut hands = Vec::with_capacity(dealt.len());
        for hand in dealt {
            let hand_value = hand.rank.value();
            match tx
                .record_hand(hand.seat.membership_id, &hand.cards, hand_value)
                .await
            {
                Ok(()) => {}
                Err(RoomError::NotMember) => {
                    log::debug!(
                        "User {} left room {} before the deal was stored",
                        hand.seat.user_id,
                        room.id
                    );
                }
                Err(e) => return Err(e),
            }
            hands.push(DealtMember {
                user_id: hand.seat.user_id,
                hand: hand.cards.to_vec(),
                hand_value,
            });
        }
        tx.commit().await?;

        self.bus
            .send_to_room(
                room.id,
                RoomEvent::DealCards {
                    room_id: room.id,
                    members: hands.clone(),
                },
            )
            .await;

        log::info!(
            "Game started in room {} with {} players, pot {}",
            room.id,
            hands.len(),
            collection.collected_total
        );
        Ok(GameStart { collection, hands })
    }
}

#[async_trait]
impl<S: RoomStore> CountdownExpiry for RoomEngine<S> {
    async fn countdown_expired(&self, room_id: RoomId) {
        let _turn = self.enter_room(room_id).await;
        let room = match self.registry.get(room_id).await {
            Ok(Some(snapshot)) => snapshot.room,
            Ok(None) => {
                log::debug!("Room {} gone before its countdown expired", room_id);
                return;
            }
            Err(e) => {
                log::warn!("Failed to load room {} at countdown expiry: {}", room_id, e);
                return;
            }
        };
        if !room.is_waiting() {
            log::debug!("Room {} already started, ignoring countdown expiry", room_id);
            return;
        }

        match self.run_game(&room).await {
            Ok(_) => {}
            Err(RoomError::GameInProgress) => {
                log::debug!("Room {} started elsewhere during countdown expiry", room_id);
            }
            Err(e) => {
                log::warn!("Game start failed in room {}: {}", room_id, e);
                self.bus
                    .send_to_room(
                        room_id,
                        RoomEvent::GameStartFailed {
                            room_id,
                            reason: e.client_message(),
                        },
                    )
                    .await;
            }
        }
    }
}
