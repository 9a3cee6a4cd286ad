//! Room registry: creation, matchmaking, joining and leaving.

use super::{
    code::{generate_join_code, normalize_join_code},
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    membership::MembershipLedger,
    models::{
        Caller, NewRoom, Pagination, Room, RoomFilter, RoomId, RoomSnapshot, UserId,
        validate_stake,
    },
};
use crate::db::{RoomStore, RoomTx};
use std::sync::Arc;

/// A successful seat in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seating {
    pub snapshot: RoomSnapshot,
    /// The room was created for this caller
    pub created: bool,
}

/// A successful departure from a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub user_id: UserId,
    /// The room after the member left
    pub snapshot: RoomSnapshot,
    pub deactivated: bool,
}

pub struct RoomRegistry<S: RoomStore> {
    store: Arc<S>,
    config: Arc<RoomConfig>,
}

impl<S: RoomStore> Clone for RoomRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

fn ensure_funds(caller: &Caller, stake: i64) -> RoomResult<()> {
    if caller.balance < stake {
        return Err(RoomError::InsufficientFunds {
            required: stake,
            available: caller.balance,
        });
    }
    Ok(())
}

async fn ensure_unseated<T: RoomTx>(tx: &mut T, user_id: UserId) -> RoomResult<()> {
    if tx.find_active_membership(user_id).await?.is_some() {
        return Err(RoomError::AlreadyElsewhere);
    }
    Ok(())
}

/// Adds the user to the room and bumps its member count in the same unit
/// of work.
async fn seat<T: RoomTx>(tx: &mut T, mut room: Room, user_id: UserId) -> RoomResult<RoomSnapshot> {
    tx.add_member(room.id, user_id).await?;
    room.member_count += 1;
    let room = tx.save_room(&room).await?;
    let members = tx.all_members(room.id).await?;
    Ok(RoomSnapshot { room, members })
}

impl<S: RoomStore> RoomRegistry<S> {
    pub fn new(store: Arc<S>, config: Arc<RoomConfig>) -> Self {
        Self { store, config }
    }

    /// Create a private room owned by the caller, seat them in it and hand
    /// out a fresh join code.
    ///
    /// # Errors
    ///
    /// * `RoomError::InvalidStake` - stake is not positive
    /// * `RoomError::InsufficientFunds` - caller balance below the stake
    /// * `RoomError::AlreadyElsewhere` - caller already sits in a room
    /// * `RoomError::DuplicateCode` - every code attempt collided
    pub async fn create_private(&self, caller: &Caller, stake: i64) -> RoomResult<Seating> {
        validate_stake(stake)?;
        ensure_funds(caller, stake)?;

        for attempt in 1..=self.config.join_code_attempts {
            let code = generate_join_code(&mut rand::rng(), self.config.join_code_length);
            let new_room = NewRoom::private(caller.user_id, stake, code, &self.config)?;

            let mut tx = self.store.begin().await?;
            tx.lock_user(caller.user_id).await?;
            ensure_unseated(&mut tx, caller.user_id).await?;

            if tx.code_in_use(new_room.join_code.as_deref().unwrap_or_default()).await? {
                log::debug!("Join code collision on attempt {}", attempt);
                continue;
            }
            let room = match tx.insert_room(&new_room).await {
                Ok(room) => room,
                Err(RoomError::DuplicateCode) => {
                    log::debug!("Join code taken concurrently on attempt {}", attempt);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let snapshot = seat(&mut tx, room, caller.user_id).await?;
            tx.commit().await?;

            log::info!(
                "Created private room {} for user {}",
                snapshot.room.id,
                caller.user_id
            );
            return Ok(Seating {
                snapshot,
                created: true,
            });
        }

        log::warn!(
            "Gave up allocating a join code after {} attempts",
            self.config.join_code_attempts
        );
        Err(RoomError::DuplicateCode)
    }

    /// Seat the caller in the oldest open public room at this stake, or in a
    /// new one when none has a free seat. Matchmaking for one stake is
    /// serialized so concurrent callers never both create a room while one
    /// with space exists.
    ///
    /// # Errors
    ///
    /// * `RoomError::InvalidStake` - stake is not positive
    /// * `RoomError::InsufficientFunds` - caller balance below the stake
    /// * `RoomError::AlreadyElsewhere` - caller already sits in a room
    pub async fn match_or_create_public(&self, caller: &Caller, stake: i64) -> RoomResult<Seating> {
        validate_stake(stake)?;
        ensure_funds(caller, stake)?;

        let mut tx = self.store.begin().await?;
        tx.lock_user(caller.user_id).await?;
        ensure_unseated(&mut tx, caller.user_id).await?;
        tx.lock_public_bucket(stake).await?;

        let (room, created) = match tx.find_open_public_room(stake).await? {
            Some(room) => (room, false),
            None => {
                let new_room = NewRoom::public(caller.user_id, stake, &self.config)?;
                (tx.insert_room(&new_room).await?, true)
            }
        };

        let snapshot = seat(&mut tx, room, caller.user_id).await?;
        tx.commit().await?;

        if created {
            log::info!(
                "Created public room {} at stake {} for user {}",
                snapshot.room.id,
                stake,
                caller.user_id
            );
        } else {
            log::info!(
                "Matched user {} into public room {}",
                caller.user_id,
                snapshot.room.id
            );
        }
        Ok(Seating { snapshot, created })
    }

    /// Seat the caller in the private room holding `code`.
    ///
    /// # Errors
    ///
    /// * `RoomError::InvalidCode` - malformed code
    /// * `RoomError::NotFound` - no active room holds the code
    /// * `RoomError::Full` - no free seat
    /// * `RoomError::AlreadyMember` - caller already sits in this room
    /// * `RoomError::AlreadyElsewhere` - caller sits in another room
    /// * `RoomError::GameInProgress` - the room's game has started
    /// * `RoomError::InsufficientFunds` - caller balance below the stake
    pub async fn join_private(&self, caller: &Caller, code: &str) -> RoomResult<Seating> {
        let code = normalize_join_code(code, self.config.join_code_length)?;

        let mut tx = self.store.begin().await?;
        tx.lock_user(caller.user_id).await?;
        let room = tx
            .lock_room_by_code(&code)
            .await?
            .ok_or(RoomError::NotFound)?;

        if room.is_full() {
            return Err(RoomError::Full);
        }
        if let Some(current) = tx.find_active_membership(caller.user_id).await? {
            return Err(if current.room_id == room.id {
                RoomError::AlreadyMember
            } else {
                RoomError::AlreadyElsewhere
            });
        }
        if !room.is_waiting() {
            return Err(RoomError::GameInProgress);
        }
        ensure_funds(caller, room.stake)?;

        let snapshot = seat(&mut tx, room, caller.user_id).await?;
        tx.commit().await?;

        log::info!(
            "User {} joined private room {}",
            caller.user_id,
            snapshot.room.id
        );
        Ok(Seating {
            snapshot,
            created: false,
        })
    }

    /// Remove the caller from their room. The room is deactivated when its
    /// last member leaves.
    ///
    /// # Errors
    ///
    /// * `RoomError::NotMember` - caller has no active membership
    pub async fn leave(&self, user_id: UserId) -> RoomResult<Departure> {
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?;

        let membership = tx
            .find_active_membership(user_id)
            .await?
            .ok_or(RoomError::NotMember)?;
        let mut room = tx
            .lock_room(membership.room_id)
            .await?
            .ok_or(RoomError::NotFound)?;

        tx.remove_member(membership.id).await?;
        room.member_count = (room.member_count - 1).max(0);
        let deactivated = room.member_count == 0;
        if deactivated {
            room.is_active = false;
        }
        let room = tx.save_room(&room).await?;
        let members = tx.all_members(room.id).await?;
        tx.commit().await?;

        if deactivated {
            log::info!("Room {} deactivated after last member left", room.id);
        } else {
            log::info!("User {} left room {}", user_id, room.id);
        }
        Ok(Departure {
            user_id,
            snapshot: RoomSnapshot { room, members },
            deactivated,
        })
    }

    /// Active room with its members, `None` for unknown or inactive rooms
    pub async fn get(&self, room_id: RoomId) -> RoomResult<Option<RoomSnapshot>> {
        let Some(room) = self.store.get_room(room_id).await?.filter(|r| r.is_active) else {
            return Ok(None);
        };
        let members = self.store.room_members(room_id).await?;
        Ok(Some(RoomSnapshot { room, members }))
    }

    pub async fn list(&self, filter: &RoomFilter, page: Pagination) -> RoomResult<Vec<Room>> {
        self.store.list_rooms(filter, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRoomStore;
    use crate::room::{RoomKind, RoomStatus};

    fn registry() -> (Arc<MemoryRoomStore>, RoomRegistry<MemoryRoomStore>) {
        let store = Arc::new(MemoryRoomStore::new());
        let registry = RoomRegistry::new(store.clone(), Arc::new(RoomConfig::default()));
        (store, registry)
    }

    fn caller(user_id: UserId) -> Caller {
        Caller {
            user_id,
            balance: 1_000,
        }
    }

    async fn assert_count_matches(store: &MemoryRoomStore, room_id: RoomId) {
        let room = store.get_room(room_id).await.unwrap().unwrap();
        let members = store.room_members(room_id).await.unwrap();
        assert_eq!(room.member_count as usize, members.len());
        assert!(room.member_count <= room.capacity);
    }

    #[tokio::test]
    async fn test_create_private_seats_owner() {
        let (store, registry) = registry();
        let seating = registry.create_private(&caller(1), 50).await.unwrap();

        let room = &seating.snapshot.room;
        assert!(seating.created);
        assert_eq!(room.kind, RoomKind::Private);
        assert_eq!(room.capacity, 7);
        assert_eq!(room.member_count, 1);
        assert_eq!(room.owner_id, 1);
        assert_eq!(room.join_code.as_ref().map(String::len), Some(6));
        assert_eq!(room.pot_limit, 200);
        assert_eq!(room.display_threshold, 1500);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_count_matches(&store, room.id).await;
    }

    #[tokio::test]
    async fn test_create_private_checks_funds_and_seat() {
        let (_, registry) = registry();
        let poor = Caller {
            user_id: 1,
            balance: 10,
        };
        assert!(matches!(
            registry.create_private(&poor, 50).await,
            Err(RoomError::InsufficientFunds {
                required: 50,
                available: 10
            })
        ));

        registry.create_private(&caller(2), 50).await.unwrap();
        assert!(matches!(
            registry.create_private(&caller(2), 50).await,
            Err(RoomError::AlreadyElsewhere)
        ));
        assert!(matches!(
            registry.create_private(&caller(3), 0).await,
            Err(RoomError::InvalidStake(0))
        ));
    }

    #[tokio::test]
    async fn test_join_private_by_code() {
        let (store, registry) = registry();
        let owner = registry.create_private(&caller(1), 20).await.unwrap();
        let code = owner.snapshot.room.join_code.clone().unwrap();

        let joined = registry
            .join_private(&caller(2), &code.to_lowercase())
            .await
            .unwrap();
        assert!(!joined.created);
        assert_eq!(joined.snapshot.room.id, owner.snapshot.room.id);
        assert_eq!(joined.snapshot.room.member_count, 2);
        let users: Vec<UserId> = joined.snapshot.members.iter().map(|m| m.user_id).collect();
        assert_eq!(users, vec![1, 2]);
        assert_count_matches(&store, joined.snapshot.room.id).await;
    }

    #[tokio::test]
    async fn test_join_private_errors() {
        let (_, registry) = registry();
        let owner = registry.create_private(&caller(1), 20).await.unwrap();
        let code = owner.snapshot.room.join_code.clone().unwrap();

        assert!(matches!(
            registry.join_private(&caller(2), "ZZZZZZ").await,
            Err(RoomError::NotFound)
        ));
        assert!(matches!(
            registry.join_private(&caller(2), "bad").await,
            Err(RoomError::InvalidCode)
        ));
        assert!(matches!(
            registry.join_private(&caller(1), &code).await,
            Err(RoomError::AlreadyMember)
        ));

        registry.create_private(&caller(3), 20).await.unwrap();
        assert!(matches!(
            registry.join_private(&caller(3), &code).await,
            Err(RoomError::AlreadyElsewhere)
        ));

        let poor = Caller {
            user_id: 4,
            balance: 19,
        };
        assert!(matches!(
            registry.join_private(&poor, &code).await,
            Err(RoomError::InsufficientFunds { .. })
        ));
    }

    #[tokio::test]
    async fn test_private_room_fills_up() {
        let (store, registry) = registry();
        let owner = registry.create_private(&caller(1), 20).await.unwrap();
        let code = owner.snapshot.room.join_code.clone().unwrap();

        for user_id in 2..=7 {
            registry.join_private(&caller(user_id), &code).await.unwrap();
        }
        assert!(matches!(
            registry.join_private(&caller(8), &code).await,
            Err(RoomError::Full)
        ));
        assert_count_matches(&store, owner.snapshot.room.id).await;
    }

    #[tokio::test]
    async fn test_public_matchmaking_fills_then_spills() {
        let (store, registry) = registry();
        let mut rooms = Vec::new();
        for user_id in 1..=6 {
            let seating = registry
                .match_or_create_public(&caller(user_id), 10)
                .await
                .unwrap();
            rooms.push((seating.snapshot.room.id, seating.created));
        }

        let first = rooms[0].0;
        assert!(rooms[0].1);
        assert!(rooms[1..5].iter().all(|(id, created)| *id == first && !created));
        assert_ne!(rooms[5].0, first);
        assert!(rooms[5].1);
        assert_count_matches(&store, first).await;
    }

    #[tokio::test]
    async fn test_public_matchmaking_separates_stakes() {
        let (_, registry) = registry();
        let a = registry.match_or_create_public(&caller(1), 10).await.unwrap();
        let b = registry.match_or_create_public(&caller(2), 20).await.unwrap();
        assert_ne!(a.snapshot.room.id, b.snapshot.room.id);
        assert!(b.created);
    }

    #[tokio::test]
    async fn test_leave_deactivates_empty_room() {
        let (store, registry) = registry();
        let owner = registry.create_private(&caller(1), 20).await.unwrap();
        let room_id = owner.snapshot.room.id;
        let code = owner.snapshot.room.join_code.clone().unwrap();
        registry.join_private(&caller(2), &code).await.unwrap();

        let departure = registry.leave(1).await.unwrap();
        assert!(!departure.deactivated);
        assert!(departure.snapshot.room.is_active);
        assert_eq!(departure.snapshot.room.member_count, 1);
        assert_count_matches(&store, room_id).await;

        let departure = registry.leave(2).await.unwrap();
        assert!(departure.deactivated);
        assert!(!departure.snapshot.room.is_active);
        assert_eq!(departure.snapshot.room.member_count, 0);

        assert!(registry.get(room_id).await.unwrap().is_none());
        assert!(matches!(
            registry.join_private(&caller(3), &code).await,
            Err(RoomError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_leave_without_membership() {
        let (_, registry) = registry();
        assert!(matches!(registry.leave(9).await, Err(RoomError::NotMember)));
    }

    #[tokio::test]
    async fn test_user_can_rejoin_after_leaving() {
        let (_, registry) = registry();
        registry.match_or_create_public(&caller(1), 10).await.unwrap();
        registry.leave(1).await.unwrap();
        let seating = registry.match_or_create_public(&caller(1), 10).await.unwrap();
        assert!(seating.created);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_private_joins_respect_capacity() {
        let (store, registry) = registry();
        let owner = registry.create_private(&caller(1), 20).await.unwrap();
        let code = owner.snapshot.room.join_code.clone().unwrap();

        let mut handles = Vec::new();
        for user_id in 2..=20 {
            let registry = registry.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move {
                registry.join_private(&caller(user_id), &code).await
            }));
        }

        let mut joined = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => joined += 1,
                Err(RoomError::Full) => full += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(joined, 6);
        assert_eq!(full, 13);
        assert_count_matches(&store, owner.snapshot.room.id).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_matchmaking_creates_one_room() {
        let (store, registry) = registry();

        let a = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.match_or_create_public(&caller(1), 10).await })
        };
        let b = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.match_or_create_public(&caller(2), 10).await })
        };
        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert_eq!(a.snapshot.room.id, b.snapshot.room.id);
        assert_ne!(a.created, b.created);
        let rooms = store
            .list_rooms(&RoomFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].member_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_matchmaking_never_overfills() {
        let (store, registry) = registry();

        let mut handles = Vec::new();
        for user_id in 1..=12 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.match_or_create_public(&caller(user_id), 10).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rooms = store
            .list_rooms(&RoomFilter::default(), Pagination::default())
            .await
            .unwrap();
        let mut counts: Vec<i32> = rooms.iter().map(|r| r.member_count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![2, 5, 5]);
        for room in &rooms {
            assert_count_matches(&store, room.id).await;
        }
    }
}
