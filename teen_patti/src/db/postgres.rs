//! PostgreSQL room store.
#![allow(clippy::needless_raw_string_hashes)]

use super::repository::{RoomStore, RoomTx};
use crate::game::Card;
use crate::room::{
    MembershipLedger, NewRoom, Pagination, Room, RoomError, RoomFilter, RoomId, RoomResult,
    UserId,
    models::{Membership, MembershipId, PlayState},
};
use crate::wallet::{Debit, FundsLedger, WalletError, WalletManager, WalletResult, manager};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow, types::Json};
use std::sync::Arc;

const ROOM_COLUMNS: &str = "id, kind, join_code, owner_id, capacity, member_count, stake, \
     pot_limit, display_threshold, total_collected, status, is_active, winner_id, \
     created_at, updated_at";

const MEMBERSHIP_COLUMNS: &str =
    "id, room_id, user_id, joined_at, play_state, hand, hand_value";

/// Partial unique index: one active room per join code
const ACTIVE_CODE_INDEX: &str = "rooms_active_join_code";

/// Partial unique index: one active membership per user
const ACTIVE_MEMBERSHIP_INDEX: &str = "room_memberships_one_active_per_user";

/// Room store backed by PostgreSQL
#[derive(Clone)]
pub struct PgRoomStore {
    pool: Arc<PgPool>,
    wallets: WalletManager,
}

impl PgRoomStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            wallets: WalletManager::new(pool.clone()),
            pool,
        }
    }

    /// Wallet access on the same pool, for balance reads and deposits
    pub fn wallets(&self) -> &WalletManager {
        &self.wallets
    }
}

fn decode_error(column: &str, message: String) -> RoomError {
    RoomError::Database(sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    })
}

fn room_from_row(row: &PgRow) -> RoomResult<Room> {
    Ok(Room {
        id: row.get("id"),
        kind: row
            .get::<String, _>("kind")
            .parse()
            .map_err(|e| decode_error("kind", e))?,
        join_code: row.get("join_code"),
        owner_id: row.get("owner_id"),
        capacity: row.get("capacity"),
        member_count: row.get("member_count"),
        stake: row.get("stake"),
        pot_limit: row.get("pot_limit"),
        display_threshold: row.get("display_threshold"),
        total_collected: row.get("total_collected"),
        status: row
            .get::<String, _>("status")
            .parse()
            .map_err(|e| decode_error("status", e))?,
        is_active: row.get("is_active"),
        winner_id: row.get("winner_id"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
    })
}

fn membership_from_row(row: &PgRow) -> RoomResult<Membership> {
    Ok(Membership {
        id: row.get("id"),
        room_id: row.get("room_id"),
        user_id: row.get("user_id"),
        joined_at: row.get::<chrono::NaiveDateTime, _>("joined_at").and_utc(),
        play_state: row
            .get::<String, _>("play_state")
            .parse()
            .map_err(|e| decode_error("play_state", e))?,
        hand: row
            .get::<Option<Json<Vec<Card>>>, _>("hand")
            .map(|hand| hand.0),
        hand_value: row.get("hand_value"),
    })
}

/// Maps violations of the partial unique indexes to the conflicts they
/// guard against.
fn map_unique_violation(err: sqlx::Error) -> RoomError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(ACTIVE_CODE_INDEX) => return RoomError::DuplicateCode,
                Some(ACTIVE_MEMBERSHIP_INDEX) => return RoomError::AlreadyElsewhere,
                _ => {}
            }
        }
    }
    RoomError::Database(err)
}

#[async_trait]
impl RoomStore for PgRoomStore {
    type Tx = PgRoomTx;

    async fn begin(&self) -> RoomResult<PgRoomTx> {
        let tx = self.pool.begin().await?;
        Ok(PgRoomTx { tx })
    }

    async fn get_room(&self, room_id: RoomId) -> RoomResult<Option<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(room_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(room_from_row).transpose()
    }

    async fn list_rooms(&self, filter: &RoomFilter, page: Pagination) -> RoomResult<Vec<Room>> {
        let sql = format!(
            r#"
            SELECT {ROOM_COLUMNS}
            FROM rooms
            WHERE ($1 OR is_active)
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::bigint IS NULL OR stake = $4)
            ORDER BY id DESC
            LIMIT $5 OFFSET $6
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.include_inactive)
            .bind(filter.kind.map(|k| k.to_string()))
            .bind(filter.status.map(|s| s.to_string()))
            .bind(filter.stake)
            .bind(i64::from(page.limit()))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.iter().map(room_from_row).collect()
    }

    async fn room_members(&self, room_id: RoomId) -> RoomResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM room_memberships
             WHERE room_id = $1 AND left_at IS NULL
             ORDER BY joined_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(room_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.iter().map(membership_from_row).collect()
    }

    async fn wallet_balance(&self, user_id: UserId) -> RoomResult<Option<i64>> {
        match self.wallets.get_balance(user_id).await {
            Ok(balance) => Ok(Some(balance)),
            Err(WalletError::WalletNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> RoomResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

/// Open transaction on a [`PgRoomStore`]
pub struct PgRoomTx {
    tx: Transaction<'static, Postgres>,
}

impl PgRoomTx {
    async fn advisory_lock(&mut self, key: String) -> RoomResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(key)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn fetch_room(&mut self, sql: &str, bind: RoomKey<'_>) -> RoomResult<Option<Room>> {
        let query = sqlx::query(sql);
        let query = match bind {
            RoomKey::Id(id) => query.bind(id),
            RoomKey::Code(code) => query.bind(code.to_string()),
            RoomKey::Stake(stake) => query.bind(stake),
        };
        let row = query.fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(room_from_row).transpose()
    }
}

enum RoomKey<'a> {
    Id(RoomId),
    Code(&'a str),
    Stake(i64),
}

#[async_trait]
impl MembershipLedger for PgRoomTx {
    async fn find_active_membership(&mut self, user_id: UserId) -> RoomResult<Option<Membership>> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM room_memberships
             WHERE user_id = $1 AND left_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(membership_from_row).transpose()
    }

    async fn all_members(&mut self, room_id: RoomId) -> RoomResult<Vec<Membership>> {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM room_memberships
             WHERE room_id = $1 AND left_at IS NULL
             ORDER BY joined_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(room_id)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(membership_from_row).collect()
    }

    async fn add_member(&mut self, room_id: RoomId, user_id: UserId) -> RoomResult<Membership> {
        let sql = format!(
            "INSERT INTO room_memberships (room_id, user_id)
             VALUES ($1, $2)
             RETURNING {MEMBERSHIP_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(room_id)
            .bind(user_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_unique_violation)?;

        membership_from_row(&row)
    }

    async fn remove_member(&mut self, membership_id: MembershipId) -> RoomResult<()> {
        let result = sqlx::query(
            "UPDATE room_memberships SET left_at = NOW()
             WHERE id = $1 AND left_at IS NULL",
        )
        .bind(membership_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RoomError::NotMember);
        }
        Ok(())
    }

    async fn set_play_state(&mut self, room_id: RoomId, state: PlayState) -> RoomResult<u64> {
        let result = sqlx::query(
            "UPDATE room_memberships SET play_state = $2
             WHERE room_id = $1 AND left_at IS NULL",
        )
        .bind(room_id)
        .bind(state.to_string())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn set_member_play_state(
        &mut self,
        membership_id: MembershipId,
        state: PlayState,
    ) -> RoomResult<()> {
        let result = sqlx::query(
            "UPDATE room_memberships SET play_state = $2
             WHERE id = $1 AND left_at IS NULL",
        )
        .bind(membership_id)
        .bind(state.to_string())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RoomError::NotMember);
        }
        Ok(())
    }

    async fn record_hand(
        &mut self,
        membership_id: MembershipId,
        hand: &[Card],
        hand_value: i32,
    ) -> RoomResult<()> {
        let result = sqlx::query(
            "UPDATE room_memberships SET hand = $2, hand_value = $3
             WHERE id = $1 AND left_at IS NULL",
        )
        .bind(membership_id)
        .bind(Json(hand.to_vec()))
        .bind(hand_value)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RoomError::NotMember);
        }
        Ok(())
    }
}

#[async_trait]
impl FundsLedger for PgRoomTx {
    async fn balance(&mut self, user_id: UserId) -> WalletResult<i64> {
        manager::locked_balance(&mut self.tx, user_id).await
    }

    async fn debit(&mut self, debit: &Debit) -> WalletResult<i64> {
        manager::apply_debit(&mut self.tx, debit).await
    }
}

#[async_trait]
impl RoomTx for PgRoomTx {
    async fn lock_user(&mut self, user_id: UserId) -> RoomResult<()> {
        self.advisory_lock(format!("room_user:{user_id}")).await
    }

    async fn lock_public_bucket(&mut self, stake: i64) -> RoomResult<()> {
        self.advisory_lock(format!("public_room:{stake}")).await
    }

    async fn lock_room(&mut self, room_id: RoomId) -> RoomResult<Option<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE");
        self.fetch_room(&sql, RoomKey::Id(room_id)).await
    }

    async fn lock_room_by_code(&mut self, code: &str) -> RoomResult<Option<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms
             WHERE join_code = $1 AND kind = 'private' AND is_active
             FOR UPDATE"
        );
        self.fetch_room(&sql, RoomKey::Code(code)).await
    }

    async fn find_open_public_room(&mut self, stake: i64) -> RoomResult<Option<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms
             WHERE kind = 'public' AND stake = $1 AND is_active
               AND status = 'waiting' AND member_count < capacity
             ORDER BY id
             LIMIT 1
             FOR UPDATE"
        );
        self.fetch_room(&sql, RoomKey::Stake(stake)).await
    }

    async fn code_in_use(&mut self, code: &str) -> RoomResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM rooms WHERE join_code = $1 AND is_active) AS in_use",
        )
        .bind(code)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.get("in_use"))
    }

    async fn insert_room(&mut self, room: &NewRoom) -> RoomResult<Room> {
        let sql = format!(
            r#"
            INSERT INTO rooms (kind, join_code, owner_id, capacity, stake, pot_limit, display_threshold)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ROOM_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(room.kind.to_string())
            .bind(room.join_code.as_deref())
            .bind(room.owner_id)
            .bind(room.capacity)
            .bind(room.stake)
            .bind(room.pot_limit)
            .bind(room.display_threshold)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_unique_violation)?;

        room_from_row(&row)
    }

    async fn save_room(&mut self, room: &Room) -> RoomResult<Room> {
        let sql = format!(
            r#"
            UPDATE rooms
            SET member_count = $2, total_collected = $3, status = $4,
                is_active = $5, winner_id = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {ROOM_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(room.id)
            .bind(room.member_count)
            .bind(room.total_collected)
            .bind(room.status.to_string())
            .bind(room.is_active)
            .bind(room.winner_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(RoomError::NotFound)?;

        room_from_row(&row)
    }

    async fn commit(self) -> RoomResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
