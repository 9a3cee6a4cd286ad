//! Wallet manager over the shared balance table.
#![allow(clippy::needless_raw_string_hashes)]

use super::{
    errors::{WalletError, WalletResult},
    models::{Debit, EntryDirection, EntryType, Wallet, WalletEntry},
};
use crate::room::{RoomId, UserId};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use std::sync::Arc;

/// Wallet manager
#[derive(Clone)]
pub struct WalletManager {
    pool: Arc<PgPool>,
}

impl WalletManager {
    /// Create a new wallet manager
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Get wallet for a user
    ///
    /// # Arguments
    ///
    /// * `user_id` - User ID
    ///
    /// # Returns
    ///
    /// * `WalletResult<Wallet>` - Wallet information or error
    pub async fn get_wallet(&self, user_id: UserId) -> WalletResult<Wallet> {
        let row = sqlx::query(
            r#"
            SELECT user_id, balance, currency, created_at, updated_at
            FROM wallets
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(WalletError::WalletNotFound(user_id))?;

        Ok(Wallet {
            user_id: row.get("user_id"),
            balance: row.get("balance"),
            currency: row.get("currency"),
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
        })
    }

    /// Get the current balance for a user
    ///
    /// # Errors
    ///
    /// * `WalletError::WalletNotFound` - the user never held a wallet
    pub async fn get_balance(&self, user_id: UserId) -> WalletResult<i64> {
        Ok(self.get_wallet(user_id).await?.balance)
    }

    /// Credit a wallet, creating it on first deposit
    ///
    /// # Arguments
    ///
    /// * `user_id` - User ID
    /// * `amount` - Amount to credit
    /// * `idempotency_key` - Unique key to prevent duplicate transactions
    ///
    /// # Returns
    ///
    /// * `WalletResult<i64>` - New wallet balance or error
    pub async fn credit(
        &self,
        user_id: UserId,
        amount: i64,
        idempotency_key: String,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        let mut tx = self.pool.begin().await?;
        ensure_unused_key(&mut tx, &idempotency_key).await?;

        let row = sqlx::query(
            "INSERT INTO wallets (user_id, balance, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (user_id)
             DO UPDATE SET
                balance = wallets.balance + EXCLUDED.balance,
                updated_at = NOW()
             RETURNING balance",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;
        let new_balance: i64 = row.get("balance");

        insert_entry(
            &mut tx,
            user_id,
            None,
            amount,
            new_balance,
            EntryDirection::Credit,
            EntryType::Deposit,
            &idempotency_key,
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(new_balance)
    }

    /// Get wallet entries for a user, newest first
    ///
    /// # Arguments
    ///
    /// * `user_id` - User ID
    /// * `limit` - Maximum number of entries to return
    ///
    /// # Returns
    ///
    /// * `WalletResult<Vec<WalletEntry>>` - List of wallet entries
    pub async fn get_entries(&self, user_id: UserId, limit: i64) -> WalletResult<Vec<WalletEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, room_id, amount, balance_after, direction, entry_type, idempotency_key, description, created_at
            FROM wallet_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(entry_from_row).collect()
    }
}

fn entry_from_row(row: &PgRow) -> WalletResult<WalletEntry> {
    let decode = |column: &str, message: String| {
        WalletError::Database(sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: message.into(),
        })
    };

    Ok(WalletEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        room_id: row.get("room_id"),
        amount: row.get("amount"),
        balance_after: row.get("balance_after"),
        direction: row
            .get::<String, _>("direction")
            .parse()
            .map_err(|e| decode("direction", e))?,
        entry_type: row
            .get::<String, _>("entry_type")
            .parse()
            .map_err(|e| decode("entry_type", e))?,
        idempotency_key: row.get("idempotency_key"),
        description: row.get("description"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

async fn ensure_unused_key(conn: &mut PgConnection, idempotency_key: &str) -> WalletResult<()> {
    let existing = sqlx::query("SELECT id FROM wallet_entries WHERE idempotency_key = $1")
        .bind(idempotency_key)
        .fetch_optional(&mut *conn)
        .await?;

    if existing.is_some() {
        return Err(WalletError::DuplicateTransaction(idempotency_key.to_string()));
    }
    Ok(())
}

/// Debits a wallet on an open connection and writes the ledger line.
///
/// Every balance decrease goes through here, whether it comes from the
/// manager or from a room transaction.
pub(crate) async fn apply_debit(conn: &mut PgConnection, debit: &Debit) -> WalletResult<i64> {
    if debit.amount <= 0 {
        return Err(WalletError::InvalidAmount(debit.amount));
    }

    ensure_unused_key(conn, &debit.idempotency_key).await?;

    let updated = sqlx::query(
        "UPDATE wallets
         SET balance = balance - $1, updated_at = NOW()
         WHERE user_id = $2 AND balance >= $1
         RETURNING balance",
    )
    .bind(debit.amount)
    .bind(debit.user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let new_balance: i64 = match updated {
        Some(row) => row.get("balance"),
        None => {
            // Either the wallet is missing or the balance is short
            let current = sqlx::query("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(debit.user_id)
                .fetch_optional(&mut *conn)
                .await?;

            return match current {
                Some(row) => Err(WalletError::InsufficientBalance {
                    user_id: debit.user_id,
                    available: row.get("balance"),
                    required: debit.amount,
                }),
                None => Err(WalletError::WalletNotFound(debit.user_id)),
            };
        }
    };

    insert_entry(
        conn,
        debit.user_id,
        debit.room_id,
        -debit.amount,
        new_balance,
        EntryDirection::Debit,
        debit.entry_type,
        &debit.idempotency_key,
        debit.description.as_deref(),
    )
    .await?;

    Ok(new_balance)
}

/// Row-locked balance read on an open connection.
pub(crate) async fn locked_balance(conn: &mut PgConnection, user_id: UserId) -> WalletResult<i64> {
    let row = sqlx::query("SELECT balance FROM wallets WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(WalletError::WalletNotFound(user_id))?;

    Ok(row.get("balance"))
}

#[allow(clippy::too_many_arguments)]
async fn insert_entry(
    conn: &mut PgConnection,
    user_id: UserId,
    room_id: Option<RoomId>,
    amount: i64,
    balance_after: i64,
    direction: EntryDirection,
    entry_type: EntryType,
    idempotency_key: &str,
    description: Option<&str>,
) -> WalletResult<i64> {
    let row = sqlx::query(
        r#"
        INSERT INTO wallet_entries (user_id, room_id, amount, balance_after, direction, entry_type, idempotency_key, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(room_id)
    .bind(amount)
    .bind(balance_after)
    .bind(direction.to_string())
    .bind(entry_type.to_string())
    .bind(idempotency_key)
    .bind(description)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.get("id"))
}
