//! Funds ledger seam used inside a room transaction.

use super::{errors::WalletResult, models::Debit};
use crate::room::UserId;
use async_trait::async_trait;

/// Balance reads and debits that take part in the caller's unit of work.
#[async_trait]
pub trait FundsLedger: Send {
    /// Current balance, locked until the surrounding transaction ends.
    async fn balance(&mut self, user_id: UserId) -> WalletResult<i64>;

    /// Debit in one compare-and-set step. Fails with
    /// `WalletError::InsufficientBalance` instead of going negative.
    ///
    /// # Returns
    ///
    /// * `WalletResult<i64>` - Balance after the debit
    async fn debit(&mut self, debit: &Debit) -> WalletResult<i64>;
}
