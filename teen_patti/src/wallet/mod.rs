//! Wallet module: balances shared with the rest of the platform.
//!
//! This module implements:
//! - Atomic compare-and-set debits that never drive a balance negative
//! - Ledger entries with idempotency keys for every balance change
//! - The `FundsLedger` seam the pot collector debits through
//!
//! ## Example
//!
//! ```no_run
//! use teen_patti::wallet::WalletManager;
//! use teen_patti::db::{Database, DatabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::default()).await?;
//!     let wallet = WalletManager::new(Arc::new(db.pool().clone()));
//!
//!     let balance = wallet.get_balance(1).await?;
//!     println!("Balance: {}", balance);
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ledger;
pub mod manager;
pub mod models;

pub use errors::{WalletError, WalletResult};
pub use ledger::FundsLedger;
pub use manager::WalletManager;
pub use models::{Debit, EntryDirection, EntryType, Wallet, WalletEntry};
