//! Storage for rooms, memberships and wallets.
//!
//! [`RoomStore`] is the seam the engine works against. [`PgRoomStore`] keeps
//! everything in PostgreSQL with row and advisory locks; [`MemoryRoomStore`]
//! serializes units of work behind one mutex for tests and local runs.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use config::DatabaseConfig;
pub use memory::{MemoryRoomStore, MemoryRoomTx};
pub use postgres::{PgRoomStore, PgRoomTx};
pub use repository::{RoomStore, RoomTx};

/// Connection pool plus the bundled schema.
///
/// ```no_run
/// use teen_patti::db::{Database, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), sqlx::Error> {
///     let db = Database::new(&DatabaseConfig::development()).await?;
///     db.migrate().await?;
///     let store = db.room_store();
///     # let _ = store;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Open a pool sized and timed by `config`
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        log::info!(
            "Database pool ready ({}..{} connections)",
            config.min_connections,
            config.max_connections
        );
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Room store sharing this pool
    pub fn room_store(&self) -> PgRoomStore {
        PgRoomStore::new(self.pool.clone())
    }

    /// Create or upgrade the rooms, memberships and wallet tables
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
