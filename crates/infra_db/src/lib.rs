//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the receivables ledger, implemented with SQLx.
//!
//! # Architecture
//!
//! The crate is split into two layers, mirroring the hexagonal layout of the
//! workspace:
//!
//! - `repositories` speak SQL and deal in row types, returning
//!   [`DatabaseError`]
//! - `adapters` implement the domain port traits (currently
//!   [`domain_ledger::LedgerStore`]) on top of the repositories, translating
//!   rows to domain models and database errors to `PortError`
//!
//! Every multi-row ledger mutation runs inside a single transaction with a
//! row lock on the payment, so the status re-checks performed by the
//! notification processor are race-free.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PgLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new(&url)).await?;
//! infra_db::run_migrations(&pool).await?;
//! let store = PgLedgerStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PgLedgerStore;

/// Applies the embedded migrations to the given pool
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
}
