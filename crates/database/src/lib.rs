//! Tasklane Database Crate
//!
//! Connection management and embedded migrations for the Tasklane SQLite
//! store. Repositories live with the domain crates that own them.

use sqlx::SqlitePool;
use tasklane_config::DatabaseConfig;

pub mod connection;
pub mod error;
pub mod migrations;

pub use connection::prepare_database;
pub use error::{DatabaseError, DatabaseResult};
pub use migrations::{run_migrations, MIGRATOR};

/// Connect to the configured database and bring its schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
