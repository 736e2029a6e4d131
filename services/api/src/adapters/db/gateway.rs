//! services/api/src/adapters/db/gateway.rs
//!
//! Opens the local SQLite database and brings its schema up to date.

use super::schema::{MIGRATIONS, SCHEMA_VERSION};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use story_maker_core::ports::{PortError, PortResult};
use tracing::{info, warn};

pub struct DbGateway;

impl DbGateway {
    /// Opens (creating if absent) the database at `url` and applies pending migrations.
    ///
    /// Any failure is reported as `StorageUnavailable`.
    pub async fn open(url: &str) -> PortResult<SqlitePool> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(unavailable)?
            .create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to an in-memory database is its own database, so keep exactly
        // one and never let it idle out.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(unavailable)?;
        Self::migrate(&pool).await?;
        Ok(pool)
    }

    /// Brings the schema up to [`SCHEMA_VERSION`]; existing tables and rows are untouched.
    pub async fn migrate(pool: &SqlitePool) -> PortResult<()> {
        let current = Self::schema_version(pool).await?;
        if current > SCHEMA_VERSION {
            return Err(PortError::StorageUnavailable(format!(
                "database schema version {} is newer than supported version {}",
                current, SCHEMA_VERSION
            )));
        }

        for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
            info!(version, "Applying database migration");
            let mut tx = pool.begin().await.map_err(unavailable)?;
            // Split by semicolon to run the statements one at a time
            for statement in sql.split(';') {
                if statement.trim().is_empty() {
                    continue;
                }
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(unavailable)?;
            }
            // PRAGMA does not accept bound parameters.
            let bump = format!("PRAGMA user_version = {}", version);
            sqlx::query(&bump)
                .execute(&mut *tx)
                .await
                .map_err(unavailable)?;
            tx.commit().await.map_err(unavailable)?;
        }

        if current < SCHEMA_VERSION {
            info!(from = current, to = SCHEMA_VERSION, "Database schema upgraded");
        }
        Ok(())
    }

    pub async fn schema_version(pool: &SqlitePool) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("PRAGMA user_version")
            .fetch_one(pool)
            .await
            .map_err(unavailable)
    }
}

fn unavailable(e: sqlx::Error) -> PortError {
    warn!(error = %e, "Local database unavailable");
    PortError::StorageUnavailable(e.to_string())
}
