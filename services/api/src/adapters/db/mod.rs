//! services/api/src/adapters/db/mod.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ArtifactRepository` port for every artifact kind. It handles all
//! interactions with the local SQLite database using `sqlx`.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;
use story_maker_core::ports::{PortError, PortResult};
use tracing::info;

pub mod gateway;
mod images;
pub mod schema;
mod stories;
mod storybooks;

pub use gateway::DbGateway;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements `ArtifactRepository` for stories, images and storybooks.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter` over an already migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the database at `url` through the [`DbGateway`] and wraps it.
    pub async fn open(url: &str) -> PortResult<Self> {
        let pool = DbGateway::open(url).await?;
        info!(url, "Local database ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every pooled connection. Used on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

//=========================================================================================
// Column Codecs
//=========================================================================================

/// Timestamps are stored as RFC 3339 text with microsecond precision, which also sorts
/// chronologically as plain text.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> PortResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| PortError::Unexpected(format!("Corrupt timestamp '{}': {}", raw, e)))
}

pub(crate) fn decode_id<T: FromStr>(raw: &str) -> PortResult<T> {
    raw.parse()
        .map_err(|_| PortError::Unexpected(format!("Corrupt record id '{}'", raw)))
}

/// Maps a `sqlx` error onto the port's error vocabulary.
pub(crate) fn db_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => PortError::StorageUnavailable(e.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_maker_core::domain::timestamp_now;

    #[test]
    fn timestamps_round_trip_and_sort_as_text() {
        let earlier = timestamp_now();
        let later = earlier + chrono::Duration::microseconds(1);
        assert_eq!(decode_timestamp(&encode_timestamp(&earlier)).unwrap(), earlier);
        assert!(encode_timestamp(&earlier) < encode_timestamp(&later));
    }

    #[test]
    fn corrupt_columns_are_unexpected_errors() {
        assert!(matches!(decode_timestamp("yesterday"), Err(PortError::Unexpected(_))));
        assert!(matches!(
            decode_id::<story_maker_core::StoryId>("42"),
            Err(PortError::Unexpected(_))
        ));
    }

    #[test]
    fn pool_failures_mean_storage_is_unavailable() {
        assert!(matches!(db_error(sqlx::Error::PoolClosed), PortError::StorageUnavailable(_)));
        assert!(matches!(db_error(sqlx::Error::RowNotFound), PortError::Unexpected(_)));
    }
}
