//! crates/story_maker_core/src/offline.rs
//!
//! A repository for when the local database cannot be opened at all.

use crate::domain::Artifact;
use crate::ports::{ArtifactRepository, PortError, PortResult};
use async_trait::async_trait;

/// Fails every operation with `StorageUnavailable`.
#[derive(Debug, Clone)]
pub struct OfflineRepository {
    reason: String,
}

impl OfflineRepository {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> PortError {
        PortError::StorageUnavailable(self.reason.clone())
    }
}

#[async_trait]
impl<A: Artifact> ArtifactRepository<A> for OfflineRepository {
    async fn get_all(&self) -> PortResult<Vec<A>> {
        Err(self.unavailable())
    }

    async fn get_one(&self, _id: A::Id) -> PortResult<Option<A>> {
        Err(self.unavailable())
    }

    async fn add(&self, _draft: A::Draft) -> PortResult<A> {
        Err(self.unavailable())
    }

    async fn update(&self, _record: A) -> PortResult<A> {
        Err(self.unavailable())
    }

    async fn delete(&self, _id: A::Id) -> PortResult<()> {
        Err(self.unavailable())
    }

    async fn clear_all(&self) -> PortResult<()> {
        Err(self.unavailable())
    }
}
