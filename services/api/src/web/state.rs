//! services/api/src/web/state.rs
//!
//! Defines the application's shared state, built once at startup and handed to
//! every handler.

use crate::config::Config;
use crate::web::protocol::{CollectionStatus, StatusResponse};
use story_maker_core::{
    domain::Artifact, ArtifactCache, ArtifactRepository, ImageGenerationService, SafeStorage,
    SavedImage, Story, StoryGenerationService, Storybook,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stories: Arc<ArtifactCache<Story>>,
    pub images: Arc<ArtifactCache<SavedImage>>,
    pub storybooks: Arc<ArtifactCache<Storybook>>,
    pub image_adapter: Arc<dyn ImageGenerationService>,
    pub story_adapter: Arc<dyn StoryGenerationService>,
    pub fallback: SafeStorage,
}

impl AppState {
    /// Builds one cache per artifact kind over a repository that serves all three.
    pub fn new<R>(
        config: Arc<Config>,
        repo: Arc<R>,
        fallback: SafeStorage,
        image_adapter: Arc<dyn ImageGenerationService>,
        story_adapter: Arc<dyn StoryGenerationService>,
    ) -> Self
    where
        R: ArtifactRepository<Story>
            + ArtifactRepository<SavedImage>
            + ArtifactRepository<Storybook>
            + 'static,
    {
        let stories: Arc<dyn ArtifactRepository<Story>> = repo.clone();
        let images: Arc<dyn ArtifactRepository<SavedImage>> = repo.clone();
        let storybooks: Arc<dyn ArtifactRepository<Storybook>> = repo;
        Self {
            config,
            stories: Arc::new(ArtifactCache::new(stories).with_backup(fallback.clone())),
            images: Arc::new(ArtifactCache::new(images).with_backup(fallback.clone())),
            storybooks: Arc::new(ArtifactCache::new(storybooks).with_backup(fallback.clone())),
            image_adapter,
            story_adapter,
            fallback,
        }
    }

    /// Starts the initial load of every cache without waiting for it.
    pub fn spawn_loads(&self, token: &CancellationToken) -> Vec<JoinHandle<()>> {
        vec![
            self.stories.spawn_load(token.child_token()),
            self.images.spawn_load(token.child_token()),
            self.storybooks.spawn_load(token.child_token()),
        ]
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            stories: collection_status(&self.stories),
            images: collection_status(&self.images),
            storybooks: collection_status(&self.storybooks),
            fallback_available: self.fallback.is_enabled(),
        }
    }
}

fn collection_status<A: Artifact>(cache: &ArtifactCache<A>) -> CollectionStatus {
    let rx = cache.subscribe();
    let state = rx.borrow();
    CollectionStatus {
        loading: state.loading,
        degraded: state.degraded,
        count: state.items.len(),
    }
}
