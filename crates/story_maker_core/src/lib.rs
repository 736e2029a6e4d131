pub mod cache;
pub mod domain;
pub mod export;
pub mod fallback;
pub mod generation;
pub mod offline;
pub mod ports;

#[cfg(test)]
mod testing;

pub use cache::{ArtifactCache, CacheState};
pub use domain::{
    Artifact, ImageDraft, ImageId, SavedImage, Story, StoryDraft, StoryId, StoryPage, Storybook,
    StorybookDraft, StorybookId,
};
pub use fallback::SafeStorage;
pub use offline::OfflineRepository;
pub use ports::{
    ArtifactRepository, ExportService, ImageGenerationService, KeyValueStore, KvError, PortError,
    PortResult, StoryGenerationService,
};
