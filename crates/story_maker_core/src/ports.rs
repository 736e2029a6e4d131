//! crates/story_maker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage engines or generation APIs.

use crate::domain::Artifact;
use crate::export::ExportDocument;
use crate::generation::{GeneratedImage, GeneratedStory, ImageRequest, StoryRequest};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// The local database could not be opened or reached.
    #[error("Local storage is unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The request would violate a record invariant.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// An external generation capability failed. Never retried by the core.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// A plain-language message suitable for showing to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            PortError::StorageUnavailable(_) => {
                "Your work can't be saved on this device right now. \
                 Keep this page open and try again later."
                    .to_string()
            }
            PortError::NotFound(_) => {
                "We couldn't find that item. It may have been deleted.".to_string()
            }
            PortError::InvalidInput(reason) => reason.clone(),
            PortError::GenerationFailed(_) => {
                "Oops! The magic paintbrush needs a rest. Please try again.".to_string()
            }
            PortError::Unexpected(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Typed CRUD for one kind of artifact.
///
/// Every operation is atomic for a single record. There are no cross-kind
/// transactions.
#[async_trait]
pub trait ArtifactRepository<A: Artifact>: Send + Sync {
    /// Every record of the kind, newest first.
    async fn get_all(&self) -> PortResult<Vec<A>>;

    /// Returns `Ok(None)` for an unknown id.
    async fn get_one(&self, id: A::Id) -> PortResult<Option<A>>;

    /// Stores a new record. Identity and timestamps are assigned here.
    async fn add(&self, draft: A::Draft) -> PortResult<A>;

    /// Replaces the stored record with the same id and returns what was persisted.
    /// Fails with `NotFound` when no such record exists.
    async fn update(&self, record: A) -> PortResult<A>;

    /// Removes a record. Removing an unknown id succeeds.
    async fn delete(&self, id: A::Id) -> PortResult<()>;

    async fn clear_all(&self) -> PortResult<()>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Produces an illustration for a text prompt.
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<GeneratedImage>;
}

#[async_trait]
pub trait StoryGenerationService: Send + Sync {
    /// Writes a story for a text prompt.
    async fn generate_story(&self, request: &StoryRequest) -> PortResult<GeneratedStory>;
}

#[async_trait]
pub trait ExportService: Send + Sync {
    /// Renders a document (e.g. a PDF) and hands it to the user.
    async fn export(&self, document: &ExportDocument) -> PortResult<()>;
}

/// A flat string key-value store, such as a browser's local storage or a file.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
    fn remove(&self, key: &str) -> Result<(), KvError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("Key-value store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Key-value store is corrupt: {0}")]
    Corrupt(String),
    #[error("Key-value store is unavailable: {0}")]
    Unavailable(String),
}
