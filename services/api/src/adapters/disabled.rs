//! services/api/src/adapters/disabled.rs
//!
//! Stands in for the generation adapters when no API key is configured, so the
//! local store keeps working and generation requests fail cleanly.

use async_trait::async_trait;
use story_maker_core::{
    generation::{GeneratedImage, GeneratedStory, ImageRequest, StoryRequest},
    ports::{ImageGenerationService, PortError, PortResult, StoryGenerationService},
};

#[derive(Clone, Copy, Debug, Default)]
pub struct GenerationDisabled;

fn not_configured() -> PortError {
    PortError::GenerationFailed("generation is not configured".to_string())
}

#[async_trait]
impl ImageGenerationService for GenerationDisabled {
    async fn generate_image(&self, _request: &ImageRequest) -> PortResult<GeneratedImage> {
        Err(not_configured())
    }
}

#[async_trait]
impl StoryGenerationService for GenerationDisabled {
    async fn generate_story(&self, _request: &StoryRequest) -> PortResult<GeneratedStory> {
        Err(not_configured())
    }
}
