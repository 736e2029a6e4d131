//! services/api/src/adapters/image_llm.rs
//!
//! This module contains the adapter for the image generation model.
//! It implements the `ImageGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::images::{CreateImageRequestArgs, Image, ImageModel, ImageSize},
    Client,
};
use async_trait::async_trait;
use story_maker_core::{
    generation::{GeneratedImage, ImageRequest},
    ports::{ImageGenerationService, PortError, PortResult},
};
use tracing::{debug, error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ImageGenerationService` using the OpenAI images API.
#[derive(Clone)]
pub struct OpenAiImageAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiImageAdapter {
    /// Creates a new `OpenAiImageAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn image_model(&self) -> ImageModel {
        match self.model.as_str() {
            "dall-e-2" => ImageModel::DallE2,
            "dall-e-3" => ImageModel::DallE3,
            other => ImageModel::Other(other.to_string()),
        }
    }
}

//=========================================================================================
// `ImageGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageGenerationService for OpenAiImageAdapter {
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<GeneratedImage> {
        let api_request = CreateImageRequestArgs::default()
            .prompt(request.render_prompt())
            .model(self.image_model())
            .n(1)
            .size(ImageSize::S1024x1024)
            .build()
            .map_err(|e| PortError::GenerationFailed(e.to_string()))?;

        let response = self
            .client
            .images()
            .generate(api_request)
            .await
            .map_err(|e: OpenAIError| {
                error!("Image generation request failed: {}", e);
                PortError::GenerationFailed(e.to_string())
            })?;

        let image = response.data.into_iter().next().ok_or_else(|| {
            PortError::GenerationFailed("Image model returned no images.".to_string())
        })?;

        // Models answer with either a hosted URL or inline base64 data.
        let generated = match image.as_ref() {
            Image::Url { url, .. } => GeneratedImage::parse(url.as_str())?,
            Image::B64Json { b64_json, .. } => GeneratedImage::from_base64_png(b64_json.as_str())?,
        };
        debug!(model = %self.model, "Image generated");
        Ok(generated)
    }
}
