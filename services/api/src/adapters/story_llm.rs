//! services/api/src/adapters/story_llm.rs
//!
//! This module contains the adapter for the story-writing LLM.
//! It implements the `StoryGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use story_maker_core::{
    generation::{GeneratedStory, StoryRequest},
    ports::{PortError, PortResult, StoryGenerationService},
};
use tracing::{debug, error};

const SYSTEM_INSTRUCTIONS: &str = "You are a warm, imaginative storyteller writing for \
    children and their grandparents. Write stories that are gentle, hopeful and easy to \
    read aloud. Use simple words and short sentences. Never include violence, frightening \
    scenes or anything unsuitable for young children. Start your response with a single \
    line of the form 'Title: <title>' and then the story. Separate paragraphs with a \
    blank line.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StoryGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiStoryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiStoryAdapter {
    /// Creates a new `OpenAiStoryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn user_prompt(request: &StoryRequest) -> String {
        let mut prompt = format!("Write a short story about: {}", request.prompt.trim());
        if let Some(genre) = request.genre.as_deref().filter(|g| !g.trim().is_empty()) {
            prompt.push_str(&format!("\nGenre: {}", genre.trim()));
        }
        if let Some(paragraphs) = request.paragraphs {
            prompt.push_str(&format!(
                "\nWrite exactly {} paragraphs; each one will become a page of a picture book.",
                paragraphs
            ));
        }
        prompt
    }
}

//=========================================================================================
// `StoryGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoryGenerationService for OpenAiStoryAdapter {
    async fn generate_story(&self, request: &StoryRequest) -> PortResult<GeneratedStory> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::GenerationFailed(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::user_prompt(request))
                .build()
                .map_err(|e| PortError::GenerationFailed(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::GenerationFailed(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                error!("Story generation request failed: {}", e);
                PortError::GenerationFailed(e.to_string())
            })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::GenerationFailed("Story LLM returned no text content.".to_string())
            })?;

        debug!(chars = content.len(), "Story generated");
        GeneratedStory::parse(&content)
    }
}
