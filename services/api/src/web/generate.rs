//! services/api/src/web/generate.rs
//!
//! Handlers that call the generation services and, when asked, keep the result.

use crate::web::{
    protocol::{
        GenerateImagePayload, GenerateStoryPayload, GenerateStorybookPayload,
        GeneratedImageResponse, GeneratedStoryResponse, GeneratedStorybookResponse, PagePayload,
    },
    rest::{port_error_response, HandlerError},
    state::AppState,
};
use axum::{extract::State, response::Json};
use std::sync::Arc;
use story_maker_core::{
    domain::{ImageDraft, StoryDraft},
    generation::{ImageRequest, StoryRequest, StorybookComposer, StorybookRequest},
};
use tracing::info;

/// Generate one illustration.
#[utoipa::path(
    post,
    path = "/generate/image",
    request_body = GenerateImagePayload,
    responses(
        (status = 200, description = "Image generated", body = GeneratedImageResponse),
        (status = 502, description = "The image service failed")
    )
)]
pub async fn generate_image_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GenerateImagePayload>,
) -> Result<Json<GeneratedImageResponse>, HandlerError> {
    let mut request = ImageRequest::new(payload.prompt.as_str());
    if let Some(style) = payload.style {
        request = request.with_style(style);
    }
    let image = app_state
        .image_adapter
        .generate_image(&request)
        .await
        .map_err(port_error_response)?
        .into_url();

    let saved = if payload.save {
        let record = app_state
            .images
            .add(ImageDraft {
                image: image.clone(),
                prompt: payload.prompt,
            })
            .await
            .map_err(port_error_response)?;
        Some(record.into())
    } else {
        None
    };

    Ok(Json(GeneratedImageResponse { image, saved }))
}

/// Write a story from a prompt.
#[utoipa::path(
    post,
    path = "/generate/story",
    request_body = GenerateStoryPayload,
    responses(
        (status = 200, description = "Story written", body = GeneratedStoryResponse),
        (status = 502, description = "The story service failed")
    )
)]
pub async fn generate_story_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GenerateStoryPayload>,
) -> Result<Json<GeneratedStoryResponse>, HandlerError> {
    let request = StoryRequest {
        prompt: payload.prompt.clone(),
        genre: payload.genre,
        paragraphs: None,
    };
    let story = app_state
        .story_adapter
        .generate_story(&request)
        .await
        .map_err(port_error_response)?;
    let title = story.title.unwrap_or(payload.prompt);

    let saved = if payload.save {
        let record = app_state
            .stories
            .add(StoryDraft::new(title.as_str(), story.content.as_str()))
            .await
            .map_err(port_error_response)?;
        Some(record.into())
    } else {
        None
    };

    Ok(Json(GeneratedStoryResponse {
        title,
        content: story.content,
        saved,
    }))
}

/// Write a story, split it into pages and illustrate every page and the cover.
#[utoipa::path(
    post,
    path = "/generate/storybook",
    request_body = GenerateStorybookPayload,
    responses(
        (status = 200, description = "Storybook composed", body = GeneratedStorybookResponse),
        (status = 400, description = "Page count out of range"),
        (status = 502, description = "A generation service failed")
    )
)]
pub async fn generate_storybook_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GenerateStorybookPayload>,
) -> Result<Json<GeneratedStorybookResponse>, HandlerError> {
    let composer = StorybookComposer::new(
        app_state.story_adapter.as_ref(),
        app_state.image_adapter.as_ref(),
    );
    let draft = composer
        .compose(&StorybookRequest {
            prompt: payload.prompt,
            style: payload.style,
            page_count: payload.pages,
        })
        .await
        .map_err(port_error_response)?;
    info!(pages = draft.pages.len(), "Storybook generated");

    let saved = if payload.save {
        let record = app_state
            .storybooks
            .add(draft.clone())
            .await
            .map_err(port_error_response)?;
        Some(record.into())
    } else {
        None
    };

    Ok(Json(GeneratedStorybookResponse {
        title: draft.title,
        cover_image_url: draft.cover_image_url,
        pages: draft.pages.into_iter().map(PagePayload::from).collect(),
        saved,
    }))
}
