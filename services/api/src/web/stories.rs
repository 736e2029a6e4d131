//! services/api/src/web/stories.rs
//!
//! REST handlers for written stories. Every write goes through the stories cache.

use crate::web::{
    protocol::{ConfirmParams, StoryPayload, StoryResponse},
    rest::{port_error_response, require_confirmation, HandlerError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use story_maker_core::domain::{StoryDraft, StoryId};
use tracing::info;
use uuid::Uuid;

/// List every saved story, newest first.
#[utoipa::path(
    get,
    path = "/stories",
    responses((status = 200, description = "All stories", body = Vec<StoryResponse>))
)]
pub async fn list_stories_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<StoryResponse>> {
    Json(app_state.stories.items().into_iter().map(StoryResponse::from).collect())
}

/// Save a new story.
#[utoipa::path(
    post,
    path = "/stories",
    request_body = StoryPayload,
    responses(
        (status = 201, description = "Story saved", body = StoryResponse),
        (status = 503, description = "Local storage is unavailable")
    )
)]
pub async fn create_story_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<StoryPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    let story = match payload.image {
        Some(image) => {
            app_state
                .stories
                .add_with_image(payload.title, payload.content, image, payload.description)
                .await
        }
        None => {
            app_state
                .stories
                .add(StoryDraft {
                    title: payload.title,
                    content: payload.content,
                    image: None,
                    description: payload.description,
                })
                .await
        }
    }
    .map_err(port_error_response)?;

    info!(id = %story.id, "Story created");
    Ok((StatusCode::CREATED, Json(StoryResponse::from(story))))
}

/// Fetch one story.
#[utoipa::path(
    get,
    path = "/stories/{id}",
    params(("id" = Uuid, Path, description = "Story id")),
    responses(
        (status = 200, description = "The story", body = StoryResponse),
        (status = 404, description = "No such story")
    )
)]
pub async fn get_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoryResponse>, HandlerError> {
    app_state
        .stories
        .get_one(StoryId::from_uuid(id))
        .await
        .map_err(port_error_response)?
        .map(|story| Json(story.into()))
        .ok_or_else(|| (StatusCode::NOT_FOUND, "We couldn't find that story.".to_string()))
}

/// Replace the text, cover and caption of a story.
#[utoipa::path(
    put,
    path = "/stories/{id}",
    params(("id" = Uuid, Path, description = "Story id")),
    request_body = StoryPayload,
    responses(
        (status = 200, description = "Story updated", body = StoryResponse),
        (status = 404, description = "No such story")
    )
)]
pub async fn update_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StoryPayload>,
) -> Result<Json<StoryResponse>, HandlerError> {
    let story = app_state
        .stories
        .modify(StoryId::from_uuid(id), |story| {
            story.title = payload.title;
            story.content = payload.content;
            story.image = payload.image;
            story.description = payload.description;
            Ok(())
        })
        .await
        .map_err(port_error_response)?;
    Ok(Json(story.into()))
}

/// Delete one story. Requires `?confirm=true`.
#[utoipa::path(
    delete,
    path = "/stories/{id}",
    params(("id" = Uuid, Path, description = "Story id"), ConfirmParams),
    responses(
        (status = 204, description = "Story deleted (or already gone)"),
        (status = 400, description = "Deletion was not confirmed")
    )
)]
pub async fn delete_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, HandlerError> {
    require_confirmation(&params)?;
    app_state
        .stories
        .delete(StoryId::from_uuid(id))
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every story. Requires `?confirm=true`. Not reversible.
#[utoipa::path(
    delete,
    path = "/stories",
    params(ConfirmParams),
    responses(
        (status = 204, description = "All stories deleted"),
        (status = 400, description = "Deletion was not confirmed")
    )
)]
pub async fn clear_stories_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, HandlerError> {
    require_confirmation(&params)?;
    app_state
        .stories
        .clear_all()
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
