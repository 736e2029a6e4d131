//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, the mapping from port errors
//! to HTTP responses, and the small handlers that do not belong to one artifact kind.

use crate::web::{
    generate, images,
    protocol::{
        CollectionStatus, ConfirmParams, GenerateImagePayload, GenerateStoryPayload,
        GenerateStorybookPayload, GeneratedImageResponse, GeneratedStoryResponse,
        GeneratedStorybookResponse, ImagePayload, ImageResponse, PagePayload, StatusResponse,
        StoryPayload, StoryResponse, StorybookPayload, StorybookResponse,
    },
    state::AppState,
    stories, storybooks,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use story_maker_core::ports::PortError;
use tracing::{error, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        status_handler,
        get_backup_handler,
        discard_backup_handler,
        stories::list_stories_handler,
        stories::create_story_handler,
        stories::get_story_handler,
        stories::update_story_handler,
        stories::delete_story_handler,
        stories::clear_stories_handler,
        images::list_images_handler,
        images::create_image_handler,
        images::get_image_handler,
        images::update_image_handler,
        images::delete_image_handler,
        images::clear_images_handler,
        storybooks::list_storybooks_handler,
        storybooks::create_storybook_handler,
        storybooks::get_storybook_handler,
        storybooks::update_storybook_handler,
        storybooks::delete_storybook_handler,
        storybooks::clear_storybooks_handler,
        storybooks::add_page_handler,
        storybooks::update_page_handler,
        storybooks::delete_page_handler,
        generate::generate_image_handler,
        generate::generate_story_handler,
        generate::generate_storybook_handler,
    ),
    components(
        schemas(
            StatusResponse, CollectionStatus,
            StoryPayload, StoryResponse,
            ImagePayload, ImageResponse,
            StorybookPayload, StorybookResponse, PagePayload,
            GenerateImagePayload, GeneratedImageResponse,
            GenerateStoryPayload, GeneratedStoryResponse,
            GenerateStorybookPayload, GeneratedStorybookResponse,
        )
    ),
    tags(
        (name = "Story Maker API", description = "Local stories, pictures and storybooks.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// The error half of every handler's result.
pub type HandlerError = (StatusCode, String);

/// Turns a port error into a status code and a plain-language message.
pub fn port_error_response(e: PortError) -> HandlerError {
    let status = match &e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PortError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PortError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {:?}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (status, e.user_message())
}

/// Rejects a destructive request that the user has not confirmed.
pub fn require_confirmation(params: &ConfirmParams) -> Result<(), HandlerError> {
    if params.confirm {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            "Please confirm the deletion by adding ?confirm=true".to_string(),
        ))
    }
}

//=========================================================================================
// Status and Backups
//=========================================================================================

/// Report whether each collection has loaded and whether changes can be saved.
#[utoipa::path(
    get,
    path = "/status",
    responses((status = 200, description = "Storage status", body = StatusResponse))
)]
pub async fn status_handler(State(app_state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(app_state.status())
}

/// Fetch the last unsaved draft or record of a kind, if a failed save left one behind.
#[utoipa::path(
    get,
    path = "/backups/{kind}",
    params(("kind" = String, Path, description = "One of `stories`, `images` or `storybooks`.")),
    responses(
        (status = 200, description = "The backed-up work"),
        (status = 404, description = "Nothing was backed up")
    )
)]
pub async fn get_backup_handler(
    State(app_state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let backup: Option<serde_json::Value> = match kind.as_str() {
        "stories" => app_state.stories.recover_backup(),
        "images" => app_state.images.recover_backup(),
        "storybooks" => app_state.storybooks.recover_backup(),
        _ => return Err((StatusCode::NOT_FOUND, format!("Unknown collection '{}'", kind))),
    };
    backup
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No unsaved work was found.".to_string()))
}

/// Throw away the backed-up work of a kind.
#[utoipa::path(
    delete,
    path = "/backups/{kind}",
    params(
        ("kind" = String, Path, description = "One of `stories`, `images` or `storybooks`."),
        ConfirmParams
    ),
    responses((status = 204, description = "Backup discarded"))
)]
pub async fn discard_backup_handler(
    State(app_state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, HandlerError> {
    require_confirmation(&params)?;
    match kind.as_str() {
        "stories" => app_state.stories.discard_backup(),
        "images" => app_state.images.discard_backup(),
        "storybooks" => app_state.storybooks.discard_backup(),
        _ => return Err((StatusCode::NOT_FOUND, format!("Unknown collection '{}'", kind))),
    }
    Ok(StatusCode::NO_CONTENT)
}
