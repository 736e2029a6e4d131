//! services/api/src/web/images.rs
//!
//! REST handlers for the image gallery.

use crate::web::{
    protocol::{ConfirmParams, ImagePayload, ImageResponse},
    rest::{port_error_response, require_confirmation, HandlerError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use story_maker_core::domain::ImageId;
use uuid::Uuid;

/// List every saved image, newest first.
#[utoipa::path(
    get,
    path = "/images",
    responses((status = 200, description = "All images", body = Vec<ImageResponse>))
)]
pub async fn list_images_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<ImageResponse>> {
    Json(app_state.images.items().into_iter().map(ImageResponse::from).collect())
}

/// Save an image to the gallery.
#[utoipa::path(
    post,
    path = "/images",
    request_body = ImagePayload,
    responses(
        (status = 201, description = "Image saved", body = ImageResponse),
        (status = 400, description = "The image data is missing")
    )
)]
pub async fn create_image_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ImagePayload>,
) -> Result<impl IntoResponse, HandlerError> {
    let image = app_state
        .images
        .add(payload.into())
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(ImageResponse::from(image))))
}

/// Fetch one image.
#[utoipa::path(
    get,
    path = "/images/{id}",
    params(("id" = Uuid, Path, description = "Image id")),
    responses(
        (status = 200, description = "The image", body = ImageResponse),
        (status = 404, description = "No such image")
    )
)]
pub async fn get_image_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ImageResponse>, HandlerError> {
    app_state
        .images
        .get_one(ImageId::from_uuid(id))
        .await
        .map_err(port_error_response)?
        .map(|image| Json(image.into()))
        .ok_or_else(|| (StatusCode::NOT_FOUND, "We couldn't find that picture.".to_string()))
}

/// Replace an image and its prompt.
#[utoipa::path(
    put,
    path = "/images/{id}",
    params(("id" = Uuid, Path, description = "Image id")),
    request_body = ImagePayload,
    responses(
        (status = 200, description = "Image updated", body = ImageResponse),
        (status = 404, description = "No such image")
    )
)]
pub async fn update_image_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ImagePayload>,
) -> Result<Json<ImageResponse>, HandlerError> {
    let image = app_state
        .images
        .modify(ImageId::from_uuid(id), |image| {
            image.image = payload.image;
            image.prompt = payload.prompt;
            Ok(())
        })
        .await
        .map_err(port_error_response)?;
    Ok(Json(image.into()))
}

/// Delete one image. Requires `?confirm=true`.
#[utoipa::path(
    delete,
    path = "/images/{id}",
    params(("id" = Uuid, Path, description = "Image id"), ConfirmParams),
    responses(
        (status = 204, description = "Image deleted (or already gone)"),
        (status = 400, description = "Deletion was not confirmed")
    )
)]
pub async fn delete_image_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, HandlerError> {
    require_confirmation(&params)?;
    app_state
        .images
        .delete(ImageId::from_uuid(id))
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the whole gallery. Requires `?confirm=true`.
#[utoipa::path(
    delete,
    path = "/images",
    params(ConfirmParams),
    responses(
        (status = 204, description = "All images deleted"),
        (status = 400, description = "Deletion was not confirmed")
    )
)]
pub async fn clear_images_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, HandlerError> {
    require_confirmation(&params)?;
    app_state
        .images
        .clear_all()
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
