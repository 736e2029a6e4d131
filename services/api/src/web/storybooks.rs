//! services/api/src/web/storybooks.rs
//!
//! REST handlers for illustrated storybooks and their pages.

use crate::web::{
    protocol::{ConfirmParams, PagePayload, StorybookPayload, StorybookResponse},
    rest::{port_error_response, require_confirmation, HandlerError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use story_maker_core::domain::{StoryPage, StorybookId};
use tracing::info;
use uuid::Uuid;

/// List every storybook, newest first.
#[utoipa::path(
    get,
    path = "/storybooks",
    responses((status = 200, description = "All storybooks", body = Vec<StorybookResponse>))
)]
pub async fn list_storybooks_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<StorybookResponse>> {
    Json(
        app_state
            .storybooks
            .items()
            .into_iter()
            .map(StorybookResponse::from)
            .collect(),
    )
}

/// Save a storybook built by the client.
#[utoipa::path(
    post,
    path = "/storybooks",
    request_body = StorybookPayload,
    responses(
        (status = 201, description = "Storybook saved", body = StorybookResponse),
        (status = 400, description = "The storybook has no pages")
    )
)]
pub async fn create_storybook_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<StorybookPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    let book = app_state
        .storybooks
        .add(payload.into())
        .await
        .map_err(port_error_response)?;
    info!(id = %book.id, pages = book.page_count(), "Storybook created");
    Ok((StatusCode::CREATED, Json(StorybookResponse::from(book))))
}

#[utoipa::path(
    get,
    path = "/storybooks/{id}",
    params(("id" = Uuid, Path, description = "Storybook id")),
    responses(
        (status = 200, description = "The storybook", body = StorybookResponse),
        (status = 404, description = "No such storybook")
    )
)]
pub async fn get_storybook_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StorybookResponse>, HandlerError> {
    app_state
        .storybooks
        .get_one(StorybookId::from_uuid(id))
        .await
        .map_err(port_error_response)?
        .map(|book| Json(book.into()))
        .ok_or_else(|| (StatusCode::NOT_FOUND, "We couldn't find that storybook.".to_string()))
}

/// Replace the whole storybook, pages included.
#[utoipa::path(
    put,
    path = "/storybooks/{id}",
    params(("id" = Uuid, Path, description = "Storybook id")),
    request_body = StorybookPayload,
    responses(
        (status = 200, description = "Storybook updated", body = StorybookResponse),
        (status = 400, description = "The storybook has no pages"),
        (status = 404, description = "No such storybook")
    )
)]
pub async fn update_storybook_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StorybookPayload>,
) -> Result<Json<StorybookResponse>, HandlerError> {
    let book = app_state
        .storybooks
        .modify(StorybookId::from_uuid(id), |book| {
            book.title = payload.title;
            book.prompt = payload.prompt;
            book.style = payload.style;
            book.cover_image_url = payload.cover_image_url;
            book.pages = payload.pages.into_iter().map(StoryPage::from).collect();
            Ok(())
        })
        .await
        .map_err(port_error_response)?;
    Ok(Json(book.into()))
}

/// Delete one storybook. Requires `?confirm=true`.
#[utoipa::path(
    delete,
    path = "/storybooks/{id}",
    params(("id" = Uuid, Path, description = "Storybook id"), ConfirmParams),
    responses(
        (status = 204, description = "Storybook deleted (or already gone)"),
        (status = 400, description = "Deletion was not confirmed")
    )
)]
pub async fn delete_storybook_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, HandlerError> {
    require_confirmation(&params)?;
    app_state
        .storybooks
        .delete(StorybookId::from_uuid(id))
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every storybook. Requires `?confirm=true`.
#[utoipa::path(
    delete,
    path = "/storybooks",
    params(ConfirmParams),
    responses(
        (status = 204, description = "All storybooks deleted"),
        (status = 400, description = "Deletion was not confirmed")
    )
)]
pub async fn clear_storybooks_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ConfirmParams>,
) -> Result<StatusCode, HandlerError> {
    require_confirmation(&params)?;
    app_state
        .storybooks
        .clear_all()
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Pages
//=========================================================================================

/// Append a page to the end of a storybook.
#[utoipa::path(
    post,
    path = "/storybooks/{id}/pages",
    params(("id" = Uuid, Path, description = "Storybook id")),
    request_body = PagePayload,
    responses(
        (status = 200, description = "Page added", body = StorybookResponse),
        (status = 404, description = "No such storybook")
    )
)]
pub async fn add_page_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(page): Json<PagePayload>,
) -> Result<Json<StorybookResponse>, HandlerError> {
    let book = app_state
        .storybooks
        .add_page(StorybookId::from_uuid(id), page.into())
        .await
        .map_err(port_error_response)?;
    Ok(Json(book.into()))
}

#[utoipa::path(
    put,
    path = "/storybooks/{id}/pages/{index}",
    params(
        ("id" = Uuid, Path, description = "Storybook id"),
        ("index" = usize, Path, description = "Zero-based page index")
    ),
    request_body = PagePayload,
    responses(
        (status = 200, description = "Page replaced", body = StorybookResponse),
        (status = 400, description = "No page at that index"),
        (status = 404, description = "No such storybook")
    )
)]
pub async fn update_page_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(page): Json<PagePayload>,
) -> Result<Json<StorybookResponse>, HandlerError> {
    let book = app_state
        .storybooks
        .update_page(StorybookId::from_uuid(id), index, page.into())
        .await
        .map_err(port_error_response)?;
    Ok(Json(book.into()))
}

/// Remove one page. A storybook always keeps at least one page.
#[utoipa::path(
    delete,
    path = "/storybooks/{id}/pages/{index}",
    params(
        ("id" = Uuid, Path, description = "Storybook id"),
        ("index" = usize, Path, description = "Zero-based page index"),
        ConfirmParams
    ),
    responses(
        (status = 200, description = "Page removed", body = StorybookResponse),
        (status = 400, description = "Not confirmed, out of range, or the last page"),
        (status = 404, description = "No such storybook")
    )
)]
pub async fn delete_page_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<StorybookResponse>, HandlerError> {
    require_confirmation(&params)?;
    let book = app_state
        .storybooks
        .delete_page(StorybookId::from_uuid(id), index)
        .await
        .map_err(port_error_response)?;
    Ok(Json(book.into()))
}
