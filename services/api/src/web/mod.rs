pub mod generate;
pub mod images;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod stories;
pub mod storybooks;

use crate::error::ApiError;
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Data-URL images travel inside JSON bodies.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the full application router: REST routes, CORS and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = HeaderValue::from_str(&app_state.config.allowed_origin).map_err(|e| {
        ApiError::Internal(format!(
            "ALLOWED_ORIGIN '{}' is not a valid header value: {}",
            app_state.config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let api_router = Router::new()
        .route("/status", get(rest::status_handler))
        .route(
            "/backups/{kind}",
            get(rest::get_backup_handler).delete(rest::discard_backup_handler),
        )
        .route(
            "/stories",
            get(stories::list_stories_handler)
                .post(stories::create_story_handler)
                .delete(stories::clear_stories_handler),
        )
        .route(
            "/stories/{id}",
            get(stories::get_story_handler)
                .put(stories::update_story_handler)
                .delete(stories::delete_story_handler),
        )
        .route(
            "/images",
            get(images::list_images_handler)
                .post(images::create_image_handler)
                .delete(images::clear_images_handler),
        )
        .route(
            "/images/{id}",
            get(images::get_image_handler)
                .put(images::update_image_handler)
                .delete(images::delete_image_handler),
        )
        .route(
            "/storybooks",
            get(storybooks::list_storybooks_handler)
                .post(storybooks::create_storybook_handler)
                .delete(storybooks::clear_storybooks_handler),
        )
        .route(
            "/storybooks/{id}",
            get(storybooks::get_storybook_handler)
                .put(storybooks::update_storybook_handler)
                .delete(storybooks::delete_storybook_handler),
        )
        .route("/storybooks/{id}/pages", post(storybooks::add_page_handler))
        .route(
            "/storybooks/{id}/pages/{index}",
            put(storybooks::update_page_handler).delete(storybooks::delete_page_handler),
        )
        .route("/generate/image", post(generate::generate_image_handler))
        .route("/generate/story", post(generate::generate_story_handler))
        .route("/generate/storybook", post(generate::generate_storybook_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
