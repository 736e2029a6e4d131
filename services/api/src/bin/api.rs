//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, GenerationDisabled, JsonFileStore, OpenAiImageAdapter, OpenAiStoryAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use std::sync::Arc;
use story_maker_core::{
    ImageGenerationService, OfflineRepository, SafeStorage, StoryGenerationService,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Fallback Storage ---
    let fallback = SafeStorage::new(Arc::new(JsonFileStore::new(
        config.fallback_store_path.clone(),
    )));
    let fallback = if fallback.probe() {
        info!(path = %config.fallback_store_path.display(), "Fallback storage available");
        fallback
    } else {
        warn!("Fallback storage is not writable; unsaved work will not be backed up");
        SafeStorage::disabled()
    };

    // --- 3. Generation Adapters ---
    let (image_adapter, story_adapter): (
        Arc<dyn ImageGenerationService>,
        Arc<dyn StoryGenerationService>,
    ) = match config.require_openai_key() {
        Ok(api_key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            (
                Arc::new(OpenAiImageAdapter::new(
                    openai_client.clone(),
                    config.image_model.clone(),
                )),
                Arc::new(OpenAiStoryAdapter::new(
                    openai_client,
                    config.story_model.clone(),
                )),
            )
        }
        Err(e) => {
            warn!("{}; generation requests will fail until it is set", e);
            (Arc::new(GenerationDisabled), Arc::new(GenerationDisabled))
        }
    };

    // --- 4. Open the Local Database ---
    // The server still starts without it; every collection then reports itself degraded.
    info!("Opening local database...");
    let (app_state, db) = match DbAdapter::open(&config.database_url).await {
        Ok(db) => {
            let db = Arc::new(db);
            let state = AppState::new(
                config.clone(),
                db.clone(),
                fallback,
                image_adapter,
                story_adapter,
            );
            (state, Some(db))
        }
        Err(e) => {
            warn!("Local database unavailable, running without persistence: {}", e);
            let offline = Arc::new(OfflineRepository::new(e.to_string()));
            let state = AppState::new(
                config.clone(),
                offline,
                fallback,
                image_adapter,
                story_adapter,
            );
            (state, None)
        }
    };
    let app_state = Arc::new(app_state);

    let shutdown = CancellationToken::new();
    let loads = app_state.spawn_loads(&shutdown);

    // --- 5. Create the Web Router & Serve ---
    let app = build_router(app_state)?;
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for the shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
            token.cancel();
        })
        .await?;

    // --- 6. Tear Down ---
    shutdown.cancel();
    for load in loads {
        if let Err(e) = load.await {
            warn!("A cache load task did not finish cleanly: {}", e);
        }
    }
    if let Some(db) = db {
        db.close().await;
    }
    info!("Server stopped");
    Ok(())
}
