//! Resume tailoring service: a structured resume model, the editing engine
//! that drives it (undo/redo, debounced autosave with revision conflicts,
//! dialog orchestration), export formatting, and the HTTP API that stores it.

pub mod client;
pub mod config;
pub mod db;
pub mod editor;
pub mod errors;
pub mod export;
pub mod markdown;
pub mod models;
pub mod resumes;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, ResumeStore};

/// Picks the store from configuration: Postgres when `DATABASE_URL` is set.
pub async fn build_state(config: Config) -> Result<AppState> {
    let store: Arc<dyn ResumeStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::new(create_pool(url).await?)),
        None => {
            info!("DATABASE_URL not set; using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(AppState { store, config })
}

/// The router with the HTTP middleware stack applied.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client's host is fixed
    )
}
