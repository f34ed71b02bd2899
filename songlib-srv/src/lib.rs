//! songlib-srv library - song library HTTP service
//!
//! Stores songs with lyrics, release date and link, serves filtered
//! listings and paginated verses, and can enrich new songs from an
//! external metadata service.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;
pub mod verses;

use services::{MetadataSource, SongWriter};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Enrichment source, `None` disables enrichment
    pub metadata: Option<Arc<dyn MetadataSource>>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, metadata: Option<Arc<dyn MetadataSource>>) -> Self {
        Self { db, metadata }
    }

    /// Song writer over this state's pool and metadata source
    pub fn writer(&self) -> SongWriter {
        SongWriter::new(self.db.clone(), self.metadata.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::song_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
