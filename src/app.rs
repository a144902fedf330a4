//! Application assembly: repository setup and the top-level router

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::core::config::Config;
use crate::core::db::{DiagramRepository, DiagramRepositoryError, FsStore, Manifest};
use crate::core::diagrams::{DiagramApiState, diagram_api_router};
use crate::core::health::health_router;

/// Mount point of the diagram API
pub const API_PREFIX: &str = "/api/modeler";

/// Open the diagram repository described by `config`. Blocking.
pub fn open_repository(config: &Config) -> Result<DiagramRepository, DiagramRepositoryError> {
    let store = Arc::new(FsStore::new(&config.diagrams_dir));

    if config.persist_index {
        DiagramRepository::open(store, Manifest::new(&config.diagrams_dir))
    } else {
        tracing::info!("Index persistence disabled, starting with an empty diagram index");
        Ok(DiagramRepository::in_memory(store))
    }
}

/// Build the application router
pub fn app_router(diagram_repo: DiagramRepository) -> Router {
    let diagram_api = diagram_api_router(DiagramApiState { diagram_repo });

    Router::new()
        .merge(health_router())
        .nest(API_PREFIX, diagram_api)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new().br(true).gzip(true))
}
