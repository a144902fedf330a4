//! Diagram API endpoints
//!
//! Provides REST API endpoints for diagram management, relative to the
//! mount point chosen by the caller:
//! - POST /diagrams - Save a new diagram
//! - GET /diagrams - List saved diagrams, newest first
//! - GET /diagrams/:id - Get a diagram's BPMN XML

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::db::{CreateDiagram, DiagramRecord, DiagramRepository, DiagramRepositoryError};

/// Content type of diagram payload responses
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Diagram API state containing the diagram repository
#[derive(Clone)]
pub struct DiagramApiState {
    pub diagram_repo: DiagramRepository,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Diagram API error types
#[derive(Debug, thiserror::Error)]
pub enum DiagramApiError {
    #[error("Diagram not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Failed to save diagram")]
    StorageWrite,

    #[error("Failed to retrieve diagram")]
    StorageRead,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<DiagramRepositoryError> for DiagramApiError {
    fn from(err: DiagramRepositoryError) -> Self {
        match err {
            DiagramRepositoryError::Validation(message) => DiagramApiError::BadRequest(message),
            DiagramRepositoryError::NotFound => DiagramApiError::NotFound,
            DiagramRepositoryError::StoreWrite(_) | DiagramRepositoryError::Manifest(_) => {
                DiagramApiError::StorageWrite
            }
            DiagramRepositoryError::StoreRead(_) => DiagramApiError::StorageRead,
            DiagramRepositoryError::Task(err) => DiagramApiError::InternalError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for DiagramApiError {
    fn from(rejection: JsonRejection) -> Self {
        DiagramApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for DiagramApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            DiagramApiError::NotFound => (StatusCode::NOT_FOUND, "DIAGRAM_NOT_FOUND"),
            DiagramApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            DiagramApiError::StorageWrite => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_WRITE_FAILED")
            }
            DiagramApiError::StorageRead => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_READ_FAILED")
            }
            DiagramApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ApiError::new(self.to_string(), code);

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request for saving a new diagram
#[derive(Debug, Deserialize)]
pub struct CreateDiagramRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub xml: Option<String>,
}

impl From<CreateDiagramRequest> for CreateDiagram {
    fn from(request: CreateDiagramRequest) -> Self {
        Self {
            name: request.name,
            xml: request.xml,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the diagram API router
pub fn diagram_api_router(state: DiagramApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/diagrams",
            get(list_diagrams_handler).post(create_diagram_handler),
        )
        .route("/diagrams/{id}", get(get_diagram_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /diagrams
async fn create_diagram_handler(
    State(state): State<Arc<DiagramApiState>>,
    payload: Result<Json<CreateDiagramRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DiagramRecord>), DiagramApiError> {
    let Json(request) = payload?;

    tracing::debug!("Saving diagram {:?}", request.name);

    let record = state.diagram_repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /diagrams
async fn list_diagrams_handler(
    State(state): State<Arc<DiagramApiState>>,
) -> Json<Vec<DiagramRecord>> {
    Json(state.diagram_repo.list().await)
}

/// GET /diagrams/:id
/// Responds with the stored XML exactly as it was saved
async fn get_diagram_handler(
    State(state): State<Arc<DiagramApiState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DiagramApiError> {
    tracing::debug!("Getting diagram {}", id);

    let xml = state.diagram_repo.get(&id).await?;

    Ok(([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], xml))
}

// ============================================================================
// Tests
// ============================================================================
