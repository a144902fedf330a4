//! Diagrams module
//!
//! This module provides REST API endpoints for diagram management:
//! - Save a new diagram
//! - List saved diagrams
//! - Fetch a diagram's BPMN XML

pub mod api;

pub use api::{DiagramApiState, diagram_api_router};
