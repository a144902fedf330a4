//! Repositories over the diagram store
//!
//! Repositories encapsulate data access and give the API layer a small,
//! typed surface to call into.

pub mod diagram;

pub use diagram::{DiagramRepository, DiagramRepositoryError};
