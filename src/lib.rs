//! Workflow Modeler - BPMN diagram repository server
//!
//! Persists BPMN diagrams saved from the browser-based modeler and serves
//! them back by id or as a listing.

pub mod app;
pub mod core;
