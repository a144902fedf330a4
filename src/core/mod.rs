//! Core domain: diagram persistence and its HTTP surface

pub mod config;
pub mod db;
pub mod diagrams;
pub mod health;
