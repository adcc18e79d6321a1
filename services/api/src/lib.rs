//! services/api/src/lib.rs
//!
//! HTTP service for flashcard generation: configuration, outbound adapters
//! and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;

pub use web::build_router;
