//! HTTP API server for stash.
//!
//! This crate provides the HTTP surface over the chunked cache:
//! - Multipart file upload with disk staging and size gating
//! - File download with reassembly and integrity verification
//! - Health and metrics endpoints

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
