//! HTTP request handlers.

pub mod files;

pub use files::{download, health_check, upload};
