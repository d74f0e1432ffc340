//! Server core functionality
//!
//! The axum router, its shared state and the HTTP entry points for upload,
//! download and management.

pub mod core;
pub mod routes;

pub use self::core::{AppState, Server, build_router};
