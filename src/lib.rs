//! Safe File Store
//!
//! Accepts uploaded files into one flat directory under traversal-safe,
//! collision-free names, and lists, downloads, renames and deletes them.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use config::{ServerConfig, UploadPolicy};
pub use error::StoreError;
pub use server::Server;
pub use storage::StoredFile;
