//! Transfer module
//!
//! Describes incoming uploads and moves their bytes onto disk safely.

pub mod file_ops;
pub mod upload;

pub use file_ops::TempUpload;
pub use upload::{BodyLimitExceeded, UploadRequest, UploadStatus};
