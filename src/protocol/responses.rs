//! Upload response framing
//!
//! Turns the outcome of a Save into the status and JSON body returned to the
//! uploading client, including the diagnostic details list.

use axum::http::StatusCode;

use crate::error::StoreError;
use crate::error::handlers::{error_to_status, handle_error, troubleshooting_hints};
use crate::protocol::commands::UploadResponse;
use crate::storage::StoredFile;
use crate::utils::format_bytes;

/// Format the reply to an upload
pub fn upload_response(outcome: Result<StoredFile, StoreError>) -> (StatusCode, UploadResponse) {
    match outcome {
        Ok(file) => {
            let details = vec![
                format!("Size: {}", format_bytes(file.size)),
                format!("Content type: {}", file.content_type),
            ];
            (
                StatusCode::OK,
                UploadResponse {
                    success: true,
                    message: format!("File uploaded: {}", file.name),
                    file: Some(file),
                    details,
                },
            )
        }
        Err(err) => {
            handle_error("upload", &err);
            (
                error_to_status(&err),
                UploadResponse {
                    success: false,
                    message: err.to_string(),
                    file: None,
                    details: troubleshooting_hints(&err),
                },
            )
        }
    }
}
