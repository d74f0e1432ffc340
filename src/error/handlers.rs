//! Error handlers
//!
//! Logs store failures and converts them into HTTP status codes and
//! user-facing troubleshooting hints.

use crate::error::types::StoreError;
use axum::http::StatusCode;
use log::{error, warn};

/// Log a store error at a level matching who caused it.
pub fn handle_error(operation: &str, err: &StoreError) {
    if err.is_server_fault() {
        error!("{operation} failed: {err}");
    } else {
        warn!("{operation} rejected ({}): {err}", err.code());
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NoFileProvided
        | StoreError::InvalidName(_)
        | StoreError::UnsafeExtension(_)
        | StoreError::PartialUpload(_) => StatusCode::BAD_REQUEST,
        StoreError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::NameCollision(_) => StatusCode::CONFLICT,
        StoreError::PathEscape => StatusCode::FORBIDDEN,
        StoreError::NoTempDirectory(_)
        | StoreError::ServerWriteFailure(_)
        | StoreError::DeleteFailed(_)
        | StoreError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Hints shown next to an upload failure.
pub fn troubleshooting_hints(err: &StoreError) -> Vec<String> {
    let hints: &[&str] = match err {
        StoreError::PartialUpload(_) => &[
            "Possible causes: server timeout, network problems, proxy body size limit",
        ],
        StoreError::NoTempDirectory(_) => {
            &["Check that the upload directory exists and is writable"]
        }
        StoreError::ServerWriteFailure(_) => &[
            "Check the permissions of the upload directory",
            "Check the free disk space on the server",
        ],
        StoreError::TooLarge(_) => &["Check the configured upload_max_filesize and post_max_size"],
        _ => &[],
    };
    hints.iter().map(|h| h.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(error_to_status(&StoreError::PathEscape), StatusCode::FORBIDDEN);
        assert_eq!(
            error_to_status(&StoreError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_to_status(&StoreError::NameCollision("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_to_status(&StoreError::TooLarge("x".into())),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            error_to_status(&StoreError::DeleteFailed("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_hints_only_for_diagnosable_errors() {
        assert!(!troubleshooting_hints(&StoreError::PartialUpload("eof".into())).is_empty());
        assert!(troubleshooting_hints(&StoreError::NotFound("x".into())).is_empty());
    }
}
