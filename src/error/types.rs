//! Error types
//!
//! Defines the error taxonomy shared by every Safe File Store operation.

use std::fmt;

/// Errors produced by store operations and upload classification.
///
/// String payloads carry diagnostic detail (limits, observed sizes, OS
/// errors). `PathEscape` deliberately carries nothing so a rejected
/// traversal never reveals where it would have landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NoFileProvided,
    TooLarge(String),
    UnsafeExtension(String),
    PartialUpload(String),
    NoTempDirectory(String),
    ServerWriteFailure(String),
    NotFound(String),
    NameCollision(String),
    InvalidName(String),
    PathEscape,
    DeleteFailed(String),
    Unknown(String),
}

impl StoreError {
    /// Stable machine-readable name of the variant.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NoFileProvided => "NoFileProvided",
            StoreError::TooLarge(_) => "TooLarge",
            StoreError::UnsafeExtension(_) => "UnsafeExtension",
            StoreError::PartialUpload(_) => "PartialUpload",
            StoreError::NoTempDirectory(_) => "NoTempDirectory",
            StoreError::ServerWriteFailure(_) => "ServerWriteFailure",
            StoreError::NotFound(_) => "NotFound",
            StoreError::NameCollision(_) => "NameCollision",
            StoreError::InvalidName(_) => "InvalidName",
            StoreError::PathEscape => "PathEscape",
            StoreError::DeleteFailed(_) => "DeleteFailed",
            StoreError::Unknown(_) => "Unknown",
        }
    }

    /// True when the failure originates on the server rather than in the request.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            StoreError::NoTempDirectory(_)
                | StoreError::ServerWriteFailure(_)
                | StoreError::DeleteFailed(_)
                | StoreError::Unknown(_)
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoFileProvided => write!(f, "No file was selected"),
            StoreError::TooLarge(detail) => write!(f, "File is too large: {}", detail),
            StoreError::UnsafeExtension(ext) => {
                write!(f, "File type not allowed for security reasons: .{}", ext)
            }
            StoreError::PartialUpload(detail) => {
                write!(f, "File was only partially uploaded: {}", detail)
            }
            StoreError::NoTempDirectory(detail) => {
                write!(f, "Temporary upload location unavailable: {}", detail)
            }
            StoreError::ServerWriteFailure(detail) => {
                write!(f, "Server could not write the file: {}", detail)
            }
            StoreError::NotFound(name) => write!(f, "File not found: {}", name),
            StoreError::NameCollision(name) => write!(f, "A file named {} already exists", name),
            StoreError::InvalidName(detail) => write!(f, "Invalid file name: {}", detail),
            StoreError::PathEscape => write!(f, "Access denied"),
            StoreError::DeleteFailed(detail) => write!(f, "Could not delete file: {}", detail),
            StoreError::Unknown(detail) => write!(f, "Unknown upload error: {}", detail),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_escape_message_has_no_path() {
        let message = StoreError::PathEscape.to_string();
        assert_eq!(message, "Access denied");
        assert!(!message.contains('/'));
    }

    #[test]
    fn test_codes_match_variant_names() {
        assert_eq!(StoreError::NoFileProvided.code(), "NoFileProvided");
        assert_eq!(StoreError::NotFound("a".into()).code(), "NotFound");
        assert_eq!(StoreError::NameCollision("a".into()).code(), "NameCollision");
        assert_eq!(StoreError::PathEscape.code(), "PathEscape");
    }

    #[test]
    fn test_server_fault_split() {
        assert!(StoreError::DeleteFailed("busy".into()).is_server_fault());
        assert!(StoreError::NoTempDirectory("gone".into()).is_server_fault());
        assert!(!StoreError::UnsafeExtension("php".into()).is_server_fault());
        assert!(!StoreError::PathEscape.is_server_fault());
    }
}
