//! Upload request description
//!
//! The transport hands the store a file name, an optional declared size and
//! a status code describing how the upload went on its side. Only an `Ok`
//! status lets Save touch the disk.

use std::fmt;

use crate::config::UploadPolicy;
use crate::error::StoreError;
use crate::utils::format_bytes;

/// Transport-reported upload outcome.
///
/// Numeric codes follow the conventional form-upload error numbering
/// (5 is unassigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Ok,
    ExceedsServerLimit,
    ExceedsFormLimit,
    PartiallyReceived,
    NoFileSelected,
    NoTempDirectory,
    CannotWriteTempFile,
    StoppedByExtension,
    Unknown(u16),
}

impl UploadStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => UploadStatus::Ok,
            1 => UploadStatus::ExceedsServerLimit,
            2 => UploadStatus::ExceedsFormLimit,
            3 => UploadStatus::PartiallyReceived,
            4 => UploadStatus::NoFileSelected,
            6 => UploadStatus::NoTempDirectory,
            7 => UploadStatus::CannotWriteTempFile,
            8 => UploadStatus::StoppedByExtension,
            other => UploadStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            UploadStatus::Ok => 0,
            UploadStatus::ExceedsServerLimit => 1,
            UploadStatus::ExceedsFormLimit => 2,
            UploadStatus::PartiallyReceived => 3,
            UploadStatus::NoFileSelected => 4,
            UploadStatus::NoTempDirectory => 6,
            UploadStatus::CannotWriteTempFile => 7,
            UploadStatus::StoppedByExtension => 8,
            UploadStatus::Unknown(code) => *code,
        }
    }

    /// Turns a non-`Ok` status into the matching store error.
    pub fn classify(self, policy: &UploadPolicy) -> Result<(), StoreError> {
        match self {
            UploadStatus::Ok => Ok(()),
            UploadStatus::ExceedsServerLimit => Err(StoreError::TooLarge(format!(
                "request exceeds the server limit of {}",
                format_bytes(policy.max_request_bytes)
            ))),
            UploadStatus::ExceedsFormLimit => Err(StoreError::TooLarge(
                "file exceeds the maximum size declared by the form".into(),
            )),
            UploadStatus::PartiallyReceived => Err(StoreError::PartialUpload(
                "connection interrupted".into(),
            )),
            UploadStatus::NoFileSelected => Err(StoreError::NoFileProvided),
            UploadStatus::NoTempDirectory => Err(StoreError::NoTempDirectory(
                "temporary directory not found".into(),
            )),
            UploadStatus::CannotWriteTempFile => Err(StoreError::ServerWriteFailure(
                "cannot write temporary file to disk".into(),
            )),
            UploadStatus::StoppedByExtension => Err(StoreError::Unknown(
                "upload stopped by a server extension".into(),
            )),
            UploadStatus::Unknown(code) => {
                Err(StoreError::Unknown(format!("upload status code {code}")))
            }
        }
    }
}

/// Everything Save needs to know about an upload besides its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Untrusted client-supplied file name
    pub file_name: String,
    pub declared_size: Option<u64>,
    pub status: UploadStatus,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, declared_size: Option<u64>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_size,
            status: UploadStatus::Ok,
        }
    }

    /// A request the transport already failed, e.g. no file field at all.
    pub fn failed(status: UploadStatus) -> Self {
        Self {
            file_name: String::new(),
            declared_size: None,
            status,
        }
    }
}

/// Marker carried inside an `io::Error` when the transport aborted the body
/// because it crossed the request size limit.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimitExceeded;

impl fmt::Display for BodyLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request body limit exceeded")
    }
}

impl std::error::Error for BodyLimitExceeded {}
