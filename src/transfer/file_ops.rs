//! Module `file_ops`
//!
//! Streams an upload into a temporary file inside the store root and moves
//! it into place only once every byte has reached the disk.

use log::{error, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::error::StoreError;
use crate::storage::validation::TEMP_PREFIX;
use crate::transfer::upload::BodyLimitExceeded;
use crate::utils::format_bytes;

const BUFFER_SIZE: usize = 8192;

/// An in-flight upload file.
///
/// Dropping it without a successful [`TempUpload::commit`] closes and removes
/// the file, so every early return in Save cleans up after itself.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl TempUpload {
    /// Creates a fresh temp file in `dir`.
    pub async fn create(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(format!("{TEMP_PREFIX}{}", Uuid::new_v4().simple()));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                error!("Failed to create temporary upload file: {e}");
                match e.kind() {
                    io::ErrorKind::NotFound => {
                        StoreError::NoTempDirectory("upload directory is missing".into())
                    }
                    _ => StoreError::ServerWriteFailure(format!(
                        "cannot create temporary file: {e}"
                    )),
                }
            })?;

        Ok(Self {
            path,
            file: Some(file),
            committed: false,
        })
    }

    /// Copies `reader` into the temp file, enforcing `max_bytes`.
    ///
    /// Returns the number of bytes written. A read failure means the client
    /// went away mid-transfer and maps to `PartialUpload`.
    pub async fn write_from<R>(&mut self, reader: &mut R, max_bytes: u64) -> Result<u64, StoreError>
    where
        R: AsyncRead + Unpin,
    {
        let file = self.file.as_mut().ok_or_else(|| {
            StoreError::ServerWriteFailure("temporary file already closed".into())
        })?;

        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut total_bytes_received = 0u64;

        loop {
            let n = match reader.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if is_body_limit(&e) => {
                    warn!("Upload aborted by the request size limit");
                    return Err(too_large(max_bytes, None));
                }
                Err(e) => {
                    warn!(
                        "Upload stream failed after {total_bytes_received} bytes: {e}"
                    );
                    return Err(StoreError::PartialUpload(format!(
                        "connection interrupted after {}",
                        format_bytes(total_bytes_received)
                    )));
                }
            };

            // Check the size limit before writing (fail fast)
            total_bytes_received += n as u64;
            if total_bytes_received > max_bytes {
                warn!(
                    "Upload exceeds limit: {total_bytes_received} bytes > {max_bytes} bytes"
                );
                return Err(too_large(max_bytes, Some(total_bytes_received)));
            }

            file.write_all(&buffer[..n]).await.map_err(write_failure)?;
        }

        file.flush().await.map_err(write_failure)?;
        file.sync_all().await.map_err(write_failure)?;

        Ok(total_bytes_received)
    }

    /// Closes the temp file and links it at `target` without replacing
    /// anything already there.
    ///
    /// Returns `Ok(false)` when `target` exists; the temp file is kept so the
    /// caller can try another name. Blocking: call it off the async workers.
    pub fn commit(&mut self, target: &Path) -> Result<bool, StoreError> {
        // Close first; some platforms refuse to link or move open files.
        drop(self.file.take());

        match std::fs::hard_link(&self.path, target) {
            Ok(()) => {
                self.committed = true;
                if let Err(e) = std::fs::remove_file(&self.path) {
                    warn!("Failed to remove temporary upload file: {e}");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Unsupported | io::ErrorKind::PermissionDenied
                ) =>
            {
                // No hard links on this file system; a plain rename is the best we can do.
                warn!("Hard link refused ({e}), falling back to rename");
                std::fs::rename(&self.path, target).map_err(move_failure)?;
                self.committed = true;
            }
            Err(e) => return Err(move_failure(e)),
        }

        info!("Committed upload to {}", target.display());
        Ok(true)
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove temporary upload file: {e}");
                }
            }
        }
    }
}

fn is_body_limit(err: &io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.is::<BodyLimitExceeded>())
}

fn too_large(max_bytes: u64, received: Option<u64>) -> StoreError {
    let detail = match received {
        Some(received) => format!(
            "maximum size is {}, received more than {}",
            format_bytes(max_bytes),
            format_bytes(received.saturating_sub(1))
        ),
        None => format!("maximum size is {}", format_bytes(max_bytes)),
    };
    StoreError::TooLarge(detail)
}

fn move_failure(e: io::Error) -> StoreError {
    error!("Failed to move upload into place: {e}");
    StoreError::ServerWriteFailure(format!("cannot move file into place: {e}"))
}

fn write_failure(e: io::Error) -> StoreError {
    error!("Failed to write upload to disk: {e}");
    StoreError::ServerWriteFailure(format!("cannot write to disk: {e}"))
}
