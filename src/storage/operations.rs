//! Storage operations
//!
//! Save, list, rename, delete and download resolution over a single flat
//! store root. Nothing is cached: each call re-reads the directory.

use log::{error, info, warn};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;

use crate::config::UploadPolicy;
use crate::error::StoreError;
use crate::storage::filesystem::{ensure_directory, entry_exists, with_retries};
use crate::storage::results::{DownloadTarget, StoredFile};
use crate::storage::validation::{
    TEMP_PREFIX, canonical_root, extension_of, resolve_in_root, sanitize_name, split_name,
    validate_new_name,
};
use crate::transfer::{TempUpload, UploadRequest};
use crate::utils::format_bytes;

/// Upper bound on `_N` suffixes tried for one name.
const MAX_NAME_SUFFIX: u32 = 10_000;

/// Name lookups allowed when a chosen name is claimed before the commit lands.
const MAX_COMMIT_ATTEMPTS: u32 = 16;

/// Stores an uploaded stream under a unique, sanitized name.
///
/// The bytes land in a temp file in `server_root` first and are linked into
/// place only after a complete, size-checked copy.
pub async fn save_upload<R>(
    server_root: &Path,
    policy: &UploadPolicy,
    request: UploadRequest,
    mut reader: R,
) -> Result<StoredFile, StoreError>
where
    R: AsyncRead + Unpin,
{
    request.status.classify(policy)?;

    if request.file_name.is_empty() {
        return Err(StoreError::NoFileProvided);
    }

    let name = sanitize_name(&request.file_name)?;

    if let Some(ext) = extension_of(name) {
        if policy.is_denied(&ext) {
            return Err(StoreError::UnsafeExtension(ext));
        }
    }

    let max_size = policy.max_upload_size();
    if let Some(declared) = request.declared_size {
        if declared > max_size {
            return Err(StoreError::TooLarge(format!(
                "maximum size is {}, file is {}",
                format_bytes(max_size),
                format_bytes(declared)
            )));
        }
    }

    let root = {
        let server_root = server_root.to_path_buf();
        run_blocking(move || prepare_root(&server_root)).await?
    };

    let mut temp = TempUpload::create(&root).await?;
    let received = temp.write_from(&mut reader, max_size).await?;

    if let Some(declared) = request.declared_size {
        if received < declared {
            return Err(StoreError::PartialUpload(format!(
                "received {} of {}",
                format_bytes(received),
                format_bytes(declared)
            )));
        }
    }

    // Pick the final name only now, keeping the check-to-commit window short.
    let name = name.to_string();
    let (final_name, metadata) = run_blocking(move || commit_upload(&root, &name, temp)).await?;

    info!(
        "Stored upload {} as {} ({})",
        request.file_name,
        final_name,
        format_bytes(received)
    );

    Ok(StoredFile::from_metadata(final_name, &metadata))
}

/// Creates the store root if needed and returns its canonical form.
fn prepare_root(server_root: &Path) -> Result<PathBuf, StoreError> {
    ensure_directory(server_root).map_err(|e| {
        error!("Failed to create upload directory: {e}");
        StoreError::ServerWriteFailure("cannot create the upload directory".into())
    })?;
    canonical_root(server_root)
        .map_err(|_| StoreError::NoTempDirectory("upload directory is missing".into()))
}

/// Links the finished temp file under the first free name.
///
/// A name that gets taken between the lookup and the link is skipped, so a
/// concurrent upload is never overwritten.
fn commit_upload(
    root: &Path,
    name: &str,
    mut temp: TempUpload,
) -> Result<(String, Metadata), StoreError> {
    for _ in 0..MAX_COMMIT_ATTEMPTS {
        let final_name = next_available_name(root, name)?;
        let final_path = resolve_in_root(root, &final_name)?;

        if temp.commit(&final_path)? {
            let metadata = fs::metadata(&final_path).map_err(|e| {
                StoreError::ServerWriteFailure(format!("stored file is not readable: {e}"))
            })?;
            return Ok((final_name, metadata));
        }
        warn!("{final_name} was taken while committing, trying the next free name");
    }

    Err(StoreError::ServerWriteFailure(format!(
        "could not claim a free name for {name}"
    )))
}

/// Runs blocking file system work on the blocking thread pool.
async fn run_blocking<T, F>(op: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| StoreError::Unknown(format!("task failed: {e}")))?
}

/// First free name among `name`, `stem_1.ext`, `stem_2.ext`, ...
pub fn next_available_name(root: &Path, name: &str) -> Result<String, StoreError> {
    if !entry_exists(&root.join(name)) {
        return Ok(name.to_string());
    }

    let (stem, extension) = split_name(name);
    for counter in 1..=MAX_NAME_SUFFIX {
        let candidate = match extension {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        if !entry_exists(&root.join(&candidate)) {
            return Ok(candidate);
        }
    }

    Err(StoreError::ServerWriteFailure(format!(
        "no free name left for {name}"
    )))
}

/// Lists the regular files directly under the store root, newest first.
pub fn list_files(server_root: &Path) -> Result<Vec<StoredFile>, StoreError> {
    if !server_root.is_dir() {
        return Ok(Vec::new());
    }

    let entries = with_retries("list uploads", || fs::read_dir(server_root)).map_err(|e| {
        error!("Failed to list upload directory: {e}");
        StoreError::Unknown(format!("cannot read the upload directory: {e}"))
    })?;

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with(TEMP_PREFIX) {
            continue;
        }
        // DirEntry::metadata does not follow symlinks
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        files.push(StoredFile::from_metadata(name, &metadata));
    }

    files.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| a.name.cmp(&b.name))
    });

    info!("Listed upload directory - {} files", files.len());
    Ok(files)
}

/// Resolves a requested download to a file inside the store root.
pub fn prepare_download(server_root: &Path, requested: &str) -> Result<DownloadTarget, StoreError> {
    if requested.is_empty() {
        return Err(StoreError::NoFileProvided);
    }

    let name = sanitize_name(requested)?;
    let root = canonical_root(server_root).map_err(|_| StoreError::NotFound(name.to_string()))?;
    let path = resolve_in_root(&root, name)?;

    let metadata = match fs::metadata(&path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(StoreError::NotFound(name.to_string())),
    };

    info!("Prepared download for {name}");
    Ok(DownloadTarget {
        path,
        file: StoredFile::from_metadata(name.to_string(), &metadata),
    })
}

/// Deletes a file from the store root.
pub fn delete_file(server_root: &Path, requested: &str) -> Result<(), StoreError> {
    let name = sanitize_name(requested)?;
    let root = canonical_root(server_root).map_err(|_| StoreError::NotFound(name.to_string()))?;
    let path = resolve_in_root(&root, name)?;

    if !path.is_file() {
        return Err(StoreError::NotFound(name.to_string()));
    }

    with_retries("delete upload", || fs::remove_file(&path)).map_err(|e| {
        error!("Failed to delete file {name}: {e}");
        StoreError::DeleteFailed(e.to_string())
    })?;

    info!("Deleted file {name}");
    Ok(())
}

/// Renames a stored file. An existing target is never replaced.
pub fn rename_file(
    server_root: &Path,
    policy: &UploadPolicy,
    old_name: &str,
    new_name: &str,
) -> Result<StoredFile, StoreError> {
    let new_name = validate_new_name(new_name)?;
    if let Some(ext) = extension_of(new_name) {
        if policy.is_denied(&ext) {
            return Err(StoreError::UnsafeExtension(ext));
        }
    }

    let old_name = sanitize_name(old_name)?;
    let root =
        canonical_root(server_root).map_err(|_| StoreError::NotFound(old_name.to_string()))?;

    let old_path = resolve_in_root(&root, old_name)?;
    if !old_path.is_file() {
        return Err(StoreError::NotFound(old_name.to_string()));
    }

    let new_path = resolve_in_root(&root, new_name)?;
    if entry_exists(&new_path) {
        return Err(StoreError::NameCollision(new_name.to_string()));
    }

    fs::rename(&old_path, &new_path).map_err(|e| {
        error!("Failed to rename {old_name} to {new_name}: {e}");
        StoreError::ServerWriteFailure(format!("cannot rename file: {e}"))
    })?;

    let metadata = fs::metadata(&new_path).map_err(|e| {
        StoreError::ServerWriteFailure(format!("renamed file is not readable: {e}"))
    })?;

    info!("Renamed file {old_name} to {new_name}");
    Ok(StoredFile::from_metadata(new_name.to_string(), &metadata))
}
