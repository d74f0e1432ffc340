//! File system helpers
//!
//! Small wrappers around `std::fs` shared by the store operations.

use log::warn;
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;

/// Create a directory (and parents) if missing
pub fn ensure_directory(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Check whether anything occupies `path`, dangling symlinks included
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Runs `op`, retrying with linear back-off while it fails with
/// `PermissionDenied` (typically a virus scanner or indexer holding a handle).
pub fn with_retries<T>(what: &str, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_RETRIES && e.kind() == io::ErrorKind::PermissionDenied => {
                warn!("{what}: permission denied (attempt {attempt}/{MAX_RETRIES}), retrying");
                thread::sleep(Duration::from_millis(100 * u64::from(attempt)));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Content type guessed from the file extension.
pub fn content_type_for(name: &str) -> &'static str {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
}
