//! File system storage management
//!
//! The Safe File Store: name validation, containment checks and the
//! save/list/rename/delete operations over one flat directory.

pub mod filesystem;
pub mod operations;
pub mod results;
pub mod validation;

pub use operations::{
    delete_file, list_files, next_available_name, prepare_download, rename_file, save_upload,
};
pub use results::{DownloadTarget, StoredFile};
