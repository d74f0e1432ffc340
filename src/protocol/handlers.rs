//! Management handlers
//!
//! Dispatches a parsed [`ManageRequest`] to the matching store operation and
//! frames the outcome as the JSON contract expects.

use axum::http::StatusCode;
use std::path::Path;

use crate::config::UploadPolicy;
use crate::error::StoreError;
use crate::error::handlers::{error_to_status, handle_error};
use crate::protocol::commands::{ActionResponse, ListResponse, ManageRequest, ManageResponse};
use crate::storage::{delete_file, list_files, rename_file};

/// Outcome of a management action: HTTP status plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: StatusCode,
    pub body: ManageResponse,
}

impl CommandResult {
    fn success(body: ManageResponse) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// A failed store operation; logs it and maps it to a status.
    pub fn from_error(operation: &str, err: StoreError) -> Self {
        handle_error(operation, &err);
        Self {
            status: error_to_status(&err),
            body: ManageResponse::Action(ActionResponse::failed(err.to_string())),
        }
    }

    /// A request that could not be parsed into an action.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ManageResponse::Action(ActionResponse::failed(message)),
        }
    }
}

/// Runs one management action against the store root.
pub fn handle_manage(
    server_root: &Path,
    policy: &UploadPolicy,
    request: &ManageRequest,
) -> CommandResult {
    match request {
        ManageRequest::List => handle_list(server_root),
        ManageRequest::Delete { name } => handle_delete(server_root, name),
        ManageRequest::Rename { old_name, new_name } => {
            handle_rename(server_root, policy, old_name, new_name)
        }
    }
}

fn handle_list(server_root: &Path) -> CommandResult {
    match list_files(server_root) {
        Ok(files) => CommandResult::success(ManageResponse::Listing(ListResponse { files })),
        Err(e) => CommandResult::from_error("list", e),
    }
}

fn handle_delete(server_root: &Path, name: &str) -> CommandResult {
    match delete_file(server_root, name) {
        Ok(()) => CommandResult::success(ManageResponse::Action(ActionResponse::ok(format!(
            "File {name} deleted"
        )))),
        Err(e) => CommandResult::from_error("delete", e),
    }
}

fn handle_rename(
    server_root: &Path,
    policy: &UploadPolicy,
    old_name: &str,
    new_name: &str,
) -> CommandResult {
    match rename_file(server_root, policy, old_name, new_name) {
        Ok(file) => CommandResult::success(ManageResponse::Action(ActionResponse::ok(format!(
            "File {old_name} renamed to {}",
            file.name
        )))),
        Err(e) => CommandResult::from_error("rename", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        dir
    }

    fn message(result: &CommandResult) -> (bool, String) {
        match &result.body {
            ManageResponse::Action(action) => (action.success, action.message.clone()),
            ManageResponse::Listing(_) => panic!("expected an action response"),
        }
    }

    #[test]
    fn test_list_action() {
        let dir = setup();
        let result = handle_manage(dir.path(), &UploadPolicy::default(), &ManageRequest::List);
        assert_eq!(result.status, StatusCode::OK);
        match result.body {
            ManageResponse::Listing(listing) => {
                assert_eq!(listing.files.len(), 1);
                assert_eq!(listing.files[0].name, "a.txt");
            }
            ManageResponse::Action(_) => panic!("expected a listing"),
        }
    }

    #[test]
    fn test_delete_action() {
        let dir = setup();
        let policy = UploadPolicy::default();
        let request = ManageRequest::Delete { name: "a.txt".into() };

        let result = handle_manage(dir.path(), &policy, &request);
        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(message(&result), (true, "File a.txt deleted".to_string()));

        let result = handle_manage(dir.path(), &policy, &request);
        assert_eq!(result.status, StatusCode::NOT_FOUND);
        assert!(!message(&result).0);
    }

    #[test]
    fn test_rename_action() {
        let dir = setup();
        fs::write(dir.path().join("b.txt"), b"beta").unwrap();
        let policy = UploadPolicy::default();

        let result = handle_manage(
            dir.path(),
            &policy,
            &ManageRequest::Rename {
                old_name: "a.txt".into(),
                new_name: "b.txt".into(),
            },
        );
        assert_eq!(result.status, StatusCode::CONFLICT);
        assert!(!message(&result).0);

        let result = handle_manage(
            dir.path(),
            &policy,
            &ManageRequest::Rename {
                old_name: "a.txt".into(),
                new_name: "c.txt".into(),
            },
        );
        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(
            message(&result),
            (true, "File a.txt renamed to c.txt".to_string())
        );
    }

    #[test]
    fn test_path_escape_is_forbidden_without_path() {
        let dir = setup();
        let result = handle_manage(
            dir.path(),
            &UploadPolicy::default(),
            &ManageRequest::Delete { name: "..".into() },
        );
        assert_eq!(result.status, StatusCode::FORBIDDEN);
        let (success, text) = message(&result);
        assert!(!success);
        assert!(!text.contains(&*dir.path().to_string_lossy()));
    }
}
