//! Module `commands`
//!
//! Management actions accepted by the JSON API and the shapes of the
//! replies sent back.

use serde::{Deserialize, Serialize};

use crate::storage::StoredFile;

/// A management action with its parameters.
///
/// JSON form: `{"action": "rename", "old_name": "a.txt", "new_name": "b.txt"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ManageRequest {
    List,
    Delete {
        #[serde(alias = "file")]
        name: String,
    },
    Rename {
        #[serde(alias = "oldName")]
        old_name: String,
        #[serde(alias = "newName")]
        new_name: String,
    },
}

/// Reply to a mutating action, and to any failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

/// Reply to `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResponse {
    pub files: Vec<StoredFile>,
}

/// Body of a management reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ManageResponse {
    Listing(ListResponse),
    Action(ActionResponse),
}

/// Reply to an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<StoredFile>,
    pub details: Vec<String>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
