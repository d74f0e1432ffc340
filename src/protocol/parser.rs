//! Module `parser`
//!
//! Builds a [`ManageRequest`] from query or form parameters.

use std::collections::HashMap;

use crate::protocol::commands::ManageRequest;

/// Parses `action` plus its parameters.
///
/// `delete` takes `name` (or `file`); `rename` takes `old_name` and
/// `new_name` (camelCase spellings accepted too).
pub fn parse_manage_params(params: &HashMap<String, String>) -> Result<ManageRequest, String> {
    let action = params
        .get("action")
        .map(|a| a.trim().to_ascii_lowercase())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| "Missing action".to_string())?;

    match action.as_str() {
        "list" => Ok(ManageRequest::List),
        "delete" => Ok(ManageRequest::Delete {
            name: required(params, &["name", "file"])?,
        }),
        "rename" => Ok(ManageRequest::Rename {
            old_name: required(params, &["old_name", "oldName"])?,
            new_name: required(params, &["new_name", "newName"])?,
        }),
        other => Err(format!("Unknown action: {other}")),
    }
}

fn required(params: &HashMap<String, String>, keys: &[&str]) -> Result<String, String> {
    keys.iter()
        .find_map(|key| params.get(*key))
        .cloned()
        .ok_or_else(|| format!("Missing parameter: {}", keys[0]))
}
