//! Management and upload protocol
//!
//! JSON request/response types, the query parameter parser and the
//! dispatcher from actions to store operations.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;

pub use commands::{ActionResponse, ListResponse, ManageRequest, ManageResponse, UploadResponse};
pub use handlers::{CommandResult, handle_manage};
pub use parser::parse_manage_params;
pub use responses::upload_response;
