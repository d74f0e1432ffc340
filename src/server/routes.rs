//! HTTP entry points
//!
//! Upload, download and management handlers. Each one only translates
//! between HTTP and the store operations; the rules live in `storage`.

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use log::{error, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::error::StoreError;
use crate::error::handlers::{error_to_status, handle_error};
use crate::protocol::{
    CommandResult, ManageRequest, handle_manage, parse_manage_params, upload_response,
};
use crate::server::core::AppState;
use crate::storage::{StoredFile, prepare_download, save_upload};
use crate::transfer::{BodyLimitExceeded, UploadRequest, UploadStatus};

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    file: Option<String>,
}

/// POST /upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let outcome = match multipart {
        Ok(multipart) => receive_upload(&state, multipart).await,
        Err(rejection) => {
            warn!("Upload without a multipart body: {}", rejection.body_text());
            save_failed(&state, UploadStatus::NoFileSelected).await
        }
    };

    let (status, body) = upload_response(outcome);
    (status, Json(body)).into_response()
}

async fn receive_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<StoredFile, StoreError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return save_failed(state, status_for(&e)).await,
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // Browsers send the field with an empty filename when nothing was picked.
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return save_failed(state, UploadStatus::NoFileSelected).await;
        }

        let declared_size = field
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let request = UploadRequest::new(file_name, declared_size);
        let reader = StreamReader::new(field.map_err(multipart_to_io));
        tokio::pin!(reader);

        return save_upload(&state.root, &state.policy, request, reader).await;
    }

    save_failed(state, UploadStatus::NoFileSelected).await
}

/// Routes a transport-level failure through Save so it is classified the
/// same way as every other upload outcome.
async fn save_failed(state: &AppState, status: UploadStatus) -> Result<StoredFile, StoreError> {
    save_upload(
        &state.root,
        &state.policy,
        UploadRequest::failed(status),
        tokio::io::empty(),
    )
    .await
}

fn status_for(err: &MultipartError) -> UploadStatus {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadStatus::ExceedsServerLimit
    } else {
        UploadStatus::PartiallyReceived
    }
}

fn multipart_to_io(err: MultipartError) -> io::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::other(BodyLimitExceeded)
    } else {
        io::Error::new(io::ErrorKind::UnexpectedEof, err.body_text())
    }
}

/// GET /download?file=<name>
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(requested) = query.file else {
        return (StatusCode::BAD_REQUEST, "File not specified").into_response();
    };

    // Resolution canonicalizes and may back off on retries.
    let root = state.root.clone();
    let target = match tokio::task::spawn_blocking(move || prepare_download(&root, &requested))
        .await
    {
        Ok(Ok(target)) => target,
        Ok(Err(e)) => {
            handle_error("download", &e);
            return (error_to_status(&e), e.to_string()).into_response();
        }
        Err(e) => {
            error!("Download task failed: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Download failed").into_response();
        }
    };

    let file = match tokio::fs::File::open(&target.path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {} for download: {e}", target.file.name);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to open file").into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(target.file.content_type),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&target.file.name),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(target.file.size));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, must-revalidate"),
    );
    headers.insert(
        header::EXPIRES,
        HeaderValue::from_static("Sat, 26 Jul 1997 05:00:00 GMT"),
    );

    info!(
        "Serving download {} ({} bytes)",
        target.file.name,
        target.file.size
    );
    (
        StatusCode::OK,
        headers,
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

fn content_disposition(name: &str) -> HeaderValue {
    let safe: String = name
        .chars()
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// GET /api/files?action=...
pub async fn manage_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result = match parse_manage_params(&params) {
        Ok(request) => run_manage(state, request).await,
        Err(message) => CommandResult::bad_request(message),
    };
    (result.status, Json(result.body)).into_response()
}

/// POST /api/files with a JSON action
pub async fn manage_json(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ManageRequest>, JsonRejection>,
) -> Response {
    let result = match payload {
        Ok(Json(request)) => run_manage(state, request).await,
        Err(rejection) => CommandResult::bad_request(rejection.body_text()),
    };
    (result.status, Json(result.body)).into_response()
}

/// Store operations block on the file system (and may back off on retries).
async fn run_manage(state: Arc<AppState>, request: ManageRequest) -> CommandResult {
    tokio::task::spawn_blocking(move || handle_manage(&state.root, &state.policy, &request))
        .await
        .unwrap_or_else(|e| {
            CommandResult::from_error("manage", StoreError::Unknown(format!("task failed: {e}")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_escapes_quotes() {
        let value = content_disposition("we\"ird.txt");
        assert_eq!(value.to_str().unwrap(), "attachment; filename=\"we_ird.txt\"");
    }

    #[test]
    fn test_content_disposition_plain() {
        let value = content_disposition("report.pdf");
        assert_eq!(value.to_str().unwrap(), "attachment; filename=\"report.pdf\"");
    }
}
