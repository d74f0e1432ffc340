use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use log::{error, info, warn};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{ServerConfig, UploadPolicy};
use crate::server::routes;
use crate::utils::format_bytes;

/// Per-request context shared by every handler.
///
/// Read-only after startup; handlers receive it explicitly through axum state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub policy: UploadPolicy,
}

impl AppState {
    pub fn new(root: impl Into<PathBuf>, policy: UploadPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }
}

/// Builds the HTTP surface over the store.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.policy.max_request_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/upload", post(routes::upload))
        .route("/download", get(routes::download))
        .route(
            "/api/files",
            get(routes::manage_query).post(routes::manage_json),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    address: String,
}

impl Server {
    pub async fn new(config: &ServerConfig) -> io::Result<Self> {
        let policy = config
            .upload_policy()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let address = config.listen_address();

        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => {
                info!("Server bound to {address}");
                listener
            }
            Err(e) => {
                error!("Failed to bind to {address}: {e}");
                return Err(e);
            }
        };

        let root = config.upload_root_path();
        if let Err(e) = std::fs::create_dir_all(&root) {
            warn!("Failed to create upload directory: {e}");
        } else {
            info!("Upload directory: {}", root.display());
        }

        Ok(Self {
            listener,
            state: Arc::new(AppState::new(root, policy)),
            address,
        })
    }

    pub async fn start(self) -> io::Result<()> {
        info!(
            "Starting Safe File Store on http://{} (max upload {})",
            self.address,
            format_bytes(self.state.policy.max_upload_size())
        );

        axum::serve(self.listener, build_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server");
}
