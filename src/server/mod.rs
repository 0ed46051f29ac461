//! HTTP server for editor extensions
//!
//! Exposes the Coder engine via REST endpoints:
//! - GET /api/health - Health check
//! - POST /api/chat, GET /api/chat/history, POST /api/chat/clear - Chat
//! - GET /api/files, POST /api/files/add, POST /api/files/remove - Files in chat
//! - GET /api/diff, POST /api/undo, POST /api/apply - Engine commits

mod routes;

use anyhow::Result;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::coder::SharedCoder;
use crate::handlers::{ChatHandler, DiffHandler, FilesHandler, UndoHandler};

/// API version reported by the health check and the `x-api-version` header
pub const API_VERSION: &str = "0.1.0";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5000;

// ============================================================================
// Server State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatHandler,
    pub files: FilesHandler,
    pub diff: DiffHandler,
    pub undo: UndoHandler,
}

impl AppState {
    pub fn new(coder: SharedCoder) -> Self {
        Self {
            chat: ChatHandler::new(coder.clone()),
            files: FilesHandler::new(coder.clone()),
            diff: DiffHandler::new(coder.clone()),
            undo: UndoHandler::new(coder),
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let version_header = SetResponseHeaderLayer::if_not_present(
        header::HeaderName::from_static("x-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/chat", post(routes::send_message))
        .route("/api/chat/history", get(routes::get_chat_history))
        .route("/api/chat/clear", post(routes::clear_chat))
        .route("/api/files", get(routes::get_files))
        .route("/api/files/add", post(routes::add_file))
        .route("/api/files/remove", post(routes::remove_file))
        .route("/api/undo", post(routes::undo))
        .route("/api/diff", get(routes::get_diff))
        .route("/api/apply", post(routes::apply_changes))
        .fallback(routes::not_found)
        .layer(version_header)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Server
// ============================================================================

pub struct ApiServer {
    coder: SharedCoder,
    host: String,
    port: u16,
}

impl ApiServer {
    pub fn new(coder: SharedCoder, host: impl Into<String>, port: u16) -> Self {
        Self {
            coder,
            host: host.into(),
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn router(&self) -> Router {
        create_router(AppState::new(self.coder.clone()))
    }

    /// Bind to the configured address and serve until SIGINT/SIGTERM
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        info!("Coder API server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server shut down");
        Ok(())
    }
}

/// Create an API server for `coder` on `host:port`
pub fn create_api_server(coder: SharedCoder, host: impl Into<String>, port: u16) -> ApiServer {
    ApiServer::new(coder, host, port)
}

/// Graceful shutdown signal handler for SIGTERM and Ctrl+C
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}
