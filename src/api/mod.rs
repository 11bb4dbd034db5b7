//! HTTP boundary of the dialogue service.

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::dialogue::Orchestrator;

mod client;
mod handlers;
pub mod types;

pub use client::RemoteOrchestrator;
pub use handlers::{ApiError, ApiResult};

use types::ErrorBody;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct ServerState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Builds the application router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/api/conversation",
            post(handlers::handle_conversation).get(handlers::handle_ready),
        )
        .route("/api/topics", get(handlers::handle_topics))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    log::error!("request handler panicked: {detail}");
    let body = ErrorBody {
        error: "Internal server error".to_string(),
        details: None,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// The conversation API server.
pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            state: ServerState {
                orchestrator: Arc::new(orchestrator),
            },
        }
    }

    /// Binds `addr` and serves until the process stops.
    pub async fn run(self, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        log::info!("conversation API listening on {}", listener.local_addr()?);
        axum::serve(listener, router(self.state)).await
    }
}
