//! HTTP API Server
//!
//! Exposes the two identification stages:
//! - `POST /api/identify` - detection on a captured image
//! - `POST /api/get_details` - notes, OCR and verification for one detection

pub mod handlers;
pub mod types;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::storage::{self, CaptureStore};

pub use handlers::{decode_data_url, ApiError};

/// API server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Identification pipeline
    pub pipeline: Arc<Pipeline>,
    /// Where `/api/identify` uploads are kept, if enabled
    pub captures: Option<CaptureStore>,
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create state around an existing pipeline
    pub fn new(pipeline: Pipeline, captures: Option<CaptureStore>, max_body_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            captures,
            max_body_bytes,
        }
    }

    /// Build production state from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let pipeline = Pipeline::from_config(config)?;

        let captures = if config.storage.save_captures {
            let dir = match &config.storage.uploads_dir {
                Some(dir) => dir.clone(),
                None => storage::default_uploads_dir()?,
            };
            info!("Saving captures to {:?}", dir);
            Some(CaptureStore::new(dir)?)
        } else {
            None
        };

        Ok(Self::new(pipeline, captures, config.server.max_body_bytes))
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Identification stages
        .route("/api/identify", post(handlers::identify))
        .route("/api/get_details", post(handlers::get_details))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on an already-bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    let app = build_router(state);
    axum::serve(listener, app).await
}

/// Start the API server
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    info!("Starting API server on {}", listener.local_addr()?);

    serve(listener, state).await
}
