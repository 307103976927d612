//! HTTP request handlers for API endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{error, info, warn};

use super::types::{
    DetailsRequest, DetailsResponse, ErrorResponse, HealthResponse, IdentifyRequest,
    IdentifyResponse,
};
use super::AppState;
use crate::error::IdentifyError;

/// An [`IdentifyError`] rendered as `{"error": ...}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub IdentifyError);

impl ApiError {
    /// HTTP status for the wrapped error
    pub fn status(&self) -> StatusCode {
        match self.0 {
            IdentifyError::Input(_) | IdentifyError::Geometry(_) => StatusCode::BAD_REQUEST,
            IdentifyError::Transport { .. } => StatusCode::BAD_GATEWAY,
            IdentifyError::Config(_) | IdentifyError::Image(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<IdentifyError> for ApiError {
    fn from(err: IdentifyError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(IdentifyError::Input(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self.0);
        } else {
            warn!("Rejected request ({}): {}", status, self.0);
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Decode a `data:<mime>;base64,<payload>` URL into raw bytes.
///
/// Everything before the first comma is ignored.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, IdentifyError> {
    let (_header, encoded) = data_url.split_once(',').ok_or_else(|| {
        IdentifyError::Input("Invalid image data: missing data URL header".to_string())
    })?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| IdentifyError::Input(format!("Invalid image data: {e}")))?;

    if bytes.is_empty() {
        return Err(IdentifyError::Input("No image data found".to_string()));
    }
    Ok(bytes)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Stage 1: detect bottles in a captured image
pub async fn identify(
    State(state): State<AppState>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let Json(request) = payload?;
    let data_url = request
        .image
        .ok_or_else(|| IdentifyError::Input("No image data found".to_string()))?;
    let image = decode_data_url(&data_url)?;
    info!("Identify request: {} byte image", image.len());

    if let Some(captures) = &state.captures {
        if let Err(e) = captures.save(&image).await {
            warn!("Failed to save capture: {:#}", e);
        }
    }

    let outcome = state.pipeline.detect_candidates(&image).await?;
    Ok(Json(IdentifyResponse::from(outcome)))
}

/// Stage 2: notes, OCR and verification for one chosen detection
pub async fn get_details(
    State(state): State<AppState>,
    payload: Result<Json<DetailsRequest>, JsonRejection>,
) -> Result<Json<DetailsResponse>, ApiError> {
    let Json(request) = payload?;

    let perfume_name = request
        .perfume_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| IdentifyError::Input("Missing perfume_name".to_string()))?;
    let bbox = request
        .bounding_box
        .ok_or_else(|| IdentifyError::Input("Missing bounding_box".to_string()))?;
    let data_url = request
        .image_data_url
        .ok_or_else(|| IdentifyError::Input("No image data found".to_string()))?;
    let image = decode_data_url(&data_url)?;

    info!("Details request for '{}'", perfume_name);

    let result = state
        .pipeline
        .resolve_details(&perfume_name, &bbox, &image)
        .await?;
    Ok(Json(DetailsResponse::from(&result)))
}
