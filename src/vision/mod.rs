//! Vision Layer
//!
//! Bottle detection and label text recognition.
//! Both are delegated to hosted inference services:
//! - Object detection (bounding boxes + labels)
//! - OCR on a cropped bottle region
//!
//! The adapters sit behind the [`ObjectDetector`] and [`TextRecognizer`]
//! traits so the pipeline can run against fakes.

pub mod crop;
pub mod detection;
pub mod geometry;
pub mod ocr;

use async_trait::async_trait;
use thiserror::Error;

pub use crop::{crop_to_png, decode_image, CropError};
pub use detection::{rank_by_confidence, DetectionThresholds, Prediction, RoboflowDetector};
pub use geometry::{crop_rect_from_center_box, CenterBox, CropRect, GeometryError};
pub use ocr::RoboflowOcr;

/// Failure talking to a hosted inference service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No API key configured for a call that needs one
    #[error("API key is not configured")]
    MissingApiKey,
    /// Network, HTTP status or response shape failure
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// Object detection backend
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in an encoded image.
    ///
    /// Predictions come back in whatever order the backend yields them.
    async fn detect(&self, image: &[u8]) -> Result<Vec<Prediction>, ServiceError>;
}

/// Text recognition backend
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in an encoded image region, returned verbatim
    async fn recognize(&self, image: &[u8]) -> Result<String, ServiceError>;

    /// Fail early when a call could never succeed (e.g. no credentials)
    fn check_ready(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
