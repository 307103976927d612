//! Bottle detection module
//!
//! Sends full images to the hosted object-detection model and returns its
//! predictions as-is. Ranking is left to the caller.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;
use tracing::debug;

use super::geometry::CenterBox;
use super::{ObjectDetector, ServiceError};
use crate::config::DetectionConfig;

/// Minimum prediction confidence requested from the service, in percent
pub const CONFIDENCE_THRESHOLD: u8 = 40;

/// Maximum box overlap allowed by the service's non-maximum suppression, in percent
pub const OVERLAP_THRESHOLD: u8 = 30;

/// A single detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class label
    #[serde(rename = "class")]
    pub label: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Center-form bounding box
    #[serde(flatten)]
    pub bbox: CenterBox,
}

/// Thresholds passed to the detection service on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionThresholds {
    /// Confidence threshold in percent
    pub confidence: u8,
    /// Overlap threshold in percent
    pub overlap: u8,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            confidence: CONFIDENCE_THRESHOLD,
            overlap: OVERLAP_THRESHOLD,
        }
    }
}

/// Response body of the hosted detection endpoint
#[derive(Debug, Deserialize)]
struct DetectionResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

/// Object detector backed by a Roboflow hosted model
pub struct RoboflowDetector {
    client: reqwest::Client,
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
    thresholds: DetectionThresholds,
}

impl RoboflowDetector {
    /// Create a detector from configuration
    pub fn new(client: reqwest::Client, config: &DetectionConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model_id: config.model_id.trim_matches('/').to_string(),
            api_key,
            thresholds: DetectionThresholds {
                confidence: config.confidence_threshold,
                overlap: config.overlap_threshold,
            },
        }
    }
}

#[async_trait]
impl ObjectDetector for RoboflowDetector {
    async fn detect(&self, image: &[u8]) -> Result<Vec<Prediction>, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or(ServiceError::MissingApiKey)?;
        let start = Instant::now();

        let url = format!("{}/{}", self.endpoint, self.model_id);
        let confidence = self.thresholds.confidence.to_string();
        let overlap = self.thresholds.overlap.to_string();

        let response = self
            .client
            .post(&url)
            .query(&[
                ("api_key", api_key),
                ("confidence", confidence.as_str()),
                ("overlap", overlap.as_str()),
            ])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(STANDARD.encode(image))
            .send()
            .await?
            .error_for_status()?;

        let payload: DetectionResponse = response.json().await?;

        debug!(
            "Detection complete in {:?}: {} predictions",
            start.elapsed(),
            payload.predictions.len()
        );

        Ok(payload.predictions)
    }
}

/// Sort predictions by descending confidence
pub fn rank_by_confidence(mut predictions: Vec<Prediction>) -> Vec<Prediction> {
    predictions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    predictions
}
