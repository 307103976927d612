//! Identification Pipeline
//!
//! Coordinates the two-stage protocol:
//! 1. `detect_candidates` - fast detection, predictions returned to the client
//! 2. `resolve_details` - catalog lookup, crop, OCR and label verification
//!
//! Catalog failures are best-effort and travel inside the result. Crop and
//! OCR failures abort stage 2, since identity verification is mandatory.
//! Every external call is attempted exactly once.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::analysis::{verify, VerificationOutcome};
use crate::catalog::{CatalogResult, FragranticaSource, NoteCatalog, TtlCache};
use crate::config::AppConfig;
use crate::error::{IdentifyError, Service};
use crate::vision::{
    crop_to_png, decode_image, rank_by_confidence, CenterBox, ObjectDetector, Prediction,
    RoboflowDetector, RoboflowOcr, TextRecognizer,
};

/// Stage 1 outcome
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// Predictions in service order, unfiltered
    Detected(Vec<Prediction>),
    /// The service found nothing in the image
    NoDetections,
}

impl DetectionOutcome {
    /// Predictions, empty for `NoDetections`
    pub fn predictions(&self) -> &[Prediction] {
        match self {
            DetectionOutcome::Detected(predictions) => predictions,
            DetectionOutcome::NoDetections => &[],
        }
    }
}

/// Assembled stage 2 result; never mutated after assembly
#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationResult {
    /// Labels considered, highest confidence first
    pub detected_labels: Vec<String>,
    /// Note profile, or the reason the catalog lookup failed
    pub fragrance_profile: CatalogResult,
    /// Catalog page the notes came from
    pub catalog_url: Option<String>,
    /// Raw OCR text of the cropped bottle
    pub recognized_text: String,
    /// Label vs. OCR text comparison
    pub verification: VerificationOutcome,
}

impl IdentificationResult {
    /// Whether the label was confirmed by the bottle text
    pub fn is_verified(&self) -> bool {
        self.verification.is_verified
    }
}

/// Outcome of a full one-shot identification
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifyOutcome {
    Identified(IdentificationResult),
    NoDetections,
}

/// Identification pipeline over injectable adapters
#[derive(Clone)]
pub struct Pipeline {
    detector: Arc<dyn ObjectDetector>,
    recognizer: Arc<dyn TextRecognizer>,
    catalog: NoteCatalog,
}

impl Pipeline {
    /// Create a pipeline from its adapters
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        recognizer: Arc<dyn TextRecognizer>,
        catalog: NoteCatalog,
    ) -> Self {
        Self {
            detector,
            recognizer,
            catalog,
        }
    }

    /// Build the production pipeline (hosted inference + Fragrantica)
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.services.timeout_secs))
            .build()
            .context("Failed to create inference HTTP client")?;

        let api_key = config.api_key();
        if api_key.is_none() {
            warn!("No inference API key configured; detection and OCR requests will fail");
        }

        let detector = RoboflowDetector::new(client.clone(), &config.detection, api_key.clone());
        let recognizer = RoboflowOcr::new(client, &config.ocr, api_key);

        let source = FragranticaSource::from_config(&config.catalog)?;
        let cache = Arc::new(TtlCache::new(
            config.cache.capacity,
            Duration::from_secs(config.cache.ttl_secs),
        ));
        let catalog = NoteCatalog::new(Arc::new(source), cache, config.cache.cache_failures);

        info!(
            "Pipeline ready: model {}, catalog cache {} entries / {}s",
            config.detection.model_id, config.cache.capacity, config.cache.ttl_secs
        );

        Ok(Self::new(Arc::new(detector), Arc::new(recognizer), catalog))
    }

    /// Stage 1: run detection on a full image
    pub async fn detect_candidates(&self, image: &[u8]) -> Result<DetectionOutcome, IdentifyError> {
        if image.is_empty() {
            return Err(IdentifyError::Input("No image data found".to_string()));
        }

        let predictions = self.detector.detect(image).await.map_err(|e| {
            error!("Detection failed: {}", e);
            IdentifyError::from_service(Service::Detection, e)
        })?;

        if predictions.is_empty() {
            info!("No detections in image");
            return Ok(DetectionOutcome::NoDetections);
        }

        info!("Detected {} candidate(s)", predictions.len());
        Ok(DetectionOutcome::Detected(predictions))
    }

    /// Stage 2: resolve notes and verify `label` against the bottle text.
    ///
    /// `image` is the original upload, not a pre-cropped region.
    pub async fn resolve_details(
        &self,
        label: &str,
        bbox: &CenterBox,
        image: &[u8],
    ) -> Result<IdentificationResult, IdentifyError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(IdentifyError::Input("A perfume name is required".to_string()));
        }
        if image.is_empty() {
            return Err(IdentifyError::Input("No image data found".to_string()));
        }
        self.recognizer
            .check_ready()
            .map_err(|e| IdentifyError::from_service(Service::TextRecognition, e))?;
        let decoded = decode_image(image)?;

        info!("Resolving details for '{}'", label);

        debug!("Stage: catalog lookup");
        let fragrance_profile = self.catalog.lookup(label).await;

        debug!("Stage: cropping");
        let rect = bbox.to_crop_rect().map_err(|e| {
            error!("Rejected bounding box {:?}: {}", bbox, e);
            IdentifyError::from(e)
        })?;
        let region = crop_to_png(&decoded, &rect).map_err(|e| {
            error!("Cropping failed: {}", e);
            IdentifyError::from(e)
        })?;

        debug!("Stage: recognizing ({} byte crop)", region.len());
        let recognized_text = self.recognizer.recognize(&region).await.map_err(|e| {
            error!("Text recognition failed: {}", e);
            IdentifyError::from_service(Service::TextRecognition, e)
        })?;

        debug!("Stage: verifying");
        let verification = verify(label, &recognized_text);
        info!(
            "Verification for '{}': {} (score {:?})",
            label, verification.is_verified, verification.score
        );

        let catalog_url = fragrance_profile.as_ref().ok().map(|entry| entry.url.clone());

        Ok(IdentificationResult {
            detected_labels: vec![label.to_string()],
            fragrance_profile,
            catalog_url,
            recognized_text,
            verification,
        })
    }

    /// Both stages in one call, using the highest-confidence detection
    pub async fn identify(&self, image: &[u8]) -> Result<IdentifyOutcome, IdentifyError> {
        let predictions = match self.detect_candidates(image).await? {
            DetectionOutcome::Detected(predictions) => rank_by_confidence(predictions),
            DetectionOutcome::NoDetections => return Ok(IdentifyOutcome::NoDetections),
        };

        let Some(top) = predictions.first() else {
            return Ok(IdentifyOutcome::NoDetections);
        };
        debug!("Top candidate '{}' ({:.2})", top.label, top.confidence);

        let mut result = self.resolve_details(&top.label, &top.bbox, image).await?;
        result.detected_labels = predictions.iter().map(|p| p.label.clone()).collect();

        Ok(IdentifyOutcome::Identified(result))
    }
}
