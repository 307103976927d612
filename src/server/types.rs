//! Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogResult, NoteProfile};
use crate::pipeline::{DetectionOutcome, IdentificationResult};
use crate::vision::{CenterBox, Prediction};

/// Message sent alongside an empty prediction list
pub const NO_DETECTIONS_MESSAGE: &str = "No perfume bottles detected";

/// `POST /api/identify` body
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyRequest {
    /// Full image as a base64 data URL
    pub image: Option<String>,
}

/// `POST /api/identify` response
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyResponse {
    pub predictions: Vec<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<DetectionOutcome> for IdentifyResponse {
    fn from(outcome: DetectionOutcome) -> Self {
        match outcome {
            DetectionOutcome::Detected(predictions) => Self {
                predictions,
                message: None,
            },
            DetectionOutcome::NoDetections => Self {
                predictions: Vec::new(),
                message: Some(NO_DETECTIONS_MESSAGE.to_string()),
            },
        }
    }
}

/// `POST /api/get_details` body
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsRequest {
    /// Label chosen by the client from the stage 1 predictions
    pub perfume_name: Option<String>,
    /// Box of the chosen prediction, in original image pixels
    pub bounding_box: Option<CenterBox>,
    /// The original full image as a base64 data URL
    pub image_data_url: Option<String>,
}

/// Note profile or the reason it is missing
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FragranceProfile {
    Notes(NoteProfile),
    Error { error: String, kind: String },
}

impl From<&CatalogResult> for FragranceProfile {
    fn from(result: &CatalogResult) -> Self {
        match result {
            Ok(entry) => FragranceProfile::Notes(entry.notes.clone()),
            Err(e) => FragranceProfile::Error {
                error: e.to_string(),
                kind: e.kind().to_string(),
            },
        }
    }
}

/// `POST /api/get_details` response
#[derive(Debug, Clone, Serialize)]
pub struct DetailsResponse {
    pub fragrance_profile: FragranceProfile,
    pub fragrantica_url: Option<String>,
    pub ocr_text: String,
    pub is_verified: bool,
}

impl From<&IdentificationResult> for DetailsResponse {
    fn from(result: &IdentificationResult) -> Self {
        Self {
            fragrance_profile: FragranceProfile::from(&result.fragrance_profile),
            fragrantica_url: result.catalog_url.clone(),
            ocr_text: result.recognized_text.clone(),
            is_verified: result.is_verified(),
        }
    }
}

/// Error body for every failure
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::verify;
    use crate::catalog::{CatalogEntry, CatalogError};
    use serde_json::json;

    #[test]
    fn test_identify_response_shapes() {
        let detected = IdentifyResponse::from(DetectionOutcome::Detected(vec![Prediction {
            label: "Aventus".to_string(),
            confidence: 0.5,
            bbox: CenterBox::new(10.0, 20.0, 30.0, 40.0),
        }]));
        assert_eq!(
            serde_json::to_value(&detected).unwrap(),
            json!({
                "predictions": [{
                    "class": "Aventus",
                    "confidence": 0.5,
                    "x": 10.0,
                    "y": 20.0,
                    "width": 30.0,
                    "height": 40.0
                }]
            })
        );

        let empty = IdentifyResponse::from(DetectionOutcome::NoDetections);
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!({ "predictions": [], "message": "No perfume bottles detected" })
        );
    }

    #[test]
    fn test_details_request_field_names() {
        let request: DetailsRequest = serde_json::from_value(json!({
            "perfume_name": "Chanel-No-5",
            "bounding_box": { "x": 100, "y": 80.5, "width": 40, "height": 60 },
            "image_data_url": "data:image/png;base64,AAAA"
        }))
        .unwrap();

        assert_eq!(request.perfume_name.as_deref(), Some("Chanel-No-5"));
        assert_eq!(request.bounding_box, Some(CenterBox::new(100.0, 80.5, 40.0, 60.0)));
    }

    #[test]
    fn test_details_response_with_notes() {
        let mut notes = NoteProfile::new();
        notes.insert("Top Notes", vec!["Aldehydes".to_string()]);
        let result = IdentificationResult {
            detected_labels: vec!["Chanel-No-5".to_string()],
            fragrance_profile: Ok(CatalogEntry {
                notes,
                url: "https://www.fragrantica.com/perfume/Chanel/Chanel-No-5-40069.html"
                    .to_string(),
            }),
            catalog_url: Some(
                "https://www.fragrantica.com/perfume/Chanel/Chanel-No-5-40069.html".to_string(),
            ),
            recognized_text: "CHANEL N°5".to_string(),
            verification: verify("Chanel-No-5", "CHANEL N°5"),
        };

        let body = serde_json::to_value(DetailsResponse::from(&result)).unwrap();
        assert_eq!(body["fragrance_profile"], json!({ "Top Notes": ["Aldehydes"] }));
        assert_eq!(
            body["fragrantica_url"],
            "https://www.fragrantica.com/perfume/Chanel/Chanel-No-5-40069.html"
        );
        assert_eq!(body["ocr_text"], "CHANEL N°5");
    }

    #[test]
    fn test_details_response_with_catalog_error() {
        let result = IdentificationResult {
            detected_labels: vec!["Aventus".to_string()],
            fragrance_profile: Err(CatalogError::StructureMissing),
            catalog_url: None,
            recognized_text: String::new(),
            verification: verify("Aventus", ""),
        };

        let body = serde_json::to_value(DetailsResponse::from(&result)).unwrap();
        assert_eq!(
            body,
            json!({
                "fragrance_profile": {
                    "error": "Could not find the fragrance pyramid on the page.",
                    "kind": "structure_missing"
                },
                "fragrantica_url": null,
                "ocr_text": "",
                "is_verified": false
            })
        );
    }
}
