//! OCR (Optical Character Recognition) module
//!
//! Sends a cropped bottle region to the hosted DocTR OCR endpoint.
//! Text comes back verbatim, no post-processing, one attempt per call.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::{ServiceError, TextRecognizer};
use crate::config::OcrConfig;

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image: OcrImage<'a>,
}

#[derive(Debug, Serialize)]
struct OcrImage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    result: Option<String>,
}

/// Text recognizer backed by the Roboflow OCR endpoint
pub struct RoboflowOcr {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RoboflowOcr {
    /// Create a recognizer from configuration
    pub fn new(client: reqwest::Client, config: &OcrConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl TextRecognizer for RoboflowOcr {
    fn check_ready(&self) -> Result<(), ServiceError> {
        self.api_key
            .as_deref()
            .map(|_| ())
            .ok_or(ServiceError::MissingApiKey)
    }

    async fn recognize(&self, image: &[u8]) -> Result<String, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or(ServiceError::MissingApiKey)?;
        let start = Instant::now();

        let request = OcrRequest {
            image: OcrImage {
                kind: "base64",
                value: STANDARD.encode(image),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("api_key", api_key)])
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let payload: OcrResponse = response.json().await?;
        let text = payload.result.ok_or_else(|| {
            ServiceError::Transport("OCR response did not contain a result".to_string())
        })?;

        debug!("OCR complete in {:?}: {} chars", start.elapsed(), text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_service;
    use axum::{extract::Query, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn ocr_config(endpoint: String) -> OcrConfig {
        OcrConfig { endpoint }
    }

    async fn doctr_endpoint(
        Query(params): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        assert_eq!(params.get("api_key").map(String::as_str), Some("k"));
        assert_eq!(body["image"]["type"], "base64");
        let value = body["image"]["value"].as_str().unwrap();
        assert_eq!(STANDARD.decode(value).unwrap(), b"crop");
        Json(json!({"result": "  CHANEL\nN°5 PARIS  ", "time": 0.4}))
    }

    #[tokio::test]
    async fn test_recognize_returns_text_verbatim() {
        let router = Router::new().route("/doctr/ocr", post(doctr_endpoint));
        let base = spawn_service(router).await;

        let ocr = RoboflowOcr::new(
            reqwest::Client::new(),
            &ocr_config(format!("{base}/doctr/ocr")),
            Some("k".to_string()),
        );
        let text = ocr.recognize(b"crop").await.unwrap();
        assert_eq!(text, "  CHANEL\nN°5 PARIS  ");
    }

    #[tokio::test]
    async fn test_recognize_empty_text_is_not_an_error() {
        let router = Router::new().route(
            "/doctr/ocr",
            post(|| async { Json(json!({"result": ""})) }),
        );
        let base = spawn_service(router).await;

        let ocr = RoboflowOcr::new(
            reqwest::Client::new(),
            &ocr_config(format!("{base}/doctr/ocr")),
            Some("k".to_string()),
        );
        assert_eq!(ocr.recognize(b"crop").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_recognize_server_error() {
        let router = Router::new().route(
            "/doctr/ocr",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = spawn_service(router).await;

        let ocr = RoboflowOcr::new(
            reqwest::Client::new(),
            &ocr_config(format!("{base}/doctr/ocr")),
            Some("k".to_string()),
        );
        assert!(matches!(
            ocr.recognize(b"crop").await,
            Err(ServiceError::Transport(_))
        ));
    }

    #[test]
    fn test_check_ready_requires_api_key() {
        let config = ocr_config("http://127.0.0.1:9/doctr/ocr".to_string());

        let ocr = RoboflowOcr::new(reqwest::Client::new(), &config, None);
        assert!(matches!(ocr.check_ready(), Err(ServiceError::MissingApiKey)));

        let ocr = RoboflowOcr::new(reqwest::Client::new(), &config, Some("k".to_string()));
        assert!(ocr.check_ready().is_ok());
    }

    #[tokio::test]
    async fn test_recognize_missing_api_key() {
        let ocr = RoboflowOcr::new(
            reqwest::Client::new(),
            &ocr_config("http://127.0.0.1:9/doctr/ocr".to_string()),
            None,
        );
        assert!(matches!(
            ocr.recognize(b"crop").await,
            Err(ServiceError::MissingApiKey)
        ));
    }
}
