//! Pipeline error taxonomy
//!
//! Fatal failures of an identification request. Catalog failures are not
//! listed here: they are carried inside the result instead.

use std::fmt;
use thiserror::Error;

use crate::vision::{CropError, GeometryError, ServiceError};

/// External service a transport failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Detection,
    TextRecognition,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Detection => write!(f, "detection"),
            Service::TextRecognition => write!(f, "text recognition"),
        }
    }
}

/// Fatal identification errors
#[derive(Debug, Error)]
pub enum IdentifyError {
    /// Malformed or missing request data (client fault)
    #[error("{0}")]
    Input(String),

    /// Missing required configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or HTTP failure talking to an inference service
    #[error("{service} service request failed: {message}")]
    Transport { service: Service, message: String },

    /// Unusable bounding box
    #[error("invalid bounding box: {0}")]
    Geometry(#[from] GeometryError),

    /// Image processing failure on our side
    #[error("image processing failed: {0}")]
    Image(String),
}

impl IdentifyError {
    /// Attribute a service failure to `service`
    pub fn from_service(service: Service, err: ServiceError) -> Self {
        match err {
            ServiceError::MissingApiKey => IdentifyError::Config(format!(
                "an API key is required for the {service} service"
            )),
            ServiceError::Transport(message) => IdentifyError::Transport { service, message },
        }
    }
}

impl From<CropError> for IdentifyError {
    fn from(err: CropError) -> Self {
        match err {
            CropError::Decode(msg) => IdentifyError::Input(format!("Invalid image data: {msg}")),
            CropError::Geometry(e) => IdentifyError::Geometry(e),
            CropError::Encode(msg) => IdentifyError::Image(msg),
        }
    }
}
