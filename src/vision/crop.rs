//! Region cropping for OCR
//!
//! Decodes the original upload, cuts out the detected bottle and re-encodes
//! it as PNG for the recognition service.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

use super::geometry::{CropRect, GeometryError};

/// Cropping failures
#[derive(Debug, Error)]
pub enum CropError {
    /// The uploaded bytes are not a decodable image
    #[error("could not decode image: {0}")]
    Decode(String),
    /// The crop rectangle does not fit the image
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Re-encoding the cropped region failed
    #[error("could not encode cropped region: {0}")]
    Encode(String),
}

/// Decode an uploaded image
pub fn decode_image(image_data: &[u8]) -> Result<DynamicImage, CropError> {
    image::load_from_memory(image_data).map_err(|e| CropError::Decode(e.to_string()))
}

/// Crop a decoded image to `rect` and return the region as PNG bytes.
///
/// The rectangle is intersected with the image bounds; a rectangle that
/// misses the image entirely is a geometry error.
pub fn crop_to_png(image: &DynamicImage, rect: &CropRect) -> Result<Vec<u8>, CropError> {
    let (img_w, img_h) = image.dimensions();

    let (x, y, width, height) = rect.clamp_to_image(img_w, img_h)?;
    debug!(
        "Cropping {}x{} region at ({}, {}) from {}x{} image",
        width, height, x, y, img_w, img_h
    );

    let region = image.crop_imm(x, y, width, height);

    let mut encoded = Cursor::new(Vec::new());
    region
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|e| CropError::Encode(e.to_string()))?;

    Ok(encoded.into_inner())
}
