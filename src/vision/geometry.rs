//! Bounding box geometry
//!
//! The detection service reports boxes by their center point plus size.
//! Cropping needs edge coordinates, so boxes are converted (never mutated)
//! into a [`CropRect`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Center-form bounding box, in pixel units, as emitted by the detection service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterBox {
    /// Center X coordinate
    pub x: f32,
    /// Center Y coordinate
    pub y: f32,
    /// Box width
    pub width: f32,
    /// Box height
    pub height: f32,
}

impl CenterBox {
    /// Create a new center-form box
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Convert to edge coordinates
    pub fn to_crop_rect(&self) -> Result<CropRect, GeometryError> {
        crop_rect_from_center_box(self)
    }
}

/// Edge-form rectangle used for cropping
///
/// Always satisfies `right > left` and `bottom > top` when produced by
/// [`crop_rect_from_center_box`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl CropRect {
    /// Rectangle width
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Rectangle height
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Intersect with an image of the given size, rounding outward to whole pixels.
    ///
    /// Returns `(x, y, width, height)` in pixels.
    pub fn clamp_to_image(
        &self,
        image_width: u32,
        image_height: u32,
    ) -> Result<(u32, u32, u32, u32), GeometryError> {
        let left = self.left.floor().max(0.0);
        let top = self.top.floor().max(0.0);
        let right = self.right.ceil().min(image_width as f32);
        let bottom = self.bottom.ceil().min(image_height as f32);

        if right <= left || bottom <= top {
            return Err(GeometryError::OutsideImage {
                rect: *self,
                image_width,
                image_height,
            });
        }

        Ok((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// Geometry failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("degenerate bounding box: width {width} and height {height} must both be positive")]
    DegenerateBox { width: f32, height: f32 },

    #[error("bounding box has non-finite coordinates")]
    NonFinite,

    #[error("crop rectangle {rect:?} does not overlap the {image_width}x{image_height} image")]
    OutsideImage {
        rect: CropRect,
        image_width: u32,
        image_height: u32,
    },
}

/// Convert a center-form box into crop coordinates.
///
/// Zero or negative sizes are reported, never clamped.
pub fn crop_rect_from_center_box(bbox: &CenterBox) -> Result<CropRect, GeometryError> {
    let CenterBox { x, y, width, height } = *bbox;

    if ![x, y, width, height].iter().all(|v| v.is_finite()) {
        return Err(GeometryError::NonFinite);
    }

    if width <= 0.0 || height <= 0.0 {
        return Err(GeometryError::DegenerateBox { width, height });
    }

    let (cx, cy) = (f64::from(x), f64::from(y));
    let half_w = f64::from(width) / 2.0;
    let half_h = f64::from(height) / 2.0;

    let rect = CropRect {
        left: (cx - half_w) as f32,
        top: (cy - half_h) as f32,
        right: (cx + half_w) as f32,
        bottom: (cy + half_h) as f32,
    };

    // Sizes too small to survive f32 rounding at this position
    if rect.right <= rect.left || rect.bottom <= rect.top {
        return Err(GeometryError::DegenerateBox { width, height });
    }

    Ok(rect)
}
