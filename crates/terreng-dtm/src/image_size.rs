//! Pixel dimensions for an export request.

use crate::BoundingBox;
use std::fmt;

/// Maximum pixels per dimension accepted by the export service.
pub const MAX_IMAGE_SIZE: u32 = 15000;

/// Requested output image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Pixel size for `bbox` at `resolution` meters per pixel, clamped to
    /// [`MAX_IMAGE_SIZE`].
    pub fn for_bbox(bbox: &BoundingBox, resolution: f64) -> Self {
        Self::for_bbox_with_limit(bbox, resolution, MAX_IMAGE_SIZE)
    }

    /// Pixel size for `bbox` at `resolution`, clamped to `max_size`.
    ///
    /// Both raw dimensions are truncated toward zero. When either exceeds
    /// `max_size`, both are scaled by `max_size / max(width, height)` so the
    /// aspect ratio is kept. Degenerate boxes yield zero dimensions; this
    /// function does not validate its inputs.
    pub fn for_bbox_with_limit(bbox: &BoundingBox, resolution: f64, max_size: u32) -> Self {
        // Stay in f64 until clamped so huge raw sizes keep their ratio
        let mut width = raw_dimension(bbox.width(), resolution);
        let mut height = raw_dimension(bbox.height(), resolution);
        let max = max_size as f64;

        if width > max || height > max {
            let scale = max / width.max(height);
            width = (width * scale).trunc();
            height = (height * scale).trunc();
        }

        Self {
            width: width as u32,
            height: height as u32,
        }
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Pixels along one axis, truncated toward zero. Negative and NaN give 0.
fn raw_dimension(extent: f64, resolution: f64) -> f64 {
    let raw = (extent / resolution).trunc();
    if raw.is_nan() {
        0.0
    } else {
        raw.max(0.0)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_limit() {
        let bbox = BoundingBox::new(0.0, 0.0, 10000.0, 5000.0);
        let size = ImageSize::for_bbox(&bbox, 1.0);
        assert_eq!(size, ImageSize { width: 10000, height: 5000 });
        assert_eq!(size.to_string(), "10000,5000");
    }

    #[test]
    fn test_resolution_divides() {
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);
        assert_eq!(
            ImageSize::for_bbox(&bbox, 0.25),
            ImageSize { width: 4000, height: 4000 }
        );
        assert_eq!(
            ImageSize::for_bbox(&bbox, 3.0),
            ImageSize { width: 333, height: 333 }
        );
    }

    #[test]
    fn test_clamped_square() {
        let bbox = BoundingBox::new(0.0, 0.0, 20000.0, 20000.0);
        let size = ImageSize::for_bbox(&bbox, 1.0);
        assert_eq!(size, ImageSize { width: 15000, height: 15000 });
    }

    #[test]
    fn test_clamped_keeps_aspect_ratio() {
        let bbox = BoundingBox::new(0.0, 0.0, 20000.0, 10000.0);
        let size = ImageSize::for_bbox(&bbox, 1.0);
        assert_eq!(size.width, 15000);
        assert_eq!(size.height, 7500);

        let bbox = BoundingBox::new(0.0, 0.0, 12000.0, 30000.0);
        let size = ImageSize::for_bbox(&bbox, 1.0);
        assert_eq!(size.height, 15000);
        assert_eq!(size.width, 6000);
    }

    #[test]
    fn test_clamp_beyond_u32_range() {
        // 1e10 x 5e9 raw pixels, far past u32::MAX
        let bbox = BoundingBox::new(0.0, 0.0, 10000.0, 5000.0);
        let size = ImageSize::for_bbox(&bbox, 1e-6);
        assert_eq!(size, ImageSize { width: 15000, height: 7500 });
    }

    #[test]
    fn test_custom_limit() {
        let bbox = BoundingBox::new(0.0, 0.0, 4000.0, 2000.0);
        let size = ImageSize::for_bbox_with_limit(&bbox, 1.0, 1000);
        assert_eq!(size, ImageSize { width: 1000, height: 500 });
    }

    #[test]
    fn test_degenerate_box_is_empty() {
        let bbox = BoundingBox::new(100.0, 100.0, 50.0, 200.0);
        let size = ImageSize::for_bbox(&bbox, 1.0);
        assert_eq!(size.width, 0);
        assert!(size.is_empty());
    }
}
