//! Bounding boxes in the service's projected coordinate system.

use crate::projection::Utm33Transformer;
use crate::{DtmError, Result};
use std::fmt;

/// Bounding box in UTM33 coordinates (EPSG:25833), in meters.
///
/// Corners are expected to be well ordered (`max_x >= min_x`,
/// `max_y >= min_y`); construction does not enforce this. Use
/// [`BoundingBox::validate`] before sending a box to the service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// West edge (easting).
    pub min_x: f64,
    /// South edge (northing).
    pub min_y: f64,
    /// East edge (easting).
    pub max_x: f64,
    /// North edge (northing).
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a bounding box from projected bounds.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a bounding box from WGS84 corners.
    ///
    /// The southwest and northeast corners are each projected independently.
    ///
    /// # Arguments
    /// * `min_lon`, `min_lat` - Southwest corner in degrees
    /// * `max_lon`, `max_lat` - Northeast corner in degrees
    pub fn from_wgs84(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let transformer = Utm33Transformer::new()?;
        let (min_x, min_y) = transformer.transform(min_lon, min_lat)?;
        let (max_x, max_y) = transformer.transform(max_lon, max_lat)?;
        Ok(Self::new(min_x, min_y, max_x, max_y))
    }

    /// Create a bounding box from a WGS84 center point and a size in meters.
    ///
    /// Only the center is projected; the half extents are applied directly in
    /// UTM33 meters.
    pub fn from_center_and_size(
        center_lon: f64,
        center_lat: f64,
        width_m: f64,
        height_m: f64,
    ) -> Result<Self> {
        let (center_x, center_y) = Utm33Transformer::new()?.transform(center_lon, center_lat)?;
        let half_w = width_m / 2.0;
        let half_h = height_m / 2.0;
        Ok(Self::new(
            center_x - half_w,
            center_y - half_h,
            center_x + half_w,
            center_y + half_h,
        ))
    }

    /// Width in meters.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in meters.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Midpoint of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Format as the `bbox` query parameter: `min_x,min_y,max_x,max_y`.
    pub fn to_bbox_string(&self) -> String {
        format!(
            "{},{},{},{}",
            format_coord(self.min_x),
            format_coord(self.min_y),
            format_coord(self.max_x),
            format_coord(self.max_y)
        )
    }

    /// Check that the box is finite and has a positive area.
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.min_x, self.min_y, self.max_x, self.max_y];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(DtmError::InvalidBoundingBox(format!(
                "non-finite bounds {}",
                self.to_bbox_string()
            )));
        }
        if self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(DtmError::InvalidBoundingBox(format!(
                "{} has width {} and height {}",
                self.to_bbox_string(),
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bbox_string())
    }
}

/// Shortest round-trip decimal, keeping a `.0` on integral values.
fn format_coord(value: f64) -> String {
    format!("{:?}", value)
}
