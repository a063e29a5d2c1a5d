//! # terreng-dtm
//!
//! Digital Terrain Model (DTM) client for the Norwegian hoydedata.no service.
//!
//! This crate provides functionality to:
//! - Project WGS84 coordinates into the service's native EPSG:25833
//!   (ETRS89 / UTM zone 33N) system
//! - Build bounding boxes from corners or from a center point and size
//! - Export 32-bit float GeoTIFF elevation imagery through the ArcGIS
//!   ImageServer `exportImage` endpoint
//! - Inspect a downloaded GeoTIFF (size, CRS, bounds, elevation range)
//!
//! ## Overview
//!
//! The export service renders any sub-region of the national DTM into a
//! standalone image. Pixel dimensions follow from the requested ground
//! resolution and are capped at 15000 per side; larger areas are scaled down
//! while keeping their aspect ratio.
//!
//! ## Examples
//!
//! ### Fetching Terrain
//!
//! ```no_run
//! use terreng_dtm::{with_client, BoundingBox, ClientConfig};
//!
//! // 1 km x 1 km around Holmenkollen at 1 m/pixel
//! let bbox = BoundingBox::from_center_and_size(10.6683, 59.9639, 1000.0, 1000.0)?;
//! println!("UTM33 bbox: {}", bbox);
//!
//! let path = with_client(ClientConfig::with_resolution(1.0), |client| {
//!     client.fetch(&bbox, "terrain.tif")
//! })?;
//! println!("Saved to: {}", path.display());
//! # Ok::<(), terreng_dtm::DtmError>(())
//! ```
//!
//! ### Inspecting a File
//!
//! ```no_run
//! use terreng_dtm::RasterInfo;
//!
//! let info = RasterInfo::from_file("terrain.tif")?;
//! let (width, height) = info.dimensions();
//! println!("Size: {}x{} pixels, CRS: {}", width, height, info.crs());
//! if let Some((min, max)) = info.elevation_range() {
//!     println!("Elevation range: {:.1}m to {:.1}m", min, max);
//! }
//! # Ok::<(), terreng_dtm::DtmError>(())
//! ```

mod bbox;
mod client;
mod error;
mod image_size;
mod projection;
mod raster;

pub use bbox::BoundingBox;
pub use client::{
    with_client, ClientConfig, DtmClient, BASE_URL, DEFAULT_RESOLUTION, DEFAULT_TIMEOUT, DTM_ENDPOINT,
};
pub use error::DtmError;
pub use image_size::{ImageSize, MAX_IMAGE_SIZE};
pub use projection::{wgs84_to_utm33, Utm33Transformer, HOYDEDATA_EPSG, WGS84_EPSG};
pub use raster::{RasterBounds, RasterInfo};

/// Result type for DTM operations.
pub type Result<T> = std::result::Result<T, DtmError>;
