//! Error types for the DTM crate.

use thiserror::Error;

/// Errors that can occur when fetching or inspecting DTM data.
#[derive(Debug, Error)]
pub enum DtmError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Transport-level HTTP failure (connection, DNS, timeout).
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The export service answered with a non-success status.
    #[error("HTTP {status} from export service: {body}")]
    HttpStatus {
        /// Response status code.
        status: u16,
        /// Response body, if it could be read.
        body: String,
    },

    /// The export service answered 200 but not with an image payload.
    #[error("Unexpected response type: {0:?}")]
    UnexpectedContentType(String),

    /// Coordinate transformation failed.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Bounding box is empty, inverted or non-finite.
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// Computed pixel dimensions cannot be requested.
    #[error("Invalid image size {width}x{height} (both dimensions must be at least 1 pixel)")]
    InvalidImageSize {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// Client configuration is unusable.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid GeoTIFF - malformed georeferencing tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),
}
