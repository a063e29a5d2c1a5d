//! hoydedata.no DTM export client.
//!
//! Fetches single-band 32-bit float GeoTIFF elevation imagery from the
//! ArcGIS ImageServer `exportImage` operation:
//!
//! `https://hoydedata.no/arcgis/rest/services/DTM/ImageServer/exportImage`
//!
//! ## Request Shape
//!
//! One GET per fetch, with the bounding box and output image both in
//! EPSG:25833. The pixel size is derived from the configured resolution and
//! clamped to [`MAX_IMAGE_SIZE`] per dimension (the service rejects larger
//! requests).
//!
//! ## Failure Handling
//!
//! There are no retries. A non-success status, or a 200 whose content type
//! is not an image, is reported as an error and nothing is written. The
//! response body is fully buffered, written to a temporary file next to the
//! target, and renamed into place, so an existing output is either fully
//! replaced or left untouched.

use crate::image_size::MAX_IMAGE_SIZE;
use crate::projection::HOYDEDATA_EPSG;
use crate::{BoundingBox, DtmError, ImageSize, Result};
use reqwest::header::CONTENT_TYPE;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

macro_rules! base_url {
    () => {
        "https://hoydedata.no/arcgis/rest/services"
    };
}

/// hoydedata.no ArcGIS REST services root.
pub const BASE_URL: &str = base_url!();

/// DTM ImageServer export endpoint.
pub const DTM_ENDPOINT: &str = concat!(base_url!(), "/DTM/ImageServer/exportImage");

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default ground resolution in meters per pixel.
pub const DEFAULT_RESOLUTION: f64 = 1.0;

/// Configuration for a [`DtmClient`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Ground resolution in meters per pixel.
    pub resolution: f64,
    /// Export endpoint URL.
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Maximum pixels per image dimension.
    pub max_image_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            endpoint: DTM_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_image_size: MAX_IMAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Default configuration with the given resolution.
    pub fn with_resolution(resolution: f64) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Override the export endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the per-dimension pixel limit.
    pub fn max_image_size(mut self, max_image_size: u32) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    /// Check that the configuration can produce valid requests.
    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(DtmError::InvalidConfig(format!(
                "resolution must be a positive number of meters per pixel, got {}",
                self.resolution
            )));
        }
        if self.max_image_size == 0 {
            return Err(DtmError::InvalidConfig(
                "max_image_size must be at least 1".to_string(),
            ));
        }
        if self.endpoint.is_empty() {
            return Err(DtmError::InvalidConfig("endpoint must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Client for fetching DTM imagery from hoydedata.no.
///
/// Owns one HTTP connection pool for its lifetime. The pool is released
/// when the client is dropped; [`with_client`] scopes that to a closure.
pub struct DtmClient {
    config: ClientConfig,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for DtmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DtmClient")
            .field("config", &self.config)
            .finish()
    }
}

impl DtmClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        debug!(endpoint = %config.endpoint, resolution = config.resolution, "opened export client");

        Ok(Self { config, client })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the configured resolution in meters per pixel.
    pub fn resolution(&self) -> f64 {
        self.config.resolution
    }

    /// Pixel dimensions that will be requested for `bbox`.
    pub fn image_size(&self, bbox: &BoundingBox) -> ImageSize {
        ImageSize::for_bbox_with_limit(bbox, self.config.resolution, self.config.max_image_size)
    }

    /// Query parameters sent to the export endpoint for `bbox`, in order.
    pub fn export_params(&self, bbox: &BoundingBox) -> Vec<(&'static str, String)> {
        build_params(bbox, self.image_size(bbox))
    }

    /// Fetch DTM imagery for a UTM33 bounding box and save it to `output_path`.
    ///
    /// Missing parent directories are created and an existing file is
    /// overwritten. Returns the path written.
    pub fn fetch<P: AsRef<Path>>(&self, bbox: &BoundingBox, output_path: P) -> Result<PathBuf> {
        bbox.validate()?;

        let size = self.image_size(bbox);
        if size.is_empty() {
            return Err(DtmError::InvalidImageSize {
                width: size.width,
                height: size.height,
            });
        }

        let params = build_params(bbox, size);
        debug!(endpoint = %self.config.endpoint, ?params, "requesting DTM export");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DtmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_image_content_type(&content_type) {
            return Err(DtmError::UnexpectedContentType(content_type));
        }

        let bytes = response.bytes()?;
        let output_path = write_output(output_path.as_ref(), &bytes)?;

        info!(
            path = %output_path.display(),
            bytes = bytes.len(),
            width = size.width,
            height = size.height,
            "saved DTM export"
        );

        Ok(output_path)
    }

    /// Fetch DTM imagery for WGS84 corners.
    ///
    /// # Arguments
    /// * `min_lon`, `min_lat` - Southwest corner (longitude, latitude)
    /// * `max_lon`, `max_lat` - Northeast corner (longitude, latitude)
    /// * `output_path` - Where to save the GeoTIFF
    pub fn fetch_wgs84<P: AsRef<Path>>(
        &self,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
        output_path: P,
    ) -> Result<PathBuf> {
        let bbox = BoundingBox::from_wgs84(min_lon, min_lat, max_lon, max_lat)?;
        self.fetch(&bbox, output_path)
    }
}

impl Drop for DtmClient {
    fn drop(&mut self) {
        debug!(endpoint = %self.config.endpoint, "closed export client");
    }
}

/// Run `f` with a freshly opened client, releasing it on every exit path.
///
/// ```no_run
/// use terreng_dtm::{with_client, BoundingBox, ClientConfig};
///
/// let bbox = BoundingBox::from_center_and_size(10.6683, 59.9639, 1000.0, 1000.0)?;
/// let path = with_client(ClientConfig::with_resolution(1.0), |client| {
///     client.fetch(&bbox, "terrain.tif")
/// })?;
/// println!("Saved to: {}", path.display());
/// # Ok::<(), terreng_dtm::DtmError>(())
/// ```
pub fn with_client<T, F>(config: ClientConfig, f: F) -> Result<T>
where
    F: FnOnce(&DtmClient) -> Result<T>,
{
    let client = DtmClient::new(config)?;
    f(&client)
}

fn build_params(bbox: &BoundingBox, size: ImageSize) -> Vec<(&'static str, String)> {
    let sr = HOYDEDATA_EPSG.to_string();
    vec![
        ("bbox", bbox.to_bbox_string()),
        ("bboxSR", sr.clone()),
        ("imageSR", sr),
        ("size", size.to_string()),
        ("format", "tiff".to_string()),
        // 32-bit float keeps sub-meter elevation precision
        ("pixelType", "F32".to_string()),
        ("interpolation", "RSP_BilinearInterpolation".to_string()),
        ("f", "image".to_string()),
    ]
}

/// True if a Content-Type header value denotes image or TIFF bytes.
pub(crate) fn is_image_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("tiff") || lower.contains("image")
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Same directory as the target so the rename stays on one filesystem
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_acceptance() {
        assert!(is_image_content_type("image/tiff"));
        assert!(is_image_content_type("IMAGE/TIFF"));
        assert!(is_image_content_type("application/x-tiff"));
        assert!(is_image_content_type("image/png"));
        assert!(!is_image_content_type("text/html; charset=utf-8"));
        assert!(!is_image_content_type("application/json"));
        assert!(!is_image_content_type(""));
    }

    #[test]
    fn test_export_params() {
        let client = DtmClient::new(ClientConfig::default()).unwrap();
        let bbox = BoundingBox::new(100.5, 200.25, 300.75, 400.0);
        let params = client.export_params(&bbox);

        assert_eq!(
            params,
            vec![
                ("bbox", "100.5,200.25,300.75,400.0".to_string()),
                ("bboxSR", "25833".to_string()),
                ("imageSR", "25833".to_string()),
                ("size", "200,199".to_string()),
                ("format", "tiff".to_string()),
                ("pixelType", "F32".to_string()),
                ("interpolation", "RSP_BilinearInterpolation".to_string()),
                ("f", "image".to_string()),
            ]
        );
    }

    #[test]
    fn test_image_size_uses_resolution_and_limit() {
        let config = ClientConfig::with_resolution(2.0).max_image_size(1000);
        let client = DtmClient::new(config).unwrap();
        let bbox = BoundingBox::new(0.0, 0.0, 4000.0, 1000.0);
        assert_eq!(client.image_size(&bbox), ImageSize { width: 1000, height: 250 });
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.resolution, 1.0);
        assert_eq!(config.endpoint, DTM_ENDPOINT);
        assert_eq!(
            DTM_ENDPOINT,
            "https://hoydedata.no/arcgis/rest/services/DTM/ImageServer/exportImage"
        );
        assert_eq!(BASE_URL, "https://hoydedata.no/arcgis/rest/services");
        assert!(DTM_ENDPOINT.starts_with(BASE_URL));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_image_size, 15000);
    }

    #[test]
    fn test_invalid_resolution() {
        for resolution in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = DtmClient::new(ClientConfig::with_resolution(resolution));
            assert!(
                matches!(result, Err(DtmError::InvalidConfig(_))),
                "resolution {} should be rejected",
                resolution
            );
        }
    }

    #[test]
    fn test_fetch_rejects_inverted_bbox_before_request() {
        // Unroutable endpoint: the request must never be sent
        let config = ClientConfig::default().endpoint("http://127.0.0.1:9/exportImage");
        let client = DtmClient::new(config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.tif");

        let bbox = BoundingBox::new(1000.0, 0.0, 0.0, 1000.0);
        let result = client.fetch(&bbox, &output);
        assert!(matches!(result, Err(DtmError::InvalidBoundingBox(_))));

        let tiny = BoundingBox::new(0.0, 0.0, 0.5, 1000.0);
        let result = client.fetch(&tiny, &output);
        assert!(matches!(
            result,
            Err(DtmError::InvalidImageSize { width: 0, height: 1000 })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_write_output_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("terrain.tif");

        let written = write_output(&path, b"II*\0data").unwrap();
        assert_eq!(written, path);
        assert_eq!(fs::read(&path).unwrap(), b"II*\0data");

        // Overwrites existing content
        write_output(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");

        // No temporary files left beside the output
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("terrain.tif")]);
    }

    #[test]
    fn test_write_output_failure_keeps_existing_target() {
        let dir = tempfile::tempdir().unwrap();

        // A directory in the way makes the final rename fail
        let blocked = dir.path().join("terrain.tif");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep.txt"), b"old").unwrap();

        let result = write_output(&blocked, b"II*\0data");
        assert!(matches!(result, Err(DtmError::Io(_))));
        assert!(blocked.is_dir());
        assert_eq!(fs::read(blocked.join("keep.txt")).unwrap(), b"old");

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("terrain.tif")]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde_round_trip() {
        let config = ClientConfig::with_resolution(0.5)
            .endpoint("http://localhost:8080/exportImage")
            .timeout(Duration::from_secs(5))
            .max_image_size(4000);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        // Missing fields fall back to defaults
        let parsed: ClientConfig = serde_json::from_str(r#"{"resolution": 2.0}"#).unwrap();
        assert_eq!(parsed, ClientConfig::with_resolution(2.0));
        let parsed: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ClientConfig::default());
    }

    #[test]
    fn test_with_client_propagates_result() {
        let value = with_client(ClientConfig::default(), |client| Ok(client.resolution())).unwrap();
        assert_eq!(value, 1.0);

        let err = with_client(ClientConfig::default(), |_| -> Result<()> {
            Err(DtmError::InvalidBoundingBox("test".to_string()))
        });
        assert!(err.is_err());
    }
}
