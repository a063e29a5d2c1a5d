//! WGS84 to ETRS89 / UTM zone 33N coordinate transform.
//!
//! hoydedata.no serves all imagery in EPSG:25833, so every geographic input
//! is projected into that system before a request is built. The projection
//! is done with `proj4rs` (pure Rust, no system PROJ install needed).

use crate::{DtmError, Result};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

/// EPSG code of the service's native reference system (ETRS89 / UTM zone 33N).
pub const HOYDEDATA_EPSG: u32 = 25833;

/// EPSG code of WGS84 geographic coordinates.
pub const WGS84_EPSG: u32 = 4326;

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";
const UTM33_PROJ: &str = "+proj=utm +zone=33 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs";

/// Projects WGS84 longitude/latitude (degrees) into UTM33 meters.
pub struct Utm33Transformer {
    source: Proj,
    target: Proj,
}

impl std::fmt::Debug for Utm33Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utm33Transformer")
            .field("source", &WGS84_EPSG)
            .field("target", &HOYDEDATA_EPSG)
            .finish()
    }
}

impl Utm33Transformer {
    /// Create a transformer for EPSG:4326 -> EPSG:25833.
    pub fn new() -> Result<Self> {
        let source = Proj::from_proj_string(WGS84_PROJ)
            .map_err(|e| DtmError::Projection(format!("invalid EPSG:{WGS84_EPSG} definition: {e:?}")))?;
        let target = Proj::from_proj_string(UTM33_PROJ)
            .map_err(|e| DtmError::Projection(format!("invalid EPSG:{HOYDEDATA_EPSG} definition: {e:?}")))?;
        Ok(Self { source, target })
    }

    /// Transform a (longitude, latitude) pair in degrees to (x, y) in meters.
    ///
    /// Points far outside zone 33 still produce a result, with growing
    /// distortion. Only a failure inside the projection itself is an error.
    pub fn transform(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        // proj4rs works in radians for geographic systems
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&self.source, &self.target, &mut point).map_err(|e| {
            DtmError::Projection(format!("transform of ({lon}, {lat}) failed: {e:?}"))
        })?;

        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(DtmError::Projection(format!(
                "transform of ({lon}, {lat}) produced non-finite coordinates"
            )));
        }

        Ok((point.0, point.1))
    }
}

/// Convenience function: project a single WGS84 point into UTM33.
pub fn wgs84_to_utm33(lon: f64, lat: f64) -> Result<(f64, f64)> {
    Utm33Transformer::new()?.transform(lon, lat)
}
