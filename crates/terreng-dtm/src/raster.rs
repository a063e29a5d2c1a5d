//! Metadata of a downloaded DTM GeoTIFF.

use crate::{DtmError, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const MODEL_TRANSFORMATION_TAG: u16 = 34264;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GDAL_NODATA_TAG: u16 = 42113;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
/// GeoKey value meaning "user-defined", i.e. no EPSG code.
const USER_DEFINED: u16 = 32767;

/// Projected bounds of a raster, in CRS units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterBounds {
    /// West edge.
    pub left: f64,
    /// South edge.
    pub bottom: f64,
    /// East edge.
    pub right: f64,
    /// North edge.
    pub top: f64,
}

impl fmt::Display for RasterBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "left={}, bottom={}, right={}, top={}",
            self.left, self.bottom, self.right, self.top
        )
    }
}

/// Summary of a single-band elevation GeoTIFF.
#[derive(Debug, Clone)]
pub struct RasterInfo {
    width: u32,
    height: u32,
    epsg: Option<u16>,
    bounds: Option<RasterBounds>,
    resolution: Option<(f64, f64)>,
    no_data_value: Option<f32>,
    elevation_range: Option<(f32, f32)>,
}

/// Pixel-to-model mapping for north-up rasters.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GeoTransform {
    origin_x: f64,
    origin_y: f64,
    pixel_width: f64,
    pixel_height: f64,
}

impl RasterInfo {
    /// Read metadata and the elevation range of the first band from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        // Exports are capped at 15000 x 15000 f32 pixels = ~900 MB
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let samples_per_pixel = decoder
            .get_tag_u32(Tag::SamplesPerPixel)
            .unwrap_or(1)
            .max(1) as usize;

        let epsg = Self::read_epsg(&mut decoder);
        let transform = Self::read_geotransform(&mut decoder)?;
        let no_data_value = Self::read_nodata_value(&mut decoder);

        let band = Self::decode_first_band(&mut decoder, samples_per_pixel)?;
        let elevation_range = elevation_range(&band, no_data_value);

        let bounds = transform.map(|t| RasterBounds {
            left: t.origin_x,
            top: t.origin_y,
            right: t.origin_x + width as f64 * t.pixel_width,
            bottom: t.origin_y - height as f64 * t.pixel_height,
        });
        let resolution = transform.map(|t| (t.pixel_width, t.pixel_height));

        Ok(Self {
            width,
            height,
            epsg,
            bounds,
            resolution,
            no_data_value,
            elevation_range,
        })
    }

    /// Get the dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// EPSG code from the GeoKey directory, if present.
    pub fn epsg(&self) -> Option<u16> {
        self.epsg
    }

    /// Coordinate reference system as `EPSG:<code>`, or `unknown`.
    pub fn crs(&self) -> String {
        match self.epsg {
            Some(code) => format!("EPSG:{}", code),
            None => "unknown".to_string(),
        }
    }

    /// Get the bounds, if the file is georeferenced.
    pub fn bounds(&self) -> Option<RasterBounds> {
        self.bounds
    }

    /// Get the (x, y) pixel size in CRS units, if the file is georeferenced.
    pub fn resolution(&self) -> Option<(f64, f64)> {
        self.resolution
    }

    /// Get the no-data value from the GDAL_NODATA tag.
    pub fn no_data_value(&self) -> Option<f32> {
        self.no_data_value
    }

    /// Minimum and maximum elevation of the first band.
    ///
    /// `None` when every sample is NaN or no-data.
    pub fn elevation_range(&self) -> Option<(f32, f32)> {
        self.elevation_range
    }

    /// Read the CRS code: projected first, geographic as a fallback.
    fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u16> {
        let directory = decoder
            .get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG))
            .ok()?;
        parse_geo_key(&directory, PROJECTED_CS_TYPE_KEY)
            .or_else(|| parse_geo_key(&directory, GEOGRAPHIC_TYPE_KEY))
    }

    /// Read the geotransform from ModelPixelScale + ModelTiepoint, or from
    /// ModelTransformation. Rotation terms are ignored.
    fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoTransform>> {
        let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG));
        let pixel_scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG));

        if let (Ok(tiepoint), Ok(scale)) = (tiepoint, pixel_scale) {
            if tiepoint.len() < 6 || scale.len() < 2 {
                return Err(DtmError::InvalidGeoTiff(format!(
                    "tiepoint has {} values and pixel scale {}",
                    tiepoint.len(),
                    scale.len()
                )));
            }
            // Tiepoint format: [i, j, k, x, y, z] maps pixel (i, j) to model (x, y)
            let (i, j) = (tiepoint[0], tiepoint[1]);
            let (x, y) = (tiepoint[3], tiepoint[4]);
            return Ok(Some(GeoTransform {
                origin_x: x - i * scale[0],
                origin_y: y + j * scale[1],
                pixel_width: scale[0],
                pixel_height: scale[1],
            }));
        }

        if let Ok(matrix) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION_TAG)) {
            if matrix.len() < 16 {
                return Err(DtmError::InvalidGeoTiff(format!(
                    "model transformation has {} values, expected 16",
                    matrix.len()
                )));
            }
            return Ok(Some(GeoTransform {
                origin_x: matrix[3],
                origin_y: matrix[7],
                pixel_width: matrix[0],
                pixel_height: -matrix[5],
            }));
        }

        Ok(None)
    }

    /// Try to read the no-data value from the GDAL_NODATA tag.
    fn read_nodata_value<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
        decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA_TAG))
            .ok()
            .and_then(|s| s.trim_matches(char::from(0)).trim().parse().ok())
    }

    /// Decode the image and keep only the first sample of each pixel.
    fn decode_first_band<R: Read + Seek>(
        decoder: &mut Decoder<R>,
        samples_per_pixel: usize,
    ) -> Result<Vec<f32>> {
        let data = match decoder.read_image()? {
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I8(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
        };

        if samples_per_pixel == 1 {
            return Ok(data);
        }
        Ok(data.into_iter().step_by(samples_per_pixel).collect())
    }
}

/// Look up a single GeoKey value stored inline in the key directory.
///
/// Layout: a 4-short header `[version, revision, minor, count]` followed by
/// `count` entries of `[key_id, tag_location, value_count, value]`.
fn parse_geo_key(directory: &[u16], key: u16) -> Option<u16> {
    let count = *directory.get(3)? as usize;
    directory
        .get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| entry[0] == key && entry[1] == 0)
        .map(|entry| entry[3])
        .filter(|&value| value != 0 && value != USER_DEFINED)
}

fn elevation_range(band: &[f32], no_data_value: Option<f32>) -> Option<(f32, f32)> {
    band.iter()
        .copied()
        .filter(|v| !v.is_nan())
        .filter(|v| no_data_value.map_or(true, |nodata| (v - nodata).abs() >= 0.001))
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geo_key_projected() {
        // Header + GTModelType=1, GTRasterType=1, ProjectedCSType=25833
        let directory = [1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 25833];
        assert_eq!(parse_geo_key(&directory, PROJECTED_CS_TYPE_KEY), Some(25833));
        assert_eq!(parse_geo_key(&directory, GEOGRAPHIC_TYPE_KEY), None);
    }

    #[test]
    fn test_parse_geo_key_ignores_user_defined_and_offsets() {
        let directory = [1, 1, 0, 2, 3072, 0, 1, USER_DEFINED, 2048, 34736, 1, 0];
        assert_eq!(parse_geo_key(&directory, PROJECTED_CS_TYPE_KEY), None);
        assert_eq!(parse_geo_key(&directory, GEOGRAPHIC_TYPE_KEY), None);
    }

    #[test]
    fn test_parse_geo_key_truncated() {
        assert_eq!(parse_geo_key(&[], PROJECTED_CS_TYPE_KEY), None);
        assert_eq!(parse_geo_key(&[1, 1, 0, 5, 3072, 0], PROJECTED_CS_TYPE_KEY), None);
    }

    #[test]
    fn test_elevation_range_skips_nodata_and_nan() {
        let band = [12.5, -9999.0, f32::NAN, 480.25, 3.0];
        assert_eq!(elevation_range(&band, Some(-9999.0)), Some((3.0, 480.25)));
        assert_eq!(elevation_range(&band, None), Some((-9999.0, 480.25)));
        assert_eq!(elevation_range(&[f32::NAN, -9999.0], Some(-9999.0)), None);
    }

    #[test]
    fn test_crs_display() {
        let info = RasterInfo {
            width: 1,
            height: 1,
            epsg: Some(25833),
            bounds: None,
            resolution: None,
            no_data_value: None,
            elevation_range: None,
        };
        assert_eq!(info.crs(), "EPSG:25833");
        assert_eq!(RasterInfo { epsg: None, ..info }.crs(), "unknown");
    }
}
