//! Native GeoTIFF reading/writing built on the `tiff` crate.
//!
//! Georeferencing is read from ModelPixelScale + ModelTiepoint, or from
//! ModelTransformation. The projection descriptor travels as the GTCitation
//! geokey in GeoAsciiParams, so any opaque string survives a save/load cycle.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, GrayI16};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::raster::{Cell, Grid, GridInfo};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_ASCII_PARAMS: u16 = 34737;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GT_CITATION_GEO_KEY: u16 = 1026;

/// Value written for NoData cells in 16-bit integer files.
pub const INT16_NODATA: i16 = i16::MIN;

/// Pixel encoding of a saved band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelType {
    /// Signed 16-bit integers; fractional values are truncated
    #[default]
    Int16,
    /// 32-bit IEEE floats; values are stored as-is
    Float32,
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub pixel_type: PixelType,
}

impl GeoTiffOptions {
    /// `Float32` when `floating_point` is set, `Int16` otherwise.
    pub fn floating_point(floating_point: bool) -> Self {
        Self {
            pixel_type: if floating_point {
                PixelType::Float32
            } else {
                PixelType::Int16
            },
        }
    }
}

/// Narrow a cell value to the 16-bit integer encoding.
///
/// The fractional part is truncated toward zero (`2.9 → 2`, `-2.9 → -2`) and
/// the result saturates to `[-32767, 32767]`; `-32768` is reserved for
/// NoData, which is also what NaN maps to.
pub fn narrow_to_i16(value: f32) -> i16 {
    if value.is_nan() {
        return INT16_NODATA;
    }
    let max = i16::MAX as f32;
    value.trunc().clamp(-max, max) as i16
}

/// Read one band (1-based) of a GeoTIFF file into a Grid.
pub fn read_geotiff<P: AsRef<Path>>(path: P, band: usize) -> Result<Grid> {
    let path = path.as_ref();
    info!("Reading {} (band {})", path.display(), band);
    let file = File::open(path)?;
    decode_geotiff(BufReader::new(file), band)
}

/// Read one band of a GeoTIFF held in memory.
pub fn read_geotiff_from_buffer(data: &[u8], band: usize) -> Result<Grid> {
    decode_geotiff(Cursor::new(data), band)
}

fn decode_geotiff<R: Read + Seek>(reader: R, band: usize) -> Result<Grid> {
    let mut decoder = Decoder::new(reader)?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }

    let geo_transform = read_geo_transform(&mut decoder);
    let projection = read_projection(&mut decoder);
    let nodata = read_nodata(&mut decoder);

    let samples: Vec<f32> = match decoder.read_image()? {
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let pixels = width * height;
    if samples.len() < pixels || samples.len() % pixels != 0 {
        return Err(Error::DimensionMismatch {
            expected: (width, height),
            actual: (samples.len(), 1),
        });
    }
    let bands = samples.len() / pixels;
    if band == 0 || band > bands {
        return Err(Error::InvalidBand { band, bands });
    }

    let cells: Vec<Cell> = samples
        .into_iter()
        .skip(band - 1)
        .step_by(bands)
        .map(|v| match nodata {
            _ if v.is_nan() => None,
            Some(nd) if v == nd => None,
            _ => Some(v),
        })
        .collect();

    debug!(
        "Decoded {}x{} ({} band(s)), nodata={:?}, transform={:?}",
        width, height, bands, nodata, geo_transform
    );

    let info = GridInfo::new(width, height, geo_transform, projection)?;
    Grid::from_cells(Arc::new(info), cells)
}

/// Geotransform from GeoTIFF tags; GDAL's identity default when absent.
fn read_geo_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> [f64; 6] {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT)).ok();

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return [origin_x, scale[0], 0.0, origin_y, 0.0, -scale[1]];
        }
    }

    if let Ok(m) = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TRANSFORMATION)) {
        if m.len() >= 8 {
            return [m[3], m[0], m[1], m[7], m[4], m[5]];
        }
    }

    [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
}

/// Projection string stored under the GTCitation geokey, or empty.
fn read_projection<R: Read + Seek>(decoder: &mut Decoder<R>) -> String {
    let Ok(keys) = decoder.get_tag_u16_vec(Tag::Unknown(GEO_KEY_DIRECTORY)) else {
        return String::new();
    };
    let Ok(ascii) = decoder.get_tag_ascii_string(Tag::Unknown(GEO_ASCII_PARAMS)) else {
        return String::new();
    };

    // Header is 4 shorts, then 4 shorts per key: id, location, count, offset.
    keys.get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .find(|k| k[0] == GT_CITATION_GEO_KEY && k[1] == GEO_ASCII_PARAMS)
        .and_then(|k| {
            let start = k[3] as usize;
            ascii.get(start..start + k[2] as usize)
        })
        .map(|s| s.trim_end_matches('|').to_string())
        .unwrap_or_default()
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim().trim_end_matches('\0').parse().ok())
}

/// Write a Grid to a single-band GeoTIFF file.
pub fn write_geotiff<P: AsRef<Path>>(grid: &Grid, path: P, options: &GeoTiffOptions) -> Result<()> {
    let path = path.as_ref();
    info!(
        "Writing {} ({}x{}, {:?})",
        path.display(),
        grid.width(),
        grid.height(),
        options.pixel_type
    );
    let mut writer = BufWriter::new(File::create(path)?);
    encode_geotiff(grid, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

/// Write a Grid to an in-memory GeoTIFF buffer.
pub fn write_geotiff_to_buffer(grid: &Grid, options: &GeoTiffOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(grid, Cursor::new(&mut buf), options)?;
    Ok(buf)
}

fn encode_geotiff<W: Write + Seek>(grid: &Grid, writer: W, options: &GeoTiffOptions) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let (width, height) = (grid.width() as u32, grid.height() as u32);

    match options.pixel_type {
        PixelType::Float32 => {
            let data: Vec<f32> = grid.cells().map(|c| c.unwrap_or(f32::NAN)).collect();
            let mut image = encoder.new_image::<Gray32Float>(width, height)?;
            write_geo_tags(image.encoder(), grid.info())?;
            image.encoder().write_tag(Tag::Unknown(GDAL_NODATA), "nan")?;
            image.write_data(&data)?;
        }
        PixelType::Int16 => {
            let data: Vec<i16> = grid
                .cells()
                .map(|c| c.map_or(INT16_NODATA, narrow_to_i16))
                .collect();
            let nodata = INT16_NODATA.to_string();
            let mut image = encoder.new_image::<GrayI16>(width, height)?;
            write_geo_tags(image.encoder(), grid.info())?;
            image.encoder().write_tag(Tag::Unknown(GDAL_NODATA), nodata.as_str())?;
            image.write_data(&data)?;
        }
    }

    Ok(())
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    info: &GridInfo,
) -> Result<()> {
    let gt = info.geo_transform();

    if gt[5] < 0.0 {
        let scale = [gt[1], -gt[5], 0.0];
        dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), scale.as_slice())?;

        let tiepoint = [0.0, 0.0, 0.0, gt[0], gt[3], 0.0];
        dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        // Pixel scale cannot express a south-up raster.
        let matrix = [
            gt[1], gt[2], 0.0, gt[0], //
            gt[4], gt[5], 0.0, gt[3], //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), matrix.as_slice())?;
    }

    let projection = info.projection();
    let citation = format!("{}|", projection);
    if citation.len() > usize::from(u16::MAX) {
        return Err(Error::InvalidParameter {
            name: "projection",
            value: format!("{} bytes", projection.len()),
            reason: "GeoAsciiParams citations are limited to 65534 bytes".into(),
        });
    }

    // Header: version 1.1.0, then the key count
    let mut geokeys: Vec<u16> = vec![1, 1, 0, 0];
    if let Some(model) = model_type(projection) {
        geokeys.extend_from_slice(&[GT_MODEL_TYPE_GEO_KEY, 0, 1, model]);
    }
    // PixelIsArea
    geokeys.extend_from_slice(&[GT_RASTER_TYPE_GEO_KEY, 0, 1, 1]);
    if !projection.is_empty() {
        geokeys.extend_from_slice(&[GT_CITATION_GEO_KEY, GEO_ASCII_PARAMS, citation.len() as u16, 0]);
    }
    geokeys[3] = ((geokeys.len() - 4) / 4) as u16;

    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys.as_slice())?;
    if !projection.is_empty() {
        dir.write_tag(Tag::Unknown(GEO_ASCII_PARAMS), citation.as_str())?;
    }

    Ok(())
}

/// GTModelTypeGeoKey value: 2 for geographic WKT, 1 otherwise, absent without a projection.
fn model_type(projection: &str) -> Option<u16> {
    let head = projection.trim_start();
    if head.is_empty() {
        None
    } else if head.starts_with("GEOGCS") || head.starts_with("GEOGCRS") {
        Some(2)
    } else {
        Some(1)
    }
}
