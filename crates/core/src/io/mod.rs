//! Raster file I/O: load one band into a Grid, save a Grid as one band

mod native;

pub use native::{
    narrow_to_i16, read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
    GeoTiffOptions, PixelType, INT16_NODATA,
};
