//! # mapalg core
//!
//! Core types and I/O for the mapalg map-algebra engine.
//!
//! This crate provides:
//! - `GridInfo`: immutable spatial framing (dimensions, geotransform, extent, projection)
//! - `Grid`: immutable rectangular grid of nullable cells with index and coordinate lookup
//! - `Neighborhood`: square and circular focal windows
//! - `Statistics`: cached global aggregates
//! - GeoTIFF load/save

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{Cell, Extent, Grid, GridInfo, Neighborhood, Statistics};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::io::{read_geotiff, write_geotiff, GeoTiffOptions, PixelType};
    pub use crate::raster::{Cell, Extent, Grid, GridInfo, Neighborhood, Statistics};
}
