//! Error types for mapalg

use thiserror::Error;

/// Main error type for mapalg operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Grid dimension mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        /// (width, height) of the first operand
        expected: (usize, usize),
        /// (width, height) of the offending operand
        actual: (usize, usize),
    },

    #[error("Invalid focal radius: {0} (must be >= 0)")]
    InvalidRadius(i64),

    #[error("Band {band} out of range (file has {bands})")]
    InvalidBand { band: usize, bands: usize },

    #[error("Rotated geotransforms are not supported (coefficients 2 and 4 must be zero)")]
    RotatedTransform,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

impl Error {
    /// Whether the error came from the raster I/O boundary.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Tiff(_) | Error::InvalidBand { .. } | Error::UnsupportedDataType(_)
        )
    }
}

/// Result type alias for mapalg operations
pub type Result<T> = std::result::Result<T, Error>;
