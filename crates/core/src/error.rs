//! Error types for terradelta
//!
//! Only fatal conditions live here. Outcomes that are expected on some
//! imagery (missing near-infrared band, constant difference image) are
//! modelled as result enums by the algorithms that produce them.

use thiserror::Error;

/// Main error type for terradelta operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {bands} band(s) of {width}x{height}")]
    InvalidDimensions {
        bands: usize,
        width: usize,
        height: usize,
    },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The two rasters of a pair do not share the same row/column extent
    #[error("Raster shape mismatch: before is ({er}, {ec}), after is ({ar}, {ac})")]
    ShapeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported {kind} method: '{name}'")]
    UnsupportedMethod { kind: &'static str, name: String },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a shape mismatch between two `(rows, cols)` extents
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Error::ShapeMismatch {
            er: expected.0,
            ec: expected.1,
            ar: actual.0,
            ac: actual.1,
        }
    }
}

/// Result type alias for terradelta operations
pub type Result<T> = std::result::Result<T, Error>;
