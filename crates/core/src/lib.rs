//! # terradelta core
//!
//! Core types, traits and I/O for the terradelta change-detection library.
//!
//! This crate provides:
//! - `MultiBandRaster<T>`: immutable (band, row, col) image as loaded from disk
//! - `Raster<T>`: single-band grid used for difference and index maps
//! - `ChangeMask`: binary grid whose cells are guaranteed to be 0 or 1
//! - `GeoTransform`: affine georeferencing carried onto derived products
//! - `Algorithm` trait for a consistent API across detectors
//! - Native TIFF I/O for multi-band inputs and mask outputs

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{ChangeMask, GeoTransform, MultiBandRaster, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{ChangeMask, GeoTransform, MultiBandRaster, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in terradelta.
///
/// Algorithms are pure functions that transform input data according to parameters.
/// Running one twice on the same input yields bit-identical output.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
