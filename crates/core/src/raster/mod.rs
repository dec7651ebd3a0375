//! Raster data structures

mod element;
mod geotransform;
mod grid;
mod mask;
mod multiband;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use mask::{ChangeMask, CHANGED, UNCHANGED};
pub use multiband::MultiBandRaster;
