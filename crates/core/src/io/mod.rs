//! Reading input imagery and writing change products
//!
//! Decoding sits at the edge of the library: the algorithms only ever see
//! [`MultiBandRaster`](crate::MultiBandRaster) values, so any loader that can
//! fill one (GDAL, a cloud reader, a test fixture) plugs in the same way.

mod native;

pub use native::{
    read_multiband_geotiff, read_multiband_geotiff_from_buffer, read_multiband_geotiff_with_info,
    write_geotiff, write_geotiff_to_buffer, write_mask_geotiff, write_mask_geotiff_to_buffer,
    write_rgb_geotiff, write_rgb_geotiff_to_buffer, RasterInfo,
};
