//! Per-band min-max normalization
//!
//! Two acquisitions of the same scene rarely share a radiometric range
//! (sun angle, sensor gain, atmosphere), so every band is stretched to
//! [0, 1] independently before any comparison.

use ndarray::Axis;
use terradelta_core::{MultiBandRaster, RasterElement};

use crate::maybe_rayon::*;

/// Minimum and maximum of one band over its valid (non-NaN) cells.
///
/// `None` when the band has no valid cells at all.
pub fn band_ranges(raster: &MultiBandRaster<f64>) -> Vec<Option<(f64, f64)>> {
    (0..raster.bands())
        .into_par_iter()
        .map(|b| {
            raster.band(b).and_then(|band| {
                band.iter()
                    .filter(|v| !v.is_nan())
                    .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                        None => Some((v, v)),
                        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                    })
            })
        })
        .collect()
}

/// Rescale every band of `raster` linearly to [0, 1].
///
/// For each band, `(v - min) / (max - min)`. A constant band (max == min)
/// is copied through unchanged rather than divided by zero. No-data cells
/// are NaN in the output and do not take part in the min/max.
///
/// # Arguments
/// * `raster` - Raster in its native numeric type
pub fn normalize<T: RasterElement>(raster: &MultiBandRaster<T>) -> MultiBandRaster<f64> {
    let source = raster.to_f64();
    let ranges = band_ranges(&source);
    let mut data = source.view().to_owned();

    for (mut band, range) in data.axis_iter_mut(Axis(0)).zip(ranges) {
        if let Some((min, max)) = range {
            if max > min {
                let span = max - min;
                band.mapv_inplace(|v| (v - min) / span);
            }
        }
    }

    MultiBandRaster::from_array(data)
        .with_transform(*source.transform())
        .with_nodata(source.nodata())
}
