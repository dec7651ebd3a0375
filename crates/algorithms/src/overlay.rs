//! RGB preview of a change mask over the later acquisition

use ndarray::{s, Array3};
use terradelta_core::{ChangeMask, Error, MultiBandRaster, RasterElement, Result};

use crate::normalize::normalize;

/// Colour painted on changed pixels
pub const CHANGE_COLOUR: [f64; 3] = [1.0, 0.0, 0.0];

/// Build a `(rows, cols, 3)` RGB composite of `after` with changes in red.
///
/// The first three normalized bands become R, G and B; a raster with fewer
/// than three bands is shown as grey from band 0.
///
/// # Errors
/// `ShapeMismatch` when the mask and raster extents differ,
/// `InvalidDimensions` for a raster without bands.
pub fn change_overlay<T: RasterElement>(
    after: &MultiBandRaster<T>,
    mask: &ChangeMask,
) -> Result<Array3<f64>> {
    if after.shape() != mask.shape() {
        return Err(Error::shape_mismatch(after.shape(), mask.shape()));
    }
    if after.bands() == 0 {
        return Err(Error::InvalidDimensions {
            bands: 0,
            width: after.cols(),
            height: after.rows(),
        });
    }

    let norm = normalize(after);
    let view = norm.view();
    let sources: [usize; 3] = if norm.bands() >= 3 { [0, 1, 2] } else { [0, 0, 0] };

    let (rows, cols) = norm.shape();
    let mut rgb = Array3::<f64>::zeros((rows, cols, 3));
    for (channel, &band) in sources.iter().enumerate() {
        rgb.slice_mut(s![.., .., channel]).assign(&view.slice(s![band, .., ..]));
    }

    let flags = mask.view();
    for ((row, col), &flag) in flags.indexed_iter() {
        if flag != 0 {
            for (channel, &value) in CHANGE_COLOUR.iter().enumerate() {
                rgb[(row, col, channel)] = value;
            }
        }
    }

    Ok(rgb)
}
