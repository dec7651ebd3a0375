//! Vegetation index change analysis
//!
//! Independent of the difference engine: the normalized difference
//! vegetation index is computed on the raw band values of each date and
//! the index change is split into loss and gain masks.
//!
//! Imagery without a near-infrared band is common, so a missing band is
//! reported as [`VegetationOutcome::Unavailable`] rather than an error.

use serde::Serialize;
use terradelta_core::{ChangeMask, Error, MultiBandRaster, Raster, RasterElement, Result};
use tracing::{debug, warn};

use crate::difference::EPSILON;
use crate::maybe_rayon::*;
use crate::regions::percentage;

/// Band selection and classification limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VegetationParams {
    /// Index of the red band
    pub red_band: usize,
    /// Index of the near-infrared band
    pub nir_band: usize,
    /// Index change below this is loss
    pub loss_threshold: f64,
    /// Index change above this is gain
    pub gain_threshold: f64,
}

impl Default for VegetationParams {
    fn default() -> Self {
        Self {
            red_band: 0,
            nir_band: 1,
            loss_threshold: -0.1,
            gain_threshold: 0.1,
        }
    }
}

impl VegetationParams {
    /// Number of bands a raster needs for these band indices
    pub fn required_bands(&self) -> usize {
        self.red_band.max(self.nir_band) + 1
    }

    /// Limits must be finite with `loss_threshold <= gain_threshold`, so a
    /// pixel can never be both loss and gain.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("loss_threshold", self.loss_threshold),
            ("gain_threshold", self.gain_threshold),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
        if self.loss_threshold > self.gain_threshold {
            return Err(Error::InvalidParameter {
                name: "loss_threshold",
                value: self.loss_threshold.to_string(),
                reason: format!("must not exceed gain_threshold ({})", self.gain_threshold),
            });
        }
        Ok(())
    }
}

/// Either a computed value or the reason it could not be computed
#[derive(Debug, Clone, PartialEq)]
pub enum VegetationOutcome<T> {
    Available(T),
    /// The raster lacks the red or near-infrared band
    Unavailable {
        required_bands: usize,
        available_bands: usize,
    },
}

impl<T> VegetationOutcome<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, VegetationOutcome::Available(_))
    }

    pub fn into_available(self) -> Option<T> {
        match self {
            VegetationOutcome::Available(value) => Some(value),
            VegetationOutcome::Unavailable { .. } => None,
        }
    }
}

/// Index maps and loss/gain classification for a raster pair
#[derive(Debug, Clone, PartialEq)]
pub struct VegetationChange {
    pub index_before: Raster<f64>,
    pub index_after: Raster<f64>,
    /// `index_after - index_before`
    pub index_change: Raster<f64>,
    pub loss_mask: ChangeMask,
    pub gain_mask: ChangeMask,
    pub summary: VegetationSummary,
}

/// Loss/gain pixel counts and their share of the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VegetationSummary {
    pub loss_pixels: usize,
    pub gain_pixels: usize,
    pub loss_percentage: f64,
    pub gain_percentage: f64,
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// `(NIR - RED) / (NIR + RED + ε)` on raw band values.
///
/// Values lie in [-1, 1] for non-negative inputs. No-data cells are NaN.
pub fn vegetation_index<T: RasterElement>(
    raster: &MultiBandRaster<T>,
    red_band: usize,
    nir_band: usize,
) -> VegetationOutcome<Raster<f64>> {
    let required_bands = red_band.max(nir_band) + 1;
    let (Some(red), Some(nir)) = (raster.band(red_band), raster.band(nir_band)) else {
        warn!(
            required_bands,
            available_bands = raster.bands(),
            "not enough bands for a vegetation index"
        );
        return VegetationOutcome::Unavailable {
            required_bands,
            available_bands: raster.bands(),
        };
    };

    let nodata = raster.nodata();
    let (rows, cols) = raster.shape();
    let data = collect_rows(rows, cols, |row, col| {
        let r = red[(row, col)];
        let n = nir[(row, col)];
        if r.is_nodata(nodata) || n.is_nodata(nodata) {
            return f64::NAN;
        }
        match (r.as_f64(), n.as_f64()) {
            (Some(r), Some(n)) => (n - r) / (n + r + EPSILON),
            _ => f64::NAN,
        }
    });

    let grid = ndarray::Array2::from_shape_fn((rows, cols), |(r, c)| data[r * cols + c]);
    let mut index = Raster::from_array(grid).with_transform(*raster.transform());
    index.set_nodata(Some(f64::NAN));
    VegetationOutcome::Available(index)
}

// ---------------------------------------------------------------------------
// Change analysis
// ---------------------------------------------------------------------------

/// Compare the vegetation index of two dates.
///
/// Loss is `change < loss_threshold`, gain is `change > gain_threshold`.
/// Unavailable when either raster lacks one of the selected bands.
///
/// # Errors
/// `ShapeMismatch` for rasters of different extent, `InvalidParameter` for
/// bad limits.
pub fn vegetation_change<A, B>(
    before: &MultiBandRaster<A>,
    after: &MultiBandRaster<B>,
    params: &VegetationParams,
) -> Result<VegetationOutcome<VegetationChange>>
where
    A: RasterElement,
    B: RasterElement,
{
    before.check_same_extent(after)?;
    params.validate()?;

    let index_before = match vegetation_index(before, params.red_band, params.nir_band) {
        VegetationOutcome::Available(index) => index,
        VegetationOutcome::Unavailable {
            required_bands,
            available_bands,
        } => {
            return Ok(VegetationOutcome::Unavailable {
                required_bands,
                available_bands,
            })
        }
    };
    let index_after = match vegetation_index(after, params.red_band, params.nir_band) {
        VegetationOutcome::Available(index) => index,
        VegetationOutcome::Unavailable {
            required_bands,
            available_bands,
        } => {
            return Ok(VegetationOutcome::Unavailable {
                required_bands,
                available_bands,
            })
        }
    };

    let change = index_after.data() - index_before.data();
    let transform = *index_before.transform();

    let loss_mask = ChangeMask::from_predicate(change.view(), |&d| d < params.loss_threshold)
        .with_transform(transform);
    let gain_mask = ChangeMask::from_predicate(change.view(), |&d| d > params.gain_threshold)
        .with_transform(transform);

    let mut index_change = Raster::from_array(change).with_transform(transform);
    index_change.set_nodata(Some(f64::NAN));

    let total = loss_mask.len();
    let summary = VegetationSummary {
        loss_pixels: loss_mask.changed_count(),
        gain_pixels: gain_mask.changed_count(),
        loss_percentage: percentage(loss_mask.changed_count(), total),
        gain_percentage: percentage(gain_mask.changed_count(), total),
    };
    debug!(
        loss = summary.loss_pixels,
        gain = summary.gain_pixels,
        "vegetation change classified"
    );

    Ok(VegetationOutcome::Available(VegetationChange {
        index_before,
        index_after,
        index_change,
        loss_mask,
        gain_mask,
        summary,
    }))
}
