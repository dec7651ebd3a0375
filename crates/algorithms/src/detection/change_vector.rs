//! Change vector analysis
//!
//! Each pixel's normalized band values form a vector; the length of the
//! difference vector between the two dates is the change intensity. Only
//! an opening is applied afterwards so neighbouring change vectors with
//! different directions are not merged into one region.

use terradelta_core::{Algorithm, ChangeMask, Error, MultiBandRaster, Raster, RasterElement, Result};
use tracing::debug;

use crate::difference::common_bands;
use crate::maybe_rayon::*;
use crate::morphology::open;
use crate::normalize::normalize;

/// Parameters for change vector detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeVectorParams {
    /// Cut-off on the change magnitude; non-negative
    pub threshold: f64,
    /// Disk radius for the opening
    pub radius: usize,
}

impl Default for ChangeVectorParams {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            radius: 2,
        }
    }
}

impl ChangeVectorParams {
    /// Reject non-finite or negative thresholds
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::InvalidParameter {
                name: "threshold",
                value: self.threshold.to_string(),
                reason: "must be finite and non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Change vector detector
#[derive(Debug, Clone, Default)]
pub struct ChangeVectorDetector;

impl Algorithm for ChangeVectorDetector {
    type Input = (MultiBandRaster<f64>, MultiBandRaster<f64>);
    type Output = ChangeMask;
    type Params = ChangeVectorParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ChangeVectorDetector"
    }

    fn description(&self) -> &'static str {
        "Changed where the Euclidean norm of the per-band difference exceeds a threshold"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (before, after) = input;
        change_vector_detection(&before, &after, &params)
    }
}

/// Per-pixel magnitude `sqrt(Σ_band (after_n - before_n)²)` of normalized rasters.
///
/// When band counts differ only the common leading bands contribute.
pub fn change_vector_magnitude<A, B>(
    before: &MultiBandRaster<A>,
    after: &MultiBandRaster<B>,
) -> Result<Raster<f64>>
where
    A: RasterElement,
    B: RasterElement,
{
    before.check_same_extent(after)?;
    let bands = common_bands(before, after)?;

    let before_n = normalize(before);
    let after_n = normalize(after);
    let before_v = before_n.view();
    let after_v = after_n.view();
    let (rows, cols) = before.shape();

    let data = collect_rows(rows, cols, |row, col| {
        (0..bands)
            .map(|b| {
                let d = after_v[(b, row, col)] - before_v[(b, row, col)];
                d * d
            })
            .sum::<f64>()
            .sqrt()
    });

    Ok(Raster::from_vec(data, rows, cols)?.with_transform(*before.transform()))
}

/// Mark pixels whose change magnitude exceeds `params.threshold`, then open.
pub fn change_vector_detection<A, B>(
    before: &MultiBandRaster<A>,
    after: &MultiBandRaster<B>,
    params: &ChangeVectorParams,
) -> Result<ChangeMask>
where
    A: RasterElement,
    B: RasterElement,
{
    params.validate()?;
    let magnitude = change_vector_magnitude(before, after)?;

    let threshold = params.threshold;
    let raw = ChangeMask::from_predicate(magnitude.view(), |&m| m > threshold)
        .with_transform(*magnitude.transform());
    debug!(threshold, raw_changed = raw.changed_count(), "change vector threshold applied");

    Ok(open(&raw, params.radius))
}
