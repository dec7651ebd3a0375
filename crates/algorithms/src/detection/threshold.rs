//! Fixed-threshold change detection
//!
//! Absolute difference map, a single cut-off, then opening and closing to
//! suppress speckle.

use terradelta_core::{Algorithm, ChangeMask, Error, MultiBandRaster, RasterElement, Result};
use tracing::debug;

use crate::difference::{difference, DifferenceMethod};
use crate::morphology::clean;

/// Parameters for fixed-threshold detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    /// Cut-off on the mean absolute difference, in [0, 1]
    pub threshold: f64,
    /// Disk radius for cleanup
    pub radius: usize,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            radius: 2,
        }
    }
}

impl ThresholdParams {
    /// Reject non-finite thresholds and thresholds outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidParameter {
                name: "threshold",
                value: self.threshold.to_string(),
                reason: "must be a finite value in [0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

/// Fixed-threshold detector
#[derive(Debug, Clone, Default)]
pub struct ThresholdDetector;

impl Algorithm for ThresholdDetector {
    type Input = (MultiBandRaster<f64>, MultiBandRaster<f64>);
    type Output = ChangeMask;
    type Params = ThresholdParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ThresholdDetector"
    }

    fn description(&self) -> &'static str {
        "Changed where the mean absolute normalized difference exceeds a fixed threshold"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (before, after) = input;
        threshold_detection(&before, &after, &params)
    }
}

/// Mark pixels whose absolute difference exceeds `params.threshold`.
///
/// A pixel is changed iff `diff > threshold` (strictly), so raising the
/// threshold never adds changed pixels before cleanup.
///
/// # Errors
/// `InvalidParameter` for a bad threshold, `ShapeMismatch` when the rasters
/// differ in extent.
pub fn threshold_detection<A, B>(
    before: &MultiBandRaster<A>,
    after: &MultiBandRaster<B>,
    params: &ThresholdParams,
) -> Result<ChangeMask>
where
    A: RasterElement,
    B: RasterElement,
{
    params.validate()?;
    let diff = difference(before, after, DifferenceMethod::Absolute)?;

    let threshold = params.threshold;
    let raw = ChangeMask::from_predicate(diff.view(), |&d| d > threshold)
        .with_transform(*diff.transform());
    debug!(threshold, raw_changed = raw.changed_count(), "threshold applied");

    Ok(clean(&raw, params.radius))
}
