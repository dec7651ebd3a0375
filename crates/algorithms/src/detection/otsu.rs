//! Automatic threshold selection with Otsu's method
//!
//! The absolute difference map is quantized to 8 bits and the cut-off is
//! the histogram split that maximizes between-class variance.

use ndarray::Array2;
use serde::Serialize;
use terradelta_core::{Algorithm, ChangeMask, Error, MultiBandRaster, Raster, RasterElement, Result};
use tracing::{debug, warn};

use crate::difference::{difference, DifferenceMethod};
use crate::morphology::clean;

/// Result of Otsu threshold selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OtsuThreshold {
    /// Pixels strictly above this 8-bit level are changed
    Selected(u8),
    /// The image holds a single level; no split exists
    Degenerate,
}

impl OtsuThreshold {
    /// The selected level, if any
    pub fn level(&self) -> Option<u8> {
        match self {
            OtsuThreshold::Selected(t) => Some(*t),
            OtsuThreshold::Degenerate => None,
        }
    }
}

/// Parameters for Otsu detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtsuParams {
    /// Disk radius for cleanup
    pub radius: usize,
}

impl Default for OtsuParams {
    fn default() -> Self {
        Self { radius: 2 }
    }
}

/// Mask plus the level that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct OtsuDetection {
    pub mask: ChangeMask,
    pub threshold: OtsuThreshold,
}

/// Otsu detector
#[derive(Debug, Clone, Default)]
pub struct AutoThresholdDetector;

impl Algorithm for AutoThresholdDetector {
    type Input = (MultiBandRaster<f64>, MultiBandRaster<f64>);
    type Output = OtsuDetection;
    type Params = OtsuParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "AutoThresholdDetector"
    }

    fn description(&self) -> &'static str {
        "Changed where the 8-bit difference exceeds the Otsu threshold"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (before, after) = input;
        otsu_detection(&before, &after, &params)
    }
}

/// Quantize a difference map to 8 bits: `floor(clamp(d, 0, 1) * 255)`.
///
/// NaN cells map to 0.
pub fn scale_to_u8(diff: &Raster<f64>) -> Array2<u8> {
    diff.data().mapv(|d| {
        if d.is_nan() {
            0
        } else {
            (d.clamp(0.0, 1.0) * 255.0).floor() as u8
        }
    })
}

/// Select a threshold over 8-bit values.
///
/// The histogram spans `min..=max` of the values with one bin per integer
/// level. For every split `i` the between-class variance is
/// `w0(i) * w1(i+1) * (m0(i) - m1(i+1))^2`, where `w0`/`m0` are the count and
/// mean of levels up to bin `i` and `w1`/`m1` those from bin `i+1` on. The
/// first maximizing bin wins.
pub fn otsu_threshold<'a, I>(values: I) -> OtsuThreshold
where
    I: IntoIterator<Item = &'a u8>,
{
    let mut counts = [0u64; 256];
    for &v in values {
        counts[v as usize] += 1;
    }

    let Some(min) = counts.iter().position(|&c| c > 0) else {
        return OtsuThreshold::Degenerate;
    };
    let max = counts.iter().rposition(|&c| c > 0).unwrap_or(min);
    if min == max {
        return OtsuThreshold::Degenerate;
    }

    let hist: Vec<f64> = counts[min..=max].iter().map(|&c| c as f64).collect();
    let levels: Vec<f64> = (min..=max).map(|l| l as f64).collect();
    let n = hist.len();

    // Cumulative weights and means from the low end...
    let mut w0 = vec![0.0; n];
    let mut m0 = vec![0.0; n];
    let (mut w, mut s) = (0.0, 0.0);
    for i in 0..n {
        w += hist[i];
        s += hist[i] * levels[i];
        w0[i] = w;
        m0[i] = if w > 0.0 { s / w } else { 0.0 };
    }

    // ...and from the high end
    let mut w1 = vec![0.0; n];
    let mut m1 = vec![0.0; n];
    let (mut w, mut s) = (0.0, 0.0);
    for i in (0..n).rev() {
        w += hist[i];
        s += hist[i] * levels[i];
        w1[i] = w;
        m1[i] = if w > 0.0 { s / w } else { 0.0 };
    }

    let mut best = 0;
    let mut best_var = f64::NEG_INFINITY;
    for i in 0..n - 1 {
        let delta = m0[i] - m1[i + 1];
        let var = w0[i] * w1[i + 1] * delta * delta;
        if var > best_var {
            best_var = var;
            best = i;
        }
    }

    OtsuThreshold::Selected((min + best) as u8)
}

/// Otsu-thresholded change mask with opening and closing cleanup.
///
/// A constant difference image is not an error: the mask comes back all
/// unchanged with [`OtsuThreshold::Degenerate`].
pub fn otsu_detection<A, B>(
    before: &MultiBandRaster<A>,
    after: &MultiBandRaster<B>,
    params: &OtsuParams,
) -> Result<OtsuDetection>
where
    A: RasterElement,
    B: RasterElement,
{
    let diff = difference(before, after, DifferenceMethod::Absolute)?;
    let scaled = scale_to_u8(&diff);
    let threshold = otsu_threshold(scaled.iter());

    let mask = match threshold {
        OtsuThreshold::Selected(t) => {
            debug!(threshold = t, "otsu threshold selected");
            let raw = ChangeMask::from_predicate(scaled.view(), |&v| v > t)
                .with_transform(*diff.transform());
            clean(&raw, params.radius)
        }
        OtsuThreshold::Degenerate => {
            warn!("difference image has a single level, reporting no change");
            ChangeMask::zeros(diff.rows(), diff.cols()).with_transform(*diff.transform())
        }
    };

    Ok(OtsuDetection { mask, threshold })
}
