//! Single-band difference maps between two acquisitions
//!
//! Both rasters are normalized independently, compared band by band with the
//! selected metric, and the per-band results are averaged into one value per
//! pixel.

use std::fmt;
use std::str::FromStr;

use terradelta_core::{Error, MultiBandRaster, Raster, RasterElement, Result};

use crate::maybe_rayon::*;
use crate::normalize::normalize;

/// Guard against division by zero and `ln(0)`
pub const EPSILON: f64 = 1e-10;

/// Per-band comparison metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceMethod {
    /// `|after - before|`
    #[default]
    Absolute,
    /// `after / (before + ε)`
    Ratio,
    /// `ln((after + ε) / (before + ε))`
    LogRatio,
}

impl DifferenceMethod {
    /// Apply the metric to one normalized sample pair
    #[inline]
    pub fn apply(self, before: f64, after: f64) -> f64 {
        match self {
            DifferenceMethod::Absolute => (after - before).abs(),
            DifferenceMethod::Ratio => after / (before + EPSILON),
            DifferenceMethod::LogRatio => ((after + EPSILON) / (before + EPSILON)).ln(),
        }
    }

    /// Canonical name, as accepted by `FromStr`
    pub fn as_str(self) -> &'static str {
        match self {
            DifferenceMethod::Absolute => "absolute",
            DifferenceMethod::Ratio => "ratio",
            DifferenceMethod::LogRatio => "log_ratio",
        }
    }
}

impl fmt::Display for DifferenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifferenceMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "absolute" | "abs" => Ok(DifferenceMethod::Absolute),
            "ratio" => Ok(DifferenceMethod::Ratio),
            "log_ratio" | "log-ratio" | "logratio" => Ok(DifferenceMethod::LogRatio),
            _ => Err(Error::UnsupportedMethod {
                kind: "difference",
                name: s.to_string(),
            }),
        }
    }
}

/// Number of bands two rasters can be compared on.
///
/// Only the leading bands common to both take part; a mismatch is logged
/// but not fatal. Fails when either raster has no bands.
pub(crate) fn common_bands<A, B>(before: &MultiBandRaster<A>, after: &MultiBandRaster<B>) -> Result<usize>
where
    A: RasterElement,
    B: RasterElement,
{
    let bands = before.bands().min(after.bands());
    if bands == 0 {
        return Err(Error::InvalidDimensions {
            bands: 0,
            width: before.cols(),
            height: before.rows(),
        });
    }
    if before.bands() != after.bands() {
        tracing::warn!(
            before = before.bands(),
            after = after.bands(),
            compared = bands,
            "band counts differ, comparing common leading bands only"
        );
    }
    Ok(bands)
}

/// Compute the band-averaged difference map of two co-registered rasters.
///
/// # Arguments
/// * `before` - Raster at time T1
/// * `after` - Raster at time T2, same row/column extent
/// * `method` - Per-band comparison metric
///
/// # Errors
/// `ShapeMismatch` when the extents differ; `InvalidDimensions` when either
/// raster has no bands.
pub fn difference<A, B>(
    before: &MultiBandRaster<A>,
    after: &MultiBandRaster<B>,
    method: DifferenceMethod,
) -> Result<Raster<f64>>
where
    A: RasterElement,
    B: RasterElement,
{
    before.check_same_extent(after)?;
    let bands = common_bands(before, after)?;

    let before_n = normalize(before);
    let after_n = normalize(after);
    let (rows, cols) = before.shape();
    let before_v = before_n.view();
    let after_v = after_n.view();

    let data = collect_rows(rows, cols, |row, col| {
        let sum: f64 = (0..bands)
            .map(|b| method.apply(before_v[(b, row, col)], after_v[(b, row, col)]))
            .sum();
        sum / bands as f64
    });

    let raster = Raster::from_vec(data, rows, cols)?.with_transform(*before.transform());
    tracing::debug!(%method, bands, rows, cols, "difference map computed");
    Ok(raster)
}
