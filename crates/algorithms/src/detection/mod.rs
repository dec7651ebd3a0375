//! Change detectors and the unified `detect` entry point
//!
//! - **threshold**: fixed cut-off on the absolute difference map
//! - **otsu**: histogram-derived cut-off on the 8-bit difference map
//! - **cvd**: change vector magnitude across all bands
//! - **vegetation**: loss mask from the vegetation index change

mod change_vector;
mod otsu;
mod threshold;

pub use change_vector::{
    change_vector_detection, change_vector_magnitude, ChangeVectorDetector, ChangeVectorParams,
};
pub use otsu::{
    otsu_detection, otsu_threshold, scale_to_u8, AutoThresholdDetector, OtsuDetection, OtsuParams,
    OtsuThreshold,
};
pub use threshold::{threshold_detection, ThresholdDetector, ThresholdParams};

use std::fmt;
use std::str::FromStr;

use terradelta_core::{ChangeMask, Error, MultiBandRaster, RasterElement, Result};
use tracing::{debug, info, warn};

use crate::regions::{summarize, ChangeStatistics};
use crate::vegetation::{vegetation_change, VegetationChange, VegetationOutcome, VegetationParams};

/// Detection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionMethod {
    #[default]
    Threshold,
    Otsu,
    ChangeVector,
    Vegetation,
}

impl DetectionMethod {
    /// Canonical name, as accepted by `FromStr`
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMethod::Threshold => "threshold",
            DetectionMethod::Otsu => "otsu",
            DetectionMethod::ChangeVector => "cvd",
            DetectionMethod::Vegetation => "vegetation",
        }
    }

    /// Threshold used when the request does not set one
    pub fn default_threshold(self) -> Option<f64> {
        match self {
            DetectionMethod::Threshold => Some(ThresholdParams::default().threshold),
            DetectionMethod::ChangeVector => Some(ChangeVectorParams::default().threshold),
            DetectionMethod::Otsu | DetectionMethod::Vegetation => None,
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "threshold" => Ok(DetectionMethod::Threshold),
            "otsu" => Ok(DetectionMethod::Otsu),
            "cvd" | "cva" | "change_vector" => Ok(DetectionMethod::ChangeVector),
            "vegetation" | "ndvi" => Ok(DetectionMethod::Vegetation),
            _ => Err(Error::UnsupportedMethod {
                kind: "detection",
                name: s.to_string(),
            }),
        }
    }
}

/// Method plus every knob any method understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionRequest {
    pub method: DetectionMethod,
    /// Overrides the method's default threshold (threshold and cvd only).
    /// Otsu picks its own level and vegetation uses its limits, so both
    /// ignore this with a warning.
    pub threshold: Option<f64>,
    /// Cleanup disk radius (all methods except vegetation)
    pub radius: usize,
    pub vegetation: VegetationParams,
}

impl Default for DetectionRequest {
    fn default() -> Self {
        Self {
            method: DetectionMethod::default(),
            threshold: None,
            radius: 2,
            vegetation: VegetationParams::default(),
        }
    }
}

impl DetectionRequest {
    pub fn new(method: DetectionMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_vegetation(mut self, vegetation: VegetationParams) -> Self {
        self.vegetation = vegetation;
        self
    }
}

/// Mask produced by one detector run, with method-specific extras
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub method: DetectionMethod,
    /// Changed pixels; vegetation loss for the vegetation method
    pub mask: ChangeMask,
    /// Threshold actually applied (threshold and cvd)
    pub threshold: Option<f64>,
    /// Level selected by the otsu method
    pub otsu: Option<OtsuThreshold>,
    /// Full vegetation analysis for the vegetation method
    pub vegetation: Option<VegetationOutcome<VegetationChange>>,
}

impl DetectionOutcome {
    /// True when the vegetation method could not find its bands
    pub fn vegetation_unavailable(&self) -> bool {
        matches!(self.vegetation, Some(VegetationOutcome::Unavailable { .. }))
    }

    /// Region statistics of the mask
    pub fn statistics(&self) -> ChangeStatistics {
        summarize(&self.mask)
    }
}

/// Run the requested detector on a raster pair.
///
/// # Errors
/// `ShapeMismatch` when the extents differ (checked before anything else),
/// `InvalidParameter` for an out-of-range threshold or vegetation limits.
pub fn detect<A, B>(
    before: &MultiBandRaster<A>,
    after: &MultiBandRaster<B>,
    request: &DetectionRequest,
) -> Result<DetectionOutcome>
where
    A: RasterElement,
    B: RasterElement,
{
    before.check_same_extent(after)?;

    let method = request.method;
    if let (Some(ignored), None) = (request.threshold, method.default_threshold()) {
        warn!(%method, threshold = ignored, "method does not take a threshold, ignoring it");
    }
    let threshold = request.threshold.or(method.default_threshold());
    info!(%method, ?threshold, radius = request.radius, "running change detection");

    let mut outcome = DetectionOutcome {
        method,
        mask: ChangeMask::zeros(before.rows(), before.cols()).with_transform(*before.transform()),
        threshold: None,
        otsu: None,
        vegetation: None,
    };

    match method {
        DetectionMethod::Threshold => {
            let params = ThresholdParams {
                threshold: threshold.unwrap_or(ThresholdParams::default().threshold),
                radius: request.radius,
            };
            outcome.mask = threshold_detection(before, after, &params)?;
            outcome.threshold = Some(params.threshold);
        }
        DetectionMethod::Otsu => {
            let result = otsu_detection(before, after, &OtsuParams { radius: request.radius })?;
            outcome.mask = result.mask;
            outcome.otsu = Some(result.threshold);
        }
        DetectionMethod::ChangeVector => {
            let params = ChangeVectorParams {
                threshold: threshold.unwrap_or(ChangeVectorParams::default().threshold),
                radius: request.radius,
            };
            outcome.mask = change_vector_detection(before, after, &params)?;
            outcome.threshold = Some(params.threshold);
        }
        DetectionMethod::Vegetation => {
            let result = vegetation_change(before, after, &request.vegetation)?;
            if let VegetationOutcome::Available(change) = &result {
                outcome.mask = change.loss_mask.clone();
            }
            outcome.vegetation = Some(result);
        }
    }

    debug!(%method, changed = outcome.mask.changed_count(), "detection finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_method_parsing() {
        assert_eq!("threshold".parse::<DetectionMethod>().unwrap(), DetectionMethod::Threshold);
        assert_eq!("OTSU".parse::<DetectionMethod>().unwrap(), DetectionMethod::Otsu);
        assert_eq!("cvd".parse::<DetectionMethod>().unwrap(), DetectionMethod::ChangeVector);
        assert_eq!("vegetation".parse::<DetectionMethod>().unwrap(), DetectionMethod::Vegetation);
        assert!(matches!(
            "kmeans".parse::<DetectionMethod>(),
            Err(Error::UnsupportedMethod { kind: "detection", .. })
        ));
        for m in [
            DetectionMethod::Threshold,
            DetectionMethod::Otsu,
            DetectionMethod::ChangeVector,
            DetectionMethod::Vegetation,
        ] {
            assert_eq!(m.to_string().parse::<DetectionMethod>().unwrap(), m);
        }
    }

    #[test]
    fn test_shape_checked_first() {
        let a: MultiBandRaster<f64> = MultiBandRaster::filled(1, 4, 4, 0.0);
        let b: MultiBandRaster<f64> = MultiBandRaster::filled(1, 5, 4, 0.0);
        // Invalid threshold would also fail, but the shape wins
        let request = DetectionRequest::new(DetectionMethod::Threshold).with_threshold(7.0);
        assert!(matches!(detect(&a, &b, &request), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_default_thresholds_reported() {
        let a: MultiBandRaster<f64> = MultiBandRaster::filled(1, 4, 4, 0.0);
        let t = detect(&a, &a, &DetectionRequest::new(DetectionMethod::Threshold)).unwrap();
        assert_eq!(t.threshold, Some(0.15));
        let c = detect(&a, &a, &DetectionRequest::new(DetectionMethod::ChangeVector)).unwrap();
        assert_eq!(c.threshold, Some(0.1));
        let o = detect(&a, &a, &DetectionRequest::new(DetectionMethod::Otsu)).unwrap();
        assert_eq!(o.otsu, Some(OtsuThreshold::Degenerate));
        assert_eq!(o.mask.changed_count(), 0);
    }

    #[test]
    fn test_threshold_ignored_by_self_thresholding_methods() {
        let a: MultiBandRaster<f64> = MultiBandRaster::filled(2, 4, 4, 0.5);
        for method in [DetectionMethod::Otsu, DetectionMethod::Vegetation] {
            let plain = detect(&a, &a, &DetectionRequest::new(method)).unwrap();
            let with = detect(&a, &a, &DetectionRequest::new(method).with_threshold(0.9)).unwrap();
            assert_eq!(with.threshold, None);
            assert_eq!(with.mask, plain.mask);
        }
    }

    #[test]
    fn test_vegetation_unavailable_yields_empty_mask() {
        let a: MultiBandRaster<f64> = MultiBandRaster::filled(1, 4, 4, 0.5);
        let outcome = detect(&a, &a, &DetectionRequest::new(DetectionMethod::Vegetation)).unwrap();
        assert!(outcome.vegetation_unavailable());
        assert_eq!(outcome.mask.changed_count(), 0);
        assert_eq!(outcome.statistics().total_pixels, 16);
    }

    #[test]
    fn test_vegetation_mask_is_loss() {
        let before = MultiBandRaster::from_bands(&[
            array![[10.0, 50.0]],
            array![[90.0, 50.0]],
        ])
        .unwrap();
        let after = MultiBandRaster::from_bands(&[
            array![[50.0, 10.0]],
            array![[50.0, 90.0]],
        ])
        .unwrap();
        let outcome = detect(&before, &after, &DetectionRequest::new(DetectionMethod::Vegetation)).unwrap();
        assert!(!outcome.vegetation_unavailable());
        assert!(outcome.mask.is_changed(0, 0));
        assert!(!outcome.mask.is_changed(0, 1));
    }

    #[test]
    fn test_statistics_of_detected_block() {
        let before: MultiBandRaster<f64> = MultiBandRaster::filled(1, 16, 16, 0.0);
        let after_band = Array2::from_shape_fn((16, 16), |(r, c)| if r < 6 && c < 6 { 1.0 } else { 0.0 });
        let after = MultiBandRaster::from_bands(&[after_band]).unwrap();
        let outcome = detect(&before, &after, &DetectionRequest::default()).unwrap();
        let stats = outcome.statistics();
        assert_eq!(stats.num_change_regions, 1);
        assert_eq!(stats.changed_pixels + stats.unchanged_pixels, 256);
    }
}
