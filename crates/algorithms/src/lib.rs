//! # terradelta algorithms
//!
//! Pairwise change detection between two co-registered rasters.
//!
//! ## Modules
//!
//! - **normalize**: per-band min-max stretch to [0, 1]
//! - **difference**: absolute, ratio and log-ratio difference maps
//! - **morphology**: binary erosion/dilation and mask cleanup
//! - **detection**: threshold, Otsu and change vector detectors, `detect`
//! - **vegetation**: vegetation index and loss/gain classification
//! - **regions**: connected-component labeling and change statistics
//! - **insight**: severity class of a change percentage
//! - **overlay**: RGB preview of a mask over the later raster

pub mod detection;
pub mod difference;
pub mod insight;
pub(crate) mod maybe_rayon;
pub mod morphology;
pub mod normalize;
pub mod overlay;
pub mod regions;
pub mod vegetation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::detection::{
        change_vector_detection, change_vector_magnitude, detect, otsu_detection,
        threshold_detection, AutoThresholdDetector, ChangeVectorDetector, ChangeVectorParams,
        DetectionMethod, DetectionOutcome, DetectionRequest, OtsuParams, OtsuThreshold,
        ThresholdDetector, ThresholdParams,
    };
    pub use crate::difference::{difference, DifferenceMethod};
    pub use crate::insight::ChangeSeverity;
    pub use crate::morphology::{clean, open, CleanupMode, CleanupParams, NoiseSuppressor};
    pub use crate::normalize::normalize;
    pub use crate::overlay::change_overlay;
    pub use crate::regions::{label_regions, summarize, ChangeStatistics, RegionLabels};
    pub use crate::vegetation::{
        vegetation_change, vegetation_index, VegetationChange, VegetationOutcome,
        VegetationParams, VegetationSummary,
    };
    pub use terradelta_core::prelude::*;
}
