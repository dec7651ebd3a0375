//! Binary morphology for change masks
//!
//! - **Erosion**: a pixel survives only if the whole element fits inside the region
//! - **Dilation**: a pixel is set if the element touches the region
//! - **Opening**: erosion then dilation (removes isolated speckle)
//! - **Closing**: dilation then erosion (fills pinholes and narrow gaps)
//! - **Cleanup**: the noise-suppression passes applied by the detectors

mod cleanup;
mod closing;
mod dilate;
mod element;
mod erode;
mod opening;

pub use cleanup::{clean, open, CleanupMode, CleanupParams, NoiseSuppressor};
pub use closing::closing;
pub use dilate::dilate;
pub use element::StructuringElement;
pub use erode::erode;
pub use opening::opening;
