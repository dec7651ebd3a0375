//! Noise suppression for binary change masks
//!
//! Detectors threshold a difference image pixel by pixel, which leaves
//! salt-and-pepper speckle behind. These passes remove speckle with a
//! disk-shaped opening and optionally fill pinholes with a closing.

use terradelta_core::{Algorithm, ChangeMask, Error, Result};
use tracing::debug;

use super::closing::closing;
use super::element::StructuringElement;
use super::opening::opening;

/// Which morphological passes to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupMode {
    /// Opening followed by closing
    #[default]
    OpenClose,
    /// Opening only; keeps adjacent regions apart
    OpenOnly,
}

/// Parameters for mask cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupParams {
    /// Disk radius in pixels (0 disables cleanup)
    pub radius: usize,
    pub mode: CleanupMode,
}

impl Default for CleanupParams {
    fn default() -> Self {
        Self {
            radius: 2,
            mode: CleanupMode::OpenClose,
        }
    }
}

impl CleanupParams {
    pub(crate) fn apply(&self, mask: &ChangeMask) -> ChangeMask {
        match self.mode {
            CleanupMode::OpenClose => clean(mask, self.radius),
            CleanupMode::OpenOnly => open(mask, self.radius),
        }
    }
}

/// Noise suppression as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct NoiseSuppressor;

impl Algorithm for NoiseSuppressor {
    type Input = ChangeMask;
    type Output = ChangeMask;
    type Params = CleanupParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "NoiseSuppressor"
    }

    fn description(&self) -> &'static str {
        "Morphological opening (and optionally closing) of a binary change mask"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Ok(params.apply(&input))
    }
}

/// Opening then closing with a disk of the given radius
pub fn clean(mask: &ChangeMask, radius: usize) -> ChangeMask {
    let element = StructuringElement::Disk(radius);
    let opened = opening(mask, &element);
    let cleaned = closing(&opened, &element);
    debug!(
        radius,
        before = mask.changed_count(),
        after = cleaned.changed_count(),
        "mask cleaned (open+close)"
    );
    cleaned
}

/// Opening only with a disk of the given radius
pub fn open(mask: &ChangeMask, radius: usize) -> ChangeMask {
    let opened = opening(mask, &StructuringElement::Disk(radius));
    debug!(
        radius,
        before = mask.changed_count(),
        after = opened.changed_count(),
        "mask cleaned (open)"
    );
    opened
}
