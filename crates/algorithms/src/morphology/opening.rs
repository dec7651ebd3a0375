//! Binary opening (erosion followed by dilation)
//!
//! Removes isolated pixels and thin spurs narrower than the structuring
//! element while keeping the footprint of larger regions.

use terradelta_core::ChangeMask;

use super::dilate::dilate;
use super::element::StructuringElement;
use super::erode::erode;

/// Perform binary opening on a change mask
pub fn opening(mask: &ChangeMask, element: &StructuringElement) -> ChangeMask {
    let eroded = erode(mask, element);
    dilate(&eroded, element)
}
