//! Binary closing (dilation followed by erosion)
//!
//! Fills pinholes and narrow gaps inside change regions.

use terradelta_core::ChangeMask;

use super::dilate::dilate;
use super::element::StructuringElement;
use super::erode::erode;

/// Perform binary closing on a change mask
pub fn closing(mask: &ChangeMask, element: &StructuringElement) -> ChangeMask {
    let dilated = dilate(mask, element);
    erode(&dilated, element)
}
