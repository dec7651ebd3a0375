//! Binary dilation
//!
//! A pixel becomes set if any in-grid cell under the structuring element is
//! set. Cells beyond the grid edge count as unset.

use terradelta_core::ChangeMask;

use super::element::StructuringElement;
use super::erode::rebuild;
use crate::maybe_rayon::*;

/// Dilate a change mask with the given structuring element
///
/// # Arguments
/// * `mask` - Binary input mask
/// * `element` - Structuring element defining the neighborhood shape
pub fn dilate(mask: &ChangeMask, element: &StructuringElement) -> ChangeMask {
    let (rows, cols) = mask.shape();
    let offsets = element.offsets();
    let view = mask.view();

    let flags = collect_rows(rows, cols, |row, col| {
        offsets.iter().any(|&(dr, dc)| {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            nr >= 0
                && nc >= 0
                && nr < rows as isize
                && nc < cols as isize
                && view[(nr as usize, nc as usize)] != 0
        })
    });

    rebuild(mask, flags)
}
