//! Binary erosion
//!
//! A pixel stays set only if every in-grid cell under the structuring
//! element is set. Cells beyond the grid edge count as set, so a region
//! touching the border is not eaten away by the border itself.

use terradelta_core::ChangeMask;

use super::element::StructuringElement;
use crate::maybe_rayon::*;

/// Erode a change mask with the given structuring element
///
/// # Arguments
/// * `mask` - Binary input mask
/// * `element` - Structuring element defining the neighborhood shape
pub fn erode(mask: &ChangeMask, element: &StructuringElement) -> ChangeMask {
    let (rows, cols) = mask.shape();
    let offsets = element.offsets();
    let view = mask.view();

    let flags = collect_rows(rows, cols, |row, col| {
        if view[(row, col)] == 0 {
            return false;
        }
        offsets.iter().all(|&(dr, dc)| {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                return true;
            }
            view[(nr as usize, nc as usize)] != 0
        })
    });

    rebuild(mask, flags)
}

/// Re-wrap row-major flags in the extent and transform of `template`
pub(super) fn rebuild(template: &ChangeMask, flags: Vec<bool>) -> ChangeMask {
    let (rows, cols) = template.shape();
    let grid = ndarray::Array2::from_shape_fn((rows, cols), |(r, c)| flags[r * cols + c]);
    ChangeMask::from_bools(&grid).with_transform(*template.transform())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn block_mask(size: usize, r0: usize, r1: usize, c0: usize, c1: usize) -> ChangeMask {
        let grid = Array2::from_shape_fn((size, size), |(r, c)| {
            (r0..r1).contains(&r) && (c0..c1).contains(&c)
        });
        ChangeMask::from_bools(&grid)
    }

    #[test]
    fn test_erode_removes_single_pixel() {
        let mask = block_mask(7, 3, 4, 3, 4);
        let result = erode(&mask, &StructuringElement::Disk(1));
        assert_eq!(result.changed_count(), 0);
    }

    #[test]
    fn test_erode_shrinks_block() {
        let mask = block_mask(9, 2, 7, 2, 7);
        let result = erode(&mask, &StructuringElement::Disk(1));
        // 5x5 block shrinks to its 3x3 interior
        assert_eq!(result.changed_count(), 9);
        assert!(result.is_changed(4, 4));
        assert!(!result.is_changed(2, 2));
    }

    #[test]
    fn test_border_counts_as_set() {
        let full = ChangeMask::from_bools(&Array2::from_elem((4, 4), true));
        let result = erode(&full, &StructuringElement::Disk(2));
        assert_eq!(result.changed_count(), 16);
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let mask = block_mask(5, 1, 2, 1, 4);
        assert_eq!(erode(&mask, &StructuringElement::Disk(0)), mask);
    }
}
