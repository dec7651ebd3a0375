//! Binary change mask

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use ndarray::{Array2, ArrayView2, Zip};

/// Value stored for a changed pixel
pub const CHANGED: u8 = 1;
/// Value stored for an unchanged pixel
pub const UNCHANGED: u8 = 0;

/// A binary per-pixel change flag.
///
/// Every cell is exactly [`CHANGED`] or [`UNCHANGED`]; the constructors are
/// the only way to build one, so downstream code never has to re-check.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeMask {
    raster: Raster<u8>,
}

impl ChangeMask {
    /// All-unchanged mask of the given extent
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            raster: Raster::new(rows, cols),
        }
    }

    /// Mask from a boolean grid (`true` = changed)
    pub fn from_bools(flags: &Array2<bool>) -> Self {
        Self {
            raster: Raster::from_array(flags.mapv(|f| if f { CHANGED } else { UNCHANGED })),
        }
    }

    /// Mask marking every cell of `values` for which `predicate` holds
    pub fn from_predicate<T, F>(values: ArrayView2<'_, T>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool,
    {
        let mut data = Array2::zeros(values.dim());
        Zip::from(&mut data).and(&values).for_each(|out, v| {
            if predicate(v) {
                *out = CHANGED;
            }
        });
        Self {
            raster: Raster::from_array(data),
        }
    }

    /// Adopt an existing `u8` raster, rejecting any cell that is not 0 or 1
    pub fn try_from_raster(raster: Raster<u8>) -> Result<Self> {
        if let Some(&bad) = raster.data().iter().find(|&&v| v > CHANGED) {
            return Err(Error::InvalidParameter {
                name: "mask",
                value: bad.to_string(),
                reason: "change mask cells must be 0 or 1".to_string(),
            });
        }
        Ok(Self { raster })
    }

    /// Replace the geotransform, builder style
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.raster.set_transform(transform);
        self
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.raster.rows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.raster.cols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.raster.shape()
    }

    /// Total number of pixels
    pub fn len(&self) -> usize {
        self.raster.len()
    }

    /// Whether the mask has no pixels at all
    pub fn is_empty(&self) -> bool {
        self.raster.is_empty()
    }

    /// Whether (row, col) is marked as changed; out-of-range cells are unchanged
    pub fn is_changed(&self, row: usize, col: usize) -> bool {
        self.raster.get(row, col).is_ok_and(|v| v == CHANGED)
    }

    /// Count of changed pixels
    pub fn changed_count(&self) -> usize {
        self.raster.data().iter().filter(|&&v| v == CHANGED).count()
    }

    /// Read-only view of the 0/1 cells
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.raster.view()
    }

    /// Borrow as a plain raster (for writing to disk)
    pub fn as_raster(&self) -> &Raster<u8> {
        &self.raster
    }

    /// Consume into a plain raster
    pub fn into_raster(self) -> Raster<u8> {
        self.raster
    }

    /// Geotransform inherited from the source rasters
    pub fn transform(&self) -> &GeoTransform {
        self.raster.transform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_predicate() {
        let diff = array![[0.0, 0.5], [0.2, 0.9]];
        let mask = ChangeMask::from_predicate(diff.view(), |&d| d > 0.3);
        assert_eq!(mask.view(), array![[0u8, 1], [0, 1]]);
        assert_eq!(mask.changed_count(), 2);
        assert!(mask.is_changed(1, 1));
        assert!(!mask.is_changed(1, 0));
        assert!(!mask.is_changed(5, 5));
    }

    #[test]
    fn test_try_from_raster_rejects_non_binary() {
        let ok = Raster::from_vec(vec![0u8, 1, 1, 0], 2, 2).unwrap();
        assert!(ChangeMask::try_from_raster(ok).is_ok());

        let bad = Raster::from_vec(vec![0u8, 2, 1, 0], 2, 2).unwrap();
        assert!(matches!(
            ChangeMask::try_from_raster(bad),
            Err(Error::InvalidParameter { name: "mask", .. })
        ));
    }

    #[test]
    fn test_zeros_and_bools() {
        assert_eq!(ChangeMask::zeros(3, 4).changed_count(), 0);
        let mask = ChangeMask::from_bools(&array![[true, false, true]]);
        assert_eq!(mask.shape(), (1, 3));
        assert_eq!(mask.changed_count(), 2);
    }
}
