//! Multi-band raster as delivered by the loader

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

/// An immutable multi-band image indexed `(band, row, col)`.
///
/// All bands share one pixel grid, one geotransform and one no-data value.
/// There are no mutating accessors: derived products (normalized stacks,
/// difference maps, masks) are always new values.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiBandRaster<T: RasterElement> {
    data: Array3<T>,
    transform: GeoTransform,
    nodata: Option<T>,
}

impl<T: RasterElement> MultiBandRaster<T> {
    /// Wrap a `(band, row, col)` array
    pub fn from_array(data: Array3<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Build from band-sequential data (`bands * rows * cols` values)
    pub fn from_vec(data: Vec<T>, bands: usize, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != bands * rows * cols {
            return Err(Error::InvalidDimensions {
                bands,
                width: cols,
                height: rows,
            });
        }
        let array = Array3::from_shape_vec((bands, rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Stack single-band grids; every band must share the first band's extent
    pub fn from_bands(bands: &[Array2<T>]) -> Result<Self> {
        let first = bands.first().ok_or(Error::InvalidDimensions {
            bands: 0,
            width: 0,
            height: 0,
        })?;
        let (rows, cols) = first.dim();
        if let Some(bad) = bands.iter().find(|b| b.dim() != (rows, cols)) {
            return Err(Error::shape_mismatch((rows, cols), bad.dim()));
        }
        let views: Vec<ArrayView2<'_, T>> = bands.iter().map(|b| b.view()).collect();
        let data = ndarray::stack(Axis(0), &views).map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(data))
    }

    /// Every band of every pixel set to `value`
    pub fn filled(bands: usize, rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array3::from_elem((bands, rows, cols), value))
    }

    /// Replace the geotransform, builder style
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Replace the no-data value, builder style
    pub fn with_nodata(mut self, nodata: Option<T>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Number of bands
    pub fn bands(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Number of rows (height)
    pub fn rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Number of columns (width)
    pub fn cols(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Pixel grid extent as (rows, cols), independent of band count
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Pixels per band
    pub fn pixel_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// View of one band, or `None` past the last band
    pub fn band(&self, index: usize) -> Option<ArrayView2<'_, T>> {
        (index < self.bands()).then(|| self.data.index_axis(Axis(0), index))
    }

    /// View of the full `(band, row, col)` cube
    pub fn view(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Numeric type name of the cells
    pub fn dtype_name(&self) -> &'static str {
        T::dtype_name()
    }

    /// Convert every cell to `f64`; no-data cells (and unrepresentable values) become NaN
    pub fn to_f64(&self) -> MultiBandRaster<f64> {
        let nodata = self.nodata;
        let data = self.data.mapv(|v| {
            if v.is_nodata(nodata) {
                f64::NAN
            } else {
                v.as_f64().unwrap_or(f64::NAN)
            }
        });
        MultiBandRaster {
            data,
            transform: self.transform,
            nodata: nodata.map(|_| f64::NAN),
        }
    }

    /// Fail with `ShapeMismatch` unless `other` covers the same pixel grid
    pub fn check_same_extent<U: RasterElement>(&self, other: &MultiBandRaster<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        Ok(())
    }
}
