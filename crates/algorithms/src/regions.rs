//! Connected-component analysis of change masks
//!
//! Regions are maximal 4-connected (rook adjacency) groups of changed
//! pixels. Diagonal contact alone does not join two regions.

use std::collections::VecDeque;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use terradelta_core::{ChangeMask, Raster};
use tracing::debug;

use crate::insight::ChangeSeverity;

/// Rook neighbours (N, W, E, S)
const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Label grid plus per-region pixel counts
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLabels {
    /// 0 for unchanged pixels, `1..=count` for regions in scan order of
    /// their first pixel
    pub labels: Raster<u32>,
    /// `sizes[i]` is the pixel count of label `i + 1`
    pub sizes: Vec<usize>,
}

impl RegionLabels {
    /// Number of regions
    pub fn count(&self) -> usize {
        self.sizes.len()
    }
}

/// Summary statistics of one change mask.
///
/// Field names are the serialized keys consumed by reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatistics {
    pub total_pixels: usize,
    pub changed_pixels: usize,
    pub unchanged_pixels: usize,
    /// Percentage in [0, 100]
    pub change_percentage: f64,
    pub num_change_regions: usize,
    pub mean_region_size: f64,
    pub max_region_size: usize,
}

impl ChangeStatistics {
    /// Severity class of the change percentage
    pub fn severity(&self) -> ChangeSeverity {
        ChangeSeverity::from_percentage(self.change_percentage)
    }
}

/// `count / total * 100`, 0 for an empty total
pub(crate) fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Label the 4-connected regions of a mask by breadth-first flood fill
pub fn label_regions(mask: &ChangeMask) -> RegionLabels {
    let (rows, cols) = mask.shape();
    let view = mask.view();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for row in 0..rows {
        for col in 0..cols {
            if view[(row, col)] == 0 || labels[(row, col)] != 0 {
                continue;
            }

            let label = sizes.len() as u32 + 1;
            let mut size = 0usize;
            labels[(row, col)] = label;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                size += 1;
                for &(dr, dc) in &NEIGHBOURS {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if view[(nr, nc)] != 0 && labels[(nr, nc)] == 0 {
                        labels[(nr, nc)] = label;
                        queue.push_back((nr, nc));
                    }
                }
            }

            sizes.push(size);
        }
    }

    RegionLabels {
        labels: Raster::from_array(labels).with_transform(*mask.transform()),
        sizes,
    }
}

/// Pixel counts and region sizes of a change mask
pub fn summarize(mask: &ChangeMask) -> ChangeStatistics {
    let total_pixels = mask.len();
    let changed_pixels = mask.changed_count();
    let regions = label_regions(mask);

    let num_change_regions = regions.count();
    let max_region_size = regions.sizes.iter().copied().max().unwrap_or(0);
    let mean_region_size = if num_change_regions == 0 {
        0.0
    } else {
        regions.sizes.iter().sum::<usize>() as f64 / num_change_regions as f64
    };

    debug!(changed_pixels, num_change_regions, "mask summarized");

    ChangeStatistics {
        total_pixels,
        changed_pixels,
        unchanged_pixels: total_pixels - changed_pixels,
        change_percentage: percentage(changed_pixels, total_pixels),
        num_change_regions,
        mean_region_size,
        max_region_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn mask(grid: Array2<u8>) -> ChangeMask {
        ChangeMask::try_from_raster(Raster::from_array(grid)).unwrap()
    }

    #[test]
    fn test_empty_mask() {
        let stats = summarize(&ChangeMask::zeros(4, 4));
        assert_eq!(stats.total_pixels, 16);
        assert_eq!(stats.changed_pixels, 0);
        assert_eq!(stats.unchanged_pixels, 16);
        assert_eq!(stats.num_change_regions, 0);
        assert_eq!(stats.max_region_size, 0);
        assert_relative_eq!(stats.mean_region_size, 0.0);
        assert_relative_eq!(stats.change_percentage, 0.0);
    }

    #[test]
    fn test_diagonal_pixels_are_separate_regions() {
        let m = mask(array![[1, 0, 0], [0, 1, 0], [0, 0, 1]]);
        let regions = label_regions(&m);
        assert_eq!(regions.count(), 3);
        assert_eq!(regions.labels.data()[(0, 0)], 1);
        assert_eq!(regions.labels.data()[(1, 1)], 2);
        assert_eq!(regions.labels.data()[(2, 2)], 3);
    }

    #[test]
    fn test_region_sizes() {
        let m = mask(array![
            [1, 1, 0, 0, 1],
            [1, 0, 0, 1, 1],
            [0, 0, 0, 0, 1],
            [1, 0, 1, 1, 0],
        ]);
        let regions = label_regions(&m);
        assert_eq!(regions.sizes, vec![3, 4, 1, 2]);
        assert_eq!(regions.labels.data()[(1, 4)], 2);
        assert_eq!(regions.labels.data()[(3, 0)], 3);

        let stats = summarize(&m);
        assert_eq!(stats.changed_pixels, 10);
        assert_eq!(stats.num_change_regions, 4);
        assert_eq!(stats.max_region_size, 4);
        assert_relative_eq!(stats.mean_region_size, 2.5);
        assert_relative_eq!(stats.change_percentage, 50.0);
        assert_eq!(regions.sizes.iter().sum::<usize>(), stats.changed_pixels);
    }

    #[test]
    fn test_u_shape_is_one_region() {
        let m = mask(array![[1, 0, 1], [1, 0, 1], [1, 1, 1]]);
        assert_eq!(label_regions(&m).count(), 1);
    }

    #[test]
    fn test_serialized_keys() {
        let stats = summarize(&mask(array![[1, 0], [0, 0]]));
        let value = serde_json::to_value(stats).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "change_percentage",
                "changed_pixels",
                "max_region_size",
                "mean_region_size",
                "num_change_regions",
                "total_pixels",
                "unchanged_pixels",
            ]
        );
        assert_eq!(value["changed_pixels"], 1);
        assert_eq!(value["change_percentage"], 25.0);
    }
}
