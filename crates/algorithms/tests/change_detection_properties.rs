//! End-to-end properties of the change detection pipeline.
//!
//! Random raster pairs go through every detector; the invariants below must
//! hold for all of them. The scenario tests pin down behaviour on small
//! hand-built scenes.

use approx::assert_relative_eq;
use ndarray::Array2;
use proptest::prelude::*;
use terradelta_algorithms::prelude::*;

/// Strategy for two co-registered rasters with 1..4 bands of u8 values
fn raster_pair() -> impl Strategy<Value = (MultiBandRaster<u8>, MultiBandRaster<u8>)> {
    (1usize..4, 3usize..12, 3usize..12).prop_flat_map(|(bands, rows, cols)| {
        let n = bands * rows * cols;
        (
            prop::collection::vec(any::<u8>(), n),
            prop::collection::vec(any::<u8>(), n),
        )
            .prop_map(move |(a, b)| {
                (
                    MultiBandRaster::from_vec(a, bands, rows, cols).unwrap(),
                    MultiBandRaster::from_vec(b, bands, rows, cols).unwrap(),
                )
            })
    })
}

fn single_band(grid: Array2<f64>) -> MultiBandRaster<f64> {
    MultiBandRaster::from_bands(&[grid]).unwrap()
}

fn all_methods() -> [DetectionMethod; 4] {
    [
        DetectionMethod::Threshold,
        DetectionMethod::Otsu,
        DetectionMethod::ChangeVector,
        DetectionMethod::Vegetation,
    ]
}

// ── Properties ───────────────────────────────────────────────────────

#[test]
fn prop_pixel_counts_partition_the_grid() {
    proptest!(|((before, after) in raster_pair())| {
        for method in all_methods() {
            let outcome = detect(&before, &after, &DetectionRequest::new(method)).unwrap();
            let stats = outcome.statistics();
            prop_assert_eq!(stats.total_pixels, before.rows() * before.cols());
            prop_assert_eq!(stats.changed_pixels + stats.unchanged_pixels, stats.total_pixels);
            prop_assert!(outcome.mask.view().iter().all(|&v| v == 0 || v == 1));
            prop_assert!((0.0..=100.0).contains(&stats.change_percentage));
        }
    });
}

#[test]
fn prop_threshold_is_monotonic() {
    proptest!(|(
        (before, after) in raster_pair(),
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
    )| {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let count = |threshold: f64| {
            let params = ThresholdParams { threshold, ..Default::default() };
            threshold_detection(&before, &after, &params).unwrap().changed_count()
        };
        prop_assert!(count(high) <= count(low));
    });
}

#[test]
fn prop_vegetation_index_is_bounded() {
    proptest!(|((before, _after) in raster_pair())| {
        match vegetation_index(&before, 0, 1) {
            VegetationOutcome::Available(index) => {
                prop_assert!(index.data().iter().all(|v| (-1.0..=1.0).contains(v)));
            }
            VegetationOutcome::Unavailable { required_bands, available_bands } => {
                prop_assert_eq!(required_bands, 2);
                prop_assert!(available_bands < 2);
            }
        }
    });
}

#[test]
fn prop_detectors_are_idempotent() {
    proptest!(|((before, after) in raster_pair())| {
        for method in all_methods() {
            let request = DetectionRequest::new(method);
            let first = detect(&before, &after, &request).unwrap();
            let second = detect(&before, &after, &request).unwrap();
            prop_assert_eq!(&first.mask, &second.mask);
            prop_assert_eq!(first.statistics(), second.statistics());
        }
    });
}

#[test]
fn prop_region_sizes_sum_to_changed_pixels() {
    proptest!(|((before, after) in raster_pair())| {
        let outcome = detect(&before, &after, &DetectionRequest::new(DetectionMethod::ChangeVector)).unwrap();
        let regions = label_regions(&outcome.mask);
        let stats = summarize(&outcome.mask);
        prop_assert_eq!(regions.sizes.iter().sum::<usize>(), stats.changed_pixels);
        prop_assert_eq!(regions.count(), stats.num_change_regions);
        if stats.num_change_regions == 0 {
            prop_assert_eq!(stats.mean_region_size, 0.0);
            prop_assert_eq!(stats.max_region_size, 0);
        }
    });
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn identical_rasters_report_no_change() {
    let raster = single_band(Array2::zeros((4, 4)));
    let request = DetectionRequest::new(DetectionMethod::Threshold).with_threshold(0.1);
    let outcome = detect(&raster, &raster, &request).unwrap();
    let stats = outcome.statistics();

    assert_eq!(outcome.mask.changed_count(), 0);
    assert_eq!(stats.change_percentage, 0.0);
    assert_eq!(stats.num_change_regions, 0);
    assert_eq!(stats.severity(), ChangeSeverity::Minimal);
}

#[test]
fn corner_block_without_cleanup_is_exact() {
    let before = single_band(Array2::zeros((4, 4)));
    let after = single_band(Array2::from_shape_fn((4, 4), |(r, c)| {
        if r < 2 && c < 2 {
            200.0
        } else {
            0.0
        }
    }));
    let request = DetectionRequest::new(DetectionMethod::Threshold)
        .with_threshold(0.5)
        .with_radius(0);
    let outcome = detect(&before, &after, &request).unwrap();

    for r in 0..4 {
        for c in 0..4 {
            assert_eq!(outcome.mask.is_changed(r, c), r < 2 && c < 2, "pixel ({}, {})", r, c);
        }
    }
    assert_eq!(outcome.statistics().num_change_regions, 1);
}

#[test]
fn corner_block_survives_default_cleanup() {
    // A block must be wider than the radius-2 disk to survive the opening
    let before = single_band(Array2::zeros((16, 16)));
    let after = single_band(Array2::from_shape_fn((16, 16), |(r, c)| {
        if r < 6 && c < 6 {
            200.0
        } else {
            0.0
        }
    }));
    let request = DetectionRequest::new(DetectionMethod::Threshold).with_threshold(0.5);
    let outcome = detect(&before, &after, &request).unwrap();
    let stats = outcome.statistics();

    assert!(outcome.mask.is_changed(0, 0));
    assert!(outcome.mask.is_changed(3, 3));
    for r in 8..16 {
        for c in 8..16 {
            assert!(!outcome.mask.is_changed(r, c));
        }
    }
    assert_eq!(stats.num_change_regions, 1);
    assert_eq!(stats.max_region_size, stats.changed_pixels);
}

#[test]
fn small_corner_block_is_treated_as_noise() {
    let before = single_band(Array2::zeros((4, 4)));
    let after = single_band(Array2::from_shape_fn((4, 4), |(r, c)| {
        if r < 2 && c < 2 {
            200.0
        } else {
            0.0
        }
    }));
    let request = DetectionRequest::new(DetectionMethod::Threshold).with_threshold(0.5);
    let outcome = detect(&before, &after, &request).unwrap();
    assert_eq!(outcome.mask.changed_count(), 0);
}

#[test]
fn cvd_zero_threshold_marks_all_differing_pixels() {
    let before = MultiBandRaster::from_bands(&[
        Array2::from_elem((10, 10), 0.0),
        Array2::from_elem((10, 10), 0.0),
        Array2::from_elem((10, 10), 0.0),
    ])
    .unwrap();
    // Band 0 normalizes to 0 only at (0, 0), where band 2 normalizes to 1
    let after = MultiBandRaster::from_bands(&[
        Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c + 1) as f64),
        Array2::from_elem((10, 10), 0.0),
        Array2::from_shape_fn((10, 10), |(_, c)| (9 - c) as f64),
    ])
    .unwrap();

    let magnitude = change_vector_magnitude(&before, &after).unwrap();
    assert_relative_eq!(magnitude.data()[(0, 0)], 1.0, epsilon = 1e-12);
    let moved = magnitude.data().iter().filter(|&&m| m > 0.0).count();
    assert_eq!(moved, 100);

    let request = DetectionRequest::new(DetectionMethod::ChangeVector).with_threshold(0.0);
    let outcome = detect(&before, &after, &request).unwrap();
    assert_eq!(outcome.mask.changed_count(), moved);
}

#[test]
fn single_band_vegetation_is_unavailable() {
    let raster = single_band(Array2::from_elem((4, 4), 0.4));
    assert!(!vegetation_index(&raster, 0, 1).is_available());

    let outcome = detect(&raster, &raster, &DetectionRequest::new(DetectionMethod::Vegetation)).unwrap();
    assert!(outcome.vegetation_unavailable());
    assert_eq!(outcome.statistics().changed_pixels, 0);
}

#[test]
fn shape_mismatch_is_fatal_for_every_method() {
    let a = single_band(Array2::zeros((4, 4)));
    let b = single_band(Array2::zeros((4, 5)));
    for method in all_methods() {
        assert!(matches!(
            detect(&a, &b, &DetectionRequest::new(method)),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}

#[test]
fn unknown_method_names_are_rejected() {
    assert!(matches!(
        "pca".parse::<DetectionMethod>(),
        Err(Error::UnsupportedMethod { .. })
    ));
    assert!(matches!(
        "squared".parse::<DifferenceMethod>(),
        Err(Error::UnsupportedMethod { .. })
    ));
}
