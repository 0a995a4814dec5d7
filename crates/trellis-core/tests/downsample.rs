// File: crates/trellis-core/tests/downsample.rs
// Purpose: Sampling core contracts: LTTB length/endpoints/determinism,
//          min/max bucket bounds, every-nth strides, adaptive policy routing.

use trellis_core::downsample::{
    adaptive_sample, auto_sample, every_nth_indices, lttb, lttb_indices, sample_every_nth,
    sample_min_max, AdaptiveOptions, AutoSampleOptions, ChartType,
};
use trellis_core::record::{record, Record};
use trellis_core::series::Point;

fn wave(n: usize) -> Vec<Point> {
    (0..n).map(|i| Point::new(i as f64, (i as f64 * 0.05).sin() * 10.0)).collect()
}

#[test]
fn lttb_keeps_exact_threshold_and_endpoints() {
    let points = wave(1000);
    for threshold in [3usize, 4, 10, 77, 500, 999] {
        let out = lttb(&points, threshold);
        assert_eq!(out.len(), threshold, "threshold {threshold}");
        assert_eq!(out[0], points[0]);
        assert_eq!(out[out.len() - 1], points[points.len() - 1]);
    }
}

#[test]
fn lttb_noop_guards_return_input_unchanged() {
    let points = wave(10);
    assert_eq!(lttb(&points, 10), points);
    assert_eq!(lttb(&points, 50), points);
    assert_eq!(lttb(&points, 2), points);
    assert_eq!(lttb(&points, 0), points);
    assert!(lttb(&[], 5).is_empty());
}

#[test]
fn lttb_is_deterministic() {
    let points = wave(5000);
    let a = lttb(&points, 500);
    let b = lttb(&points, 500);
    assert_eq!(a, b);
}

#[test]
fn lttb_selects_max_area_candidate() {
    // n=5, threshold=4: one forced bucket {1}, then bucket {2, 3} judged
    // against anchor (1,10) and the final point (4,0). Index 2 wins on area.
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 10.0),
        Point::new(2.0, 0.0),
        Point::new(3.0, 5.0),
        Point::new(4.0, 0.0),
    ];
    assert_eq!(lttb_indices(&points, 4), vec![0, 1, 2, 4]);
}

#[test]
fn lttb_collinear_ties_resolve_to_first_candidate() {
    // All areas are zero on a flat line; strict `>` keeps the first point of
    // each bucket, and repeated runs agree.
    let points: Vec<Point> = (0..100).map(|i| Point::new(i as f64, 5.0)).collect();
    let first = lttb_indices(&points, 10);
    assert_eq!(first.len(), 10);
    assert_eq!(first, lttb_indices(&points, 10));
}

#[test]
fn lttb_uses_ordinal_coordinates_for_labels() {
    let labeled: Vec<Point> =
        (0..200).map(|i| Point::labeled(format!("row-{i}"), (i as f64 * 0.1).sin())).collect();
    let numeric: Vec<Point> =
        (0..200).map(|i| Point::new(i as f64, (i as f64 * 0.1).sin())).collect();
    assert_eq!(lttb_indices(&labeled, 50), lttb_indices(&numeric, 50));
}

#[test]
fn min_max_preserves_extremes_within_cap() {
    let mut points = wave(1000);
    points[317].y = 250.0;
    points[618].y = -250.0;
    let threshold = 100;
    let out = sample_min_max(&points, threshold);

    assert!(out.len() <= 2 * threshold, "emitted {} points", out.len());
    assert_eq!(out[0], points[0]);
    assert_eq!(out[out.len() - 1], points[999]);
    assert!(out.iter().any(|p| p.y == 250.0), "global max survives");
    assert!(out.iter().any(|p| p.y == -250.0), "global min survives");
}

#[test]
fn min_max_emits_in_original_relative_order() {
    let points = wave(400);
    let out = sample_min_max(&points, 40);
    let xs: Vec<f64> = out.iter().enumerate().map(|(i, p)| p.coord_x(i)).collect();
    assert!(xs.windows(2).all(|w| w[0] < w[1]), "output stays ordered");
}

#[test]
fn min_max_constant_data_emits_one_per_bucket() {
    let points: Vec<Point> = (0..300).map(|i| Point::new(i as f64, 7.0)).collect();
    let out = sample_min_max(&points, 30);
    // min == max per bucket collapses to one emission each, plus endpoints.
    assert!(out.len() <= 30);
}

#[test]
fn min_max_noop_guards() {
    let points = wave(10);
    assert_eq!(sample_min_max(&points, 10), points);
    assert_eq!(sample_min_max(&points, 2), points);
}

#[test]
fn every_nth_keeps_endpoints_and_stride() {
    assert_eq!(every_nth_indices(10, 3), vec![0, 3, 6, 9]);
    assert_eq!(every_nth_indices(10, 1), (0..10).collect::<Vec<_>>());
    assert_eq!(every_nth_indices(10, 0), (0..10).collect::<Vec<_>>());

    let points = wave(100);
    let out = sample_every_nth(&points, 10);
    assert_eq!(out[0], points[0]);
    assert_eq!(out[out.len() - 1], points[99]);
    assert_eq!(out.len(), 11);
}

#[test]
fn adaptive_routes_volatile_data_to_min_max() {
    // Alternating spikes: std dev far above 0.3 * mean.
    let points: Vec<Point> =
        (0..500).map(|i| Point::new(i as f64, if i % 2 == 0 { 1.0 } else { 100.0 })).collect();
    let opts = AdaptiveOptions { preserve_peaks: true, preserve_trends: true };
    assert_eq!(adaptive_sample(&points, 50, &opts), sample_min_max(&points, 50));
}

#[test]
fn adaptive_routes_smooth_data_to_lttb() {
    // Gentle drift around 1000: std dev well under 0.3 * mean.
    let points: Vec<Point> =
        (0..500).map(|i| Point::new(i as f64, 1000.0 + (i as f64 * 0.02).sin())).collect();
    let opts = AdaptiveOptions { preserve_peaks: true, preserve_trends: true };
    assert_eq!(adaptive_sample(&points, 50, &opts), lttb(&points, 50));
}

#[test]
fn adaptive_falls_back_to_stride() {
    let points: Vec<Point> =
        (0..500).map(|i| Point::new(i as f64, 1000.0 + (i as f64 * 0.02).sin())).collect();
    let opts = AdaptiveOptions { preserve_peaks: false, preserve_trends: false };
    let out = adaptive_sample(&points, 50, &opts);
    assert_eq!(out, sample_every_nth(&points, 10)); // ceil(500/50)
}

fn series_rows(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            record([
                ("x", i as f64),
                ("y", (i as f64 * 0.03).sin() * 5.0),
                ("y2", (i as f64 * 0.07).cos() * 3.0),
            ])
        })
        .collect()
}

#[test]
fn auto_sample_noop_when_under_budget() {
    let rows = series_rows(100);
    let opts = AutoSampleOptions { max_points: 100, ..AutoSampleOptions::default() };
    assert_eq!(auto_sample(&rows, ChartType::Line, &opts), rows);
}

#[test]
fn auto_sample_bar_charts_use_stride() {
    let rows = series_rows(1000);
    let opts = AutoSampleOptions { max_points: 100, ..AutoSampleOptions::default() };
    let out = auto_sample(&rows, ChartType::Bar, &opts);
    let expected: Vec<Record> =
        every_nth_indices(1000, 10).into_iter().map(|i| rows[i].clone()).collect();
    assert_eq!(out, expected);
}

#[test]
fn auto_sample_single_series_returns_original_rows() {
    let rows = series_rows(1000);
    let opts = AutoSampleOptions { max_points: 100, ..AutoSampleOptions::default() };
    let out = auto_sample(&rows, ChartType::Line, &opts);
    assert_eq!(out.len(), 100);
    assert_eq!(out[0], rows[0]);
    assert_eq!(out[99], rows[999]);
    // Every output row is one of the input rows, untouched.
    assert!(out.iter().all(|r| rows.contains(r)));
}

#[test]
fn auto_sample_multi_series_stays_time_aligned() {
    let rows = series_rows(1000);
    let opts = AutoSampleOptions {
        max_points: 100,
        x_key: "x".to_string(),
        y_key: "y".to_string(),
        series_keys: vec!["y".to_string(), "y2".to_string()],
    };
    let out = auto_sample(&rows, ChartType::Line, &opts);
    assert_eq!(out.len(), 100);
    // Selection is driven by the first series only; both series travel on the
    // same retained rows, so each output row carries its original y2.
    for row in &out {
        assert!(rows.contains(row));
    }
}
