// File: crates/trellis-core/src/downsample.rs
// Summary: Downsampling core: LTTB, min/max buckets, every-nth, adaptive policy,
//          and row-level auto sampling with shared index selection.

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::series::{points_from_rows, Point};
use crate::stats::{mean, std_dev};

/// Volatility cutoff for the adaptive policy: data whose y standard deviation
/// exceeds this fraction of the mean is treated as peaky and sampled min/max.
pub const VOLATILITY_COEFFICIENT: f64 = 0.3;

/// Chart kind hint for `auto_sample`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Area,
    Scatter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveOptions {
    pub preserve_peaks: bool,
    pub preserve_trends: bool,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self { preserve_peaks: true, preserve_trends: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSampleOptions {
    pub max_points: usize,
    pub x_key: String,
    pub y_key: String,
    #[serde(default)]
    pub series_keys: Vec<String>,
}

impl Default for AutoSampleOptions {
    fn default() -> Self {
        Self {
            max_points: 1000,
            x_key: "x".to_string(),
            y_key: "y".to_string(),
            series_keys: Vec::new(),
        }
    }
}

/// Largest-Triangle-Three-Buckets index selection.
/// No-op guard: `threshold >= len` or `threshold <= 2` returns every index.
/// Otherwise returns exactly `threshold` indices, always including 0 and n-1,
/// in ascending order. Labeled X coordinates use the point's ordinal index.
pub fn lttb_indices(points: &[Point], threshold: usize) -> Vec<usize> {
    let n = points.len();
    if threshold >= n || threshold <= 2 {
        return (0..n).collect();
    }

    let bucket_size = (n - 2) as f64 / (threshold - 2) as f64;
    let mut selected = Vec::with_capacity(threshold);
    selected.push(0usize);

    let mut a = 0usize; // anchor: the point chosen from the previous bucket

    for i in 0..(threshold - 2) {
        let start = (1.0 + i as f64 * bucket_size).floor() as usize;
        let end = ((1.0 + (i + 1) as f64 * bucket_size).floor() as usize).min(n - 1);

        // Average of the next bucket; the final one degenerates to the last point.
        let next_start = end;
        let next_end = ((1.0 + (i + 2) as f64 * bucket_size).floor() as usize).min(n);
        let mut avg_x = 0.0f64;
        let mut avg_y = 0.0f64;
        let mut count = 0usize;
        for k in next_start..next_end {
            avg_x += points[k].coord_x(k);
            avg_y += points[k].y;
            count += 1;
        }
        if count == 0 {
            avg_x = points[n - 1].coord_x(n - 1);
            avg_y = points[n - 1].y;
            count = 1;
        }
        avg_x /= count as f64;
        avg_y /= count as f64;

        // Pick the candidate maximizing triangle area with the anchor and the
        // next-bucket average. Strict `>` keeps the first maximal candidate;
        // area 0 (collinear) is still a valid selection.
        let a_x = points[a].coord_x(a);
        let a_y = points[a].y;
        let mut max_area = -1.0f64;
        let mut max_idx = start;
        for k in start..end.max(start + 1) {
            let p_x = points[k].coord_x(k);
            let p_y = points[k].y;
            let area = 0.5 * ((a_x - p_x) * (avg_y - a_y) - (a_x - avg_x) * (p_y - a_y)).abs();
            if area > max_area {
                max_area = area;
                max_idx = k;
            }
        }
        selected.push(max_idx);
        a = max_idx;
    }

    selected.push(n - 1);
    selected
}

/// Largest-Triangle-Three-Buckets downsampling.
/// Returns the input unchanged when `threshold >= len` or `threshold <= 2`;
/// otherwise exactly `threshold` points with first and last kept verbatim.
pub fn lttb(points: &[Point], threshold: usize) -> Vec<Point> {
    lttb_indices(points, threshold).into_iter().map(|i| points[i].clone()).collect()
}

/// Min/max-per-bucket sampling. Keeps first and last, then per bucket of size
/// `floor(n / threshold)` emits the minimum-y and maximum-y points in their
/// original relative order (once, when they are the same point).
///
/// NOTE: output can exceed `threshold`, up to `2 * threshold` points. This is
/// intentional: peaks and troughs are both preserved instead of honoring a
/// hard cap. Callers that treat `threshold` as a ceiling must account for it.
/// The interior is partitioned into `threshold - 2` buckets (the last absorbs
/// any remainder) so that two emissions per bucket plus the forced endpoints
/// never exceed `2 * threshold`; stepping `floor(n / threshold)`-sized buckets
/// across the whole interior would overshoot that bound.
pub fn sample_min_max(points: &[Point], threshold: usize) -> Vec<Point> {
    let n = points.len();
    if threshold >= n || threshold <= 2 {
        return points.to_vec();
    }

    let bucket_size = (n / threshold).max(1);
    let buckets = threshold - 2;
    let mut sampled = Vec::with_capacity(2 * threshold);
    sampled.push(points[0].clone());

    for b in 0..buckets {
        let start = 1 + b * bucket_size;
        if start >= n - 1 {
            break;
        }
        // Last bucket absorbs the remainder up to (but excluding) the last point.
        let end = if b == buckets - 1 { n - 1 } else { (start + bucket_size).min(n - 1) };
        let mut min_idx = start;
        let mut max_idx = start;
        for k in (start + 1)..end {
            if points[k].y < points[min_idx].y {
                min_idx = k;
            }
            if points[k].y > points[max_idx].y {
                max_idx = k;
            }
        }
        if min_idx == max_idx {
            sampled.push(points[min_idx].clone());
        } else if min_idx < max_idx {
            sampled.push(points[min_idx].clone());
            sampled.push(points[max_idx].clone());
        } else {
            sampled.push(points[max_idx].clone());
            sampled.push(points[min_idx].clone());
        }
    }

    sampled.push(points[n - 1].clone());
    sampled
}

/// Every-nth index selection: 0 and n-1 always, plus n, 2n, ... between them.
/// `n <= 1` keeps every index.
pub fn every_nth_indices(len: usize, n: usize) -> Vec<usize> {
    if n <= 1 || len <= 2 {
        return (0..len).collect();
    }
    let mut selected = vec![0usize];
    let mut i = n;
    while i < len - 1 {
        selected.push(i);
        i += n;
    }
    selected.push(len - 1);
    selected
}

/// Every-nth sampling over points. `n <= 1` is a no-op.
pub fn sample_every_nth(points: &[Point], n: usize) -> Vec<Point> {
    every_nth_indices(points.len(), n).into_iter().map(|i| points[i].clone()).collect()
}

/// Adaptive policy: measure y volatility and pick the sampler.
/// Peaky data (std dev above `VOLATILITY_COEFFICIENT * mean`) goes min/max,
/// smooth data goes LTTB, otherwise plain every-nth stride.
pub fn adaptive_sample(points: &[Point], threshold: usize, opts: &AdaptiveOptions) -> Vec<Point> {
    let n = points.len();
    if threshold >= n || threshold <= 2 {
        return points.to_vec();
    }

    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let m = mean(&ys);
    let sd = std_dev(&ys);

    if opts.preserve_peaks && sd > VOLATILITY_COEFFICIENT * m {
        sample_min_max(points, threshold)
    } else if opts.preserve_trends {
        lttb(points, threshold)
    } else {
        let step = (n as f64 / threshold as f64).ceil() as usize;
        sample_every_nth(points, step)
    }
}

/// Row-level auto sampling. No-op when the row count already fits `max_points`.
/// Bar charts stride with every-nth (LTTB leaves uneven bar gaps). Multi-series
/// rows are LTTB-selected on the first series only and all series are projected
/// through that one index set, keeping the series time-aligned.
pub fn auto_sample(rows: &[Record], chart_type: ChartType, opts: &AutoSampleOptions) -> Vec<Record> {
    let n = rows.len();
    if n <= opts.max_points {
        return rows.to_vec();
    }

    let indices = if chart_type == ChartType::Bar {
        let step = (n as f64 / opts.max_points as f64).ceil() as usize;
        every_nth_indices(n, step)
    } else {
        let y_key = opts.series_keys.first().map(String::as_str).unwrap_or(&opts.y_key);
        let points = points_from_rows(rows, &opts.x_key, y_key);
        lttb_indices(&points, opts.max_points)
    };

    indices.into_iter().map(|i| rows[i].clone()).collect()
}
