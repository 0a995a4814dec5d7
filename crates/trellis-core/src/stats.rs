// File: crates/trellis-core/src/stats.rs
// Summary: Descriptive statistics over dynamic rows: percentiles, moving
//          averages, EMA, growth, cumulative sums, IQR outliers, binning,
//          and Pearson correlation. All well-defined at degenerate inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TrellisError;
use crate::record::{FieldRef, Record, Value};

/// Percentiles computed when the caller does not ask for a specific set.
pub const DEFAULT_PERCENTILES: [f64; 4] = [50.0, 90.0, 95.0, 99.0];

/// Population mean; 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Nearest-rank percentile over an ascending slice:
/// index `clamp(ceil(p/100 * n) - 1, 0, n-1)`. 0.0 for empty input.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let rank = (p / 100.0 * n as f64).ceil() as isize - 1;
    sorted[rank.clamp(0, n as isize - 1) as usize]
}

fn percentile_label(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("p{}", p as i64)
    } else {
        format!("p{p}")
    }
}

/// Compute the requested percentiles, keyed `p{n}`. Empty input yields 0 for
/// every requested percentile (never NaN, never an error).
pub fn calculate_percentiles(
    values: &[f64],
    percentiles: &[f64],
) -> Result<BTreeMap<String, f64>, TrellisError> {
    if percentiles.is_empty() {
        return Err(TrellisError::NoPercentiles);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(percentiles.iter().map(|&p| (percentile_label(p), percentile(&sorted, p))).collect())
}

/// Trailing moving average over the inclusive window `[max(0, i-w+1), i]`,
/// averaging the strictly numeric values inside it (0 when there are none).
/// Returns new records with `moving_average` attached; input rows untouched.
pub fn calculate_moving_average(
    rows: &[Record],
    field: &str,
    window_size: usize,
) -> Result<Vec<Record>, TrellisError> {
    if window_size == 0 {
        return Err(TrellisError::InvalidWindow);
    }
    let field = FieldRef::new(field);
    let mut out = Vec::with_capacity(rows.len());
    for i in 0..rows.len() {
        let start = (i + 1).saturating_sub(window_size);
        let window: Vec<f64> = rows[start..=i].iter().filter_map(|r| field.number(r)).collect();
        let mut row = rows[i].clone();
        row.insert("moving_average".to_string(), Value::Number(mean(&window)));
        out.push(row);
    }
    Ok(out)
}

/// Exponential moving average: `ema[0] = v[0]`,
/// `ema[i] = alpha * v[i] + (1 - alpha) * ema[i-1]`, values coerced.
/// Attaches `ema` to new records. `alpha` must be in `(0, 1]`.
pub fn calculate_ema(rows: &[Record], field: &str, alpha: f64) -> Result<Vec<Record>, TrellisError> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(TrellisError::InvalidAlpha(alpha));
    }
    let field = FieldRef::new(field);
    let mut out = Vec::with_capacity(rows.len());
    let mut ema = 0.0f64;
    for (i, source) in rows.iter().enumerate() {
        let v = field.coerce(source);
        ema = if i == 0 { v } else { alpha * v + (1.0 - alpha) * ema };
        let mut row = source.clone();
        row.insert("ema".to_string(), Value::Number(ema));
        out.push(row);
    }
    Ok(out)
}

/// Percent change against the previous row: 0 for the first row, and 0 (not
/// infinity) when the previous value is 0. Attaches `growth_rate`.
pub fn calculate_growth_rate(rows: &[Record], field: &str) -> Vec<Record> {
    let field = FieldRef::new(field);
    let mut out = Vec::with_capacity(rows.len());
    let mut prev = 0.0f64;
    for (i, source) in rows.iter().enumerate() {
        let v = field.coerce(source);
        let rate = if i == 0 || prev == 0.0 { 0.0 } else { (v - prev) / prev * 100.0 };
        let mut row = source.clone();
        row.insert("growth_rate".to_string(), Value::Number(rate));
        out.push(row);
        prev = v;
    }
    out
}

/// Running sum of coerced values. Attaches `cumulative_sum`.
pub fn calculate_cumulative_sum(rows: &[Record], field: &str) -> Vec<Record> {
    let field = FieldRef::new(field);
    let mut out = Vec::with_capacity(rows.len());
    let mut sum = 0.0f64;
    for source in rows {
        sum += field.coerce(source);
        let mut row = source.clone();
        row.insert("cumulative_sum".to_string(), Value::Number(sum));
        out.push(row);
    }
    out
}

/// IQR outlier detection: bounds `q1 - t*iqr` / `q3 + t*iqr` with quartiles at
/// sorted indexes `floor(0.25n)` and `floor(0.75n)`. Attaches `is_outlier` and
/// `z_score` (0 when the standard deviation is 0).
pub fn detect_outliers(rows: &[Record], field: &str, threshold: f64) -> Vec<Record> {
    let field = FieldRef::new(field);
    let values: Vec<f64> = rows.iter().map(|r| field.coerce(r)).collect();
    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let (lower, upper) = if n == 0 {
        (f64::NEG_INFINITY, f64::INFINITY)
    } else {
        let q1 = sorted[n / 4];
        let q3 = sorted[((3 * n) / 4).min(n - 1)];
        let iqr = q3 - q1;
        (q1 - threshold * iqr, q3 + threshold * iqr)
    };
    let m = mean(&values);
    let sd = std_dev(&values);

    rows.iter()
        .zip(values)
        .map(|(source, v)| {
            let z = if sd == 0.0 { 0.0 } else { (v - m) / sd };
            let mut row = source.clone();
            row.insert("is_outlier".to_string(), Value::Bool(v < lower || v > upper));
            row.insert("z_score".to_string(), Value::Number(z));
            row
        })
        .collect()
}

/// One equal-width histogram bin over `[lower, upper)`; the final bin's upper
/// bound is inclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Equal-width binning over the strictly numeric values of `field`.
/// Values at the maximum land in the last bin (index clamp). Returns an empty
/// vec when no values are numeric; `min == max` puts everything in bin 0.
pub fn bin_data(rows: &[Record], field: &str, bin_count: usize) -> Result<Vec<Bin>, TrellisError> {
    if bin_count == 0 {
        return Err(TrellisError::InvalidBinCount);
    }
    let field = FieldRef::new(field);
    let values: Vec<f64> = rows.iter().filter_map(|r| field.number(r)).collect();
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let size = (max - min) / bin_count as f64;

    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|i| Bin { lower: min + i as f64 * size, upper: min + (i + 1) as f64 * size, count: 0 })
        .collect();
    for v in values {
        let idx = if size == 0.0 { 0 } else { (((v - min) / size).floor() as usize).min(bin_count - 1) };
        bins[idx].count += 1;
    }
    Ok(bins)
}

/// Pearson correlation over the rows where both fields are strictly numeric.
/// Returns 0 when there are no valid pairs or the denominator is 0, never NaN.
pub fn calculate_correlation(rows: &[Record], field_1: &str, field_2: &str) -> f64 {
    let f1 = FieldRef::new(field_1);
    let f2 = FieldRef::new(field_2);
    let pairs: Vec<(f64, f64)> =
        rows.iter().filter_map(|r| f1.number(r).zip(f2.number(r))).collect();
    if pairs.is_empty() {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0f64;
    let mut var_x = 0.0f64;
    let mut var_y = 0.0f64;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        cov / denom
    }
}
