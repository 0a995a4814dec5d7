// File: crates/trellis-core/tests/stats.rs
// Purpose: Statistical utilities at both ordinary and degenerate inputs:
//          percentile index math, windowed averages, outliers, bins,
//          correlation, and the contract-violation errors.

use trellis_core::error::TrellisError;
use trellis_core::record::{record, Record, Value};
use trellis_core::stats::{
    bin_data, calculate_correlation, calculate_cumulative_sum, calculate_ema,
    calculate_growth_rate, calculate_moving_average, calculate_percentiles, detect_outliers,
    DEFAULT_PERCENTILES,
};

fn rows_of(values: &[f64]) -> Vec<Record> {
    values.iter().map(|&v| record([("v", v)])).collect()
}

fn num(row: &Record, field: &str) -> f64 {
    row.get(field).and_then(Value::as_number).unwrap_or(f64::NAN)
}

#[test]
fn percentile_index_is_ceil_based() {
    // index = ceil(p/100 * n) - 1: for n=5 and p=50 that is 2, the median.
    let out = calculate_percentiles(&[10.0, 20.0, 30.0, 40.0, 50.0], &[50.0]).unwrap();
    assert_eq!(out["p50"], 30.0);

    let out =
        calculate_percentiles(&[10.0, 20.0, 30.0, 40.0, 50.0], &[90.0, 99.0, 100.0]).unwrap();
    assert_eq!(out["p90"], 50.0);
    assert_eq!(out["p99"], 50.0);
    assert_eq!(out["p100"], 50.0);
}

#[test]
fn percentiles_empty_input_returns_zeroes() {
    let out = calculate_percentiles(&[], &[50.0, 90.0]).unwrap();
    assert_eq!(out["p50"], 0.0);
    assert_eq!(out["p90"], 0.0);
    assert_eq!(out.len(), 2);
}

#[test]
fn percentiles_input_order_does_not_matter() {
    let out = calculate_percentiles(&[50.0, 10.0, 40.0, 20.0, 30.0], &DEFAULT_PERCENTILES).unwrap();
    assert_eq!(out["p50"], 30.0);
    assert_eq!(out["p99"], 50.0);
}

#[test]
fn percentiles_without_a_request_is_a_contract_violation() {
    assert_eq!(calculate_percentiles(&[1.0], &[]).unwrap_err(), TrellisError::NoPercentiles);
}

#[test]
fn moving_average_uses_trailing_inclusive_window() {
    let rows = rows_of(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let out = calculate_moving_average(&rows, "v", 3).unwrap();
    assert_eq!(num(&out[0], "moving_average"), 1.0);
    assert_eq!(num(&out[1], "moving_average"), 1.5);
    assert_eq!(num(&out[2], "moving_average"), 2.0);
    assert_eq!(num(&out[3], "moving_average"), 3.0);
    assert_eq!(num(&out[4], "moving_average"), 4.0);
    // Input untouched.
    assert!(!rows[0].contains_key("moving_average"));
}

#[test]
fn moving_average_skips_non_numeric_entries() {
    let rows = vec![record([("v", Value::Number(2.0))]), record([("v", Value::Text("x".into()))]), record([("v", Value::Number(4.0))])];
    let out = calculate_moving_average(&rows, "v", 3).unwrap();
    // Window over rows 0..=2 holds only {2, 4}.
    assert_eq!(num(&out[2], "moving_average"), 3.0);
}

#[test]
fn moving_average_zero_window_is_a_contract_violation() {
    assert_eq!(
        calculate_moving_average(&rows_of(&[1.0]), "v", 0).unwrap_err(),
        TrellisError::InvalidWindow
    );
}

#[test]
fn ema_seeds_with_first_value() {
    let rows = rows_of(&[10.0, 20.0, 30.0]);
    let out = calculate_ema(&rows, "v", 0.5).unwrap();
    assert_eq!(num(&out[0], "ema"), 10.0);
    assert_eq!(num(&out[1], "ema"), 15.0);
    assert_eq!(num(&out[2], "ema"), 22.5);
}

#[test]
fn ema_alpha_outside_unit_interval_is_a_contract_violation() {
    assert_eq!(calculate_ema(&rows_of(&[1.0]), "v", 0.0).unwrap_err(), TrellisError::InvalidAlpha(0.0));
    assert_eq!(calculate_ema(&rows_of(&[1.0]), "v", 1.5).unwrap_err(), TrellisError::InvalidAlpha(1.5));
    assert!(calculate_ema(&rows_of(&[1.0]), "v", 1.0).is_ok());
}

#[test]
fn growth_rate_first_row_and_zero_previous_are_zero() {
    let rows = rows_of(&[0.0, 50.0, 100.0, 0.0, 25.0]);
    let out = calculate_growth_rate(&rows, "v");
    assert_eq!(num(&out[0], "growth_rate"), 0.0); // first row
    assert_eq!(num(&out[1], "growth_rate"), 0.0); // previous was 0, not inf
    assert_eq!(num(&out[2], "growth_rate"), 100.0);
    assert_eq!(num(&out[3], "growth_rate"), -100.0);
    assert_eq!(num(&out[4], "growth_rate"), 0.0); // previous was 0 again
}

#[test]
fn cumulative_sum_runs_forward() {
    let rows = rows_of(&[1.0, 2.0, 3.0]);
    let out = calculate_cumulative_sum(&rows, "v");
    let sums: Vec<f64> = out.iter().map(|r| num(r, "cumulative_sum")).collect();
    assert_eq!(sums, [1.0, 3.0, 6.0]);
}

#[test]
fn iqr_flags_the_spike_only() {
    let rows = rows_of(&[1.0, 2.0, 3.0, 4.0, 100.0]);
    let out = detect_outliers(&rows, "v", 1.5);
    let flags: Vec<bool> = out
        .iter()
        .map(|r| matches!(r.get("is_outlier"), Some(Value::Bool(true))))
        .collect();
    assert_eq!(flags, [false, false, false, false, true]);
    // z-score of the spike is positive and large.
    assert!(num(&out[4], "z_score") > 1.5);
}

#[test]
fn outliers_zero_variance_yields_zero_z_scores() {
    let rows = rows_of(&[5.0, 5.0, 5.0]);
    let out = detect_outliers(&rows, "v", 1.5);
    for row in &out {
        assert_eq!(row.get("is_outlier"), Some(&Value::Bool(false)));
        assert_eq!(num(row, "z_score"), 0.0);
    }
}

#[test]
fn outliers_empty_input_is_empty_output() {
    assert!(detect_outliers(&[], "v", 1.5).is_empty());
}

#[test]
fn bins_are_equal_width_with_inclusive_last_bound() {
    let rows = rows_of(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    let out = bin_data(&rows, "v", 5).unwrap();
    assert_eq!(out.len(), 5);
    assert_eq!(out[0].lower, 0.0);
    assert_eq!(out[4].upper, 10.0);
    // 10.0 lands in the last bin via the index clamp, not out of range.
    let counts: Vec<u64> = out.iter().map(|b| b.count).collect();
    assert_eq!(counts, [2, 2, 2, 2, 3]);
}

#[test]
fn bins_degenerate_and_empty_inputs() {
    // min == max: everything in bin 0.
    let rows = rows_of(&[4.0, 4.0, 4.0]);
    let out = bin_data(&rows, "v", 3).unwrap();
    assert_eq!(out[0].count, 3);
    assert_eq!(out[1].count, 0);

    // No numeric values: empty vec, not an error.
    let rows = vec![record([("v", Value::Text("-".into()))])];
    assert!(bin_data(&rows, "v", 3).unwrap().is_empty());

    assert_eq!(bin_data(&rows, "v", 0).unwrap_err(), TrellisError::InvalidBinCount);
}

#[test]
fn correlation_detects_perfect_linear_relationships() {
    let rows: Vec<Record> = (0..10)
        .map(|i| record([("a", i as f64), ("b", 3.0 * i as f64 + 1.0), ("c", -2.0 * i as f64)]))
        .collect();
    assert!((calculate_correlation(&rows, "a", "b") - 1.0).abs() < 1e-12);
    assert!((calculate_correlation(&rows, "a", "c") + 1.0).abs() < 1e-12);
}

#[test]
fn correlation_degenerate_inputs_return_zero() {
    // Zero variance in one field.
    let rows: Vec<Record> = (0..5).map(|i| record([("a", i as f64), ("b", 7.0)])).collect();
    assert_eq!(calculate_correlation(&rows, "a", "b"), 0.0);
    // No valid pairs.
    let rows = vec![record([("a", Value::Number(1.0)), ("b", Value::Text("x".into()))])];
    assert_eq!(calculate_correlation(&rows, "a", "b"), 0.0);
    assert_eq!(calculate_correlation(&[], "a", "b"), 0.0);
}
