// File: crates/trellis-core/src/protocol.rs
// Summary: Offload message protocol: tagged request/response unions mapping
//          1:1 onto the pure routines, plus the dispatch router.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_by, GroupByOptions};
use crate::downsample::{adaptive_sample, lttb, sample_every_nth, sample_min_max, AdaptiveOptions};
use crate::record::Record;
use crate::series::Point;
use crate::stats::{
    bin_data, calculate_ema, calculate_growth_rate, calculate_moving_average,
    calculate_percentiles, detect_outliers, Bin,
};
use crate::timebucket::{aggregate_by_time, TimeBucket, TimeBucketOptions};

/// Which sampler a `sample` request runs. `EveryNth` derives its stride from
/// the threshold (`ceil(len / threshold)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleMethod {
    Lttb,
    MinMax,
    EveryNth,
    Adaptive,
}

/// Offload request. Discriminant tags and field names are part of the wire
/// contract and must round-trip bit-exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OffloadRequest {
    Sample { points: Vec<Point>, threshold: usize, method: SampleMethod },
    AggregateTime { rows: Vec<Record>, options: TimeBucketOptions },
    AggregateBy { rows: Vec<Record>, options: GroupByOptions },
    Percentiles { values: Vec<f64>, percentiles: Vec<f64> },
    MovingAverage { rows: Vec<Record>, field: String, window_size: usize },
    Ema { rows: Vec<Record>, field: String, alpha: f64 },
    GrowthRate { rows: Vec<Record>, field: String },
    DetectOutliers { rows: Vec<Record>, field: String, threshold: f64 },
    BinData { rows: Vec<Record>, field: String, bin_count: usize },
}

/// Self-describing result payload carried by a successful response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OffloadResult {
    Points { points: Vec<Point> },
    Rows { rows: Vec<Record> },
    Buckets { buckets: Vec<TimeBucket> },
    Percentiles { percentiles: BTreeMap<String, f64> },
    Bins { bins: Vec<Bin> },
}

/// Offload response union. Contract violations surface as `Error`; the caller
/// falls back to the synchronous path, there is no retry here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OffloadResponse {
    Success { result: OffloadResult },
    Error { message: String },
    Progress { percent: f64 },
}

/// Route a request to its matching pure routine and wrap the result verbatim.
pub fn dispatch(request: OffloadRequest) -> OffloadResponse {
    match request {
        OffloadRequest::Sample { points, threshold, method } => {
            let sampled = match method {
                SampleMethod::Lttb => lttb(&points, threshold),
                SampleMethod::MinMax => sample_min_max(&points, threshold),
                SampleMethod::EveryNth => {
                    let step = if threshold == 0 {
                        1
                    } else {
                        (points.len() as f64 / threshold as f64).ceil() as usize
                    };
                    sample_every_nth(&points, step)
                }
                SampleMethod::Adaptive => {
                    adaptive_sample(&points, threshold, &AdaptiveOptions::default())
                }
            };
            OffloadResponse::Success { result: OffloadResult::Points { points: sampled } }
        }
        OffloadRequest::AggregateTime { rows, options } => OffloadResponse::Success {
            result: OffloadResult::Buckets { buckets: aggregate_by_time(&rows, &options) },
        },
        OffloadRequest::AggregateBy { rows, options } => match aggregate_by(&rows, &options) {
            Ok(rows) => OffloadResponse::Success { result: OffloadResult::Rows { rows } },
            Err(e) => OffloadResponse::Error { message: e.to_string() },
        },
        OffloadRequest::Percentiles { values, percentiles } => {
            match calculate_percentiles(&values, &percentiles) {
                Ok(percentiles) => OffloadResponse::Success {
                    result: OffloadResult::Percentiles { percentiles },
                },
                Err(e) => OffloadResponse::Error { message: e.to_string() },
            }
        }
        OffloadRequest::MovingAverage { rows, field, window_size } => {
            match calculate_moving_average(&rows, &field, window_size) {
                Ok(rows) => OffloadResponse::Success { result: OffloadResult::Rows { rows } },
                Err(e) => OffloadResponse::Error { message: e.to_string() },
            }
        }
        OffloadRequest::Ema { rows, field, alpha } => match calculate_ema(&rows, &field, alpha) {
            Ok(rows) => OffloadResponse::Success { result: OffloadResult::Rows { rows } },
            Err(e) => OffloadResponse::Error { message: e.to_string() },
        },
        OffloadRequest::GrowthRate { rows, field } => OffloadResponse::Success {
            result: OffloadResult::Rows { rows: calculate_growth_rate(&rows, &field) },
        },
        OffloadRequest::DetectOutliers { rows, field, threshold } => OffloadResponse::Success {
            result: OffloadResult::Rows { rows: detect_outliers(&rows, &field, threshold) },
        },
        OffloadRequest::BinData { rows, field, bin_count } => {
            match bin_data(&rows, &field, bin_count) {
                Ok(bins) => OffloadResponse::Success { result: OffloadResult::Bins { bins } },
                Err(e) => OffloadResponse::Error { message: e.to_string() },
            }
        }
    }
}
