// File: crates/trellis-core/src/lib.rs
// Summary: Core library entry point; exports the sampling, bucketing,
//          aggregation, and strategy APIs.

pub mod aggregate;
pub mod downsample;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod record;
pub mod series;
pub mod stats;
pub mod strategy;
pub mod timebucket;

pub use aggregate::{aggregate_by, GroupByOptions, MetricOp, MetricSpec};
pub use downsample::{
    adaptive_sample, auto_sample, lttb, lttb_indices, sample_every_nth, sample_min_max,
    AdaptiveOptions, AutoSampleOptions, ChartType,
};
pub use error::TrellisError;
pub use metrics::{MetricSummary, MetricTimer, MetricsRegistry};
pub use protocol::{dispatch, OffloadRequest, OffloadResponse, OffloadResult, SampleMethod};
pub use record::{record, FieldRef, Record, Value};
pub use series::{points_from_rows, Coord, Point};
pub use stats::{
    bin_data, calculate_correlation, calculate_cumulative_sum, calculate_ema,
    calculate_growth_rate, calculate_moving_average, calculate_percentiles, detect_outliers, Bin,
};
pub use strategy::{
    generate_recommendations, select_chart_strategy, select_render_strategy, ChartStrategy,
    PerfMetrics, Recommendation, RenderStrategy, Severity,
};
pub use timebucket::{aggregate_by_time, TimeBucket, TimeBucketOptions, TimeUnit};
