// File: crates/trellis-core/src/strategy.rs
// Summary: Size-driven render/chart strategy selection and threshold-based
//          performance recommendations.

use serde::{Deserialize, Serialize};

/// How a table of `row_count` rows should be rendered. Immutable once chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum RenderStrategy {
    Full,
    Paginated { page_size: usize },
    Virtual { window_size: usize, overscan: usize },
    ServerSide { page_size: usize },
}

/// How a series of `point_count` points should reach the chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ChartStrategy {
    Full,
    Sample { sample_rate: usize, target_points: usize },
    Lttb { target_points: usize },
}

/// Boundary-exact thresholds: `<100` full, `<1000` paginated, `<10000`
/// virtual, else server-side.
pub fn select_render_strategy(row_count: usize) -> RenderStrategy {
    if row_count < 100 {
        RenderStrategy::Full
    } else if row_count < 1000 {
        RenderStrategy::Paginated { page_size: 50 }
    } else if row_count < 10_000 {
        RenderStrategy::Virtual { window_size: 50, overscan: 10 }
    } else {
        RenderStrategy::ServerSide { page_size: 100 }
    }
}

/// `<500` full, `<2000` stride sampling toward 500 points, else LTTB.
pub fn select_chart_strategy(point_count: usize) -> ChartStrategy {
    if point_count < 500 {
        ChartStrategy::Full
    } else if point_count < 2000 {
        ChartStrategy::Sample {
            sample_rate: (point_count as f64 / 500.0).ceil() as usize,
            target_points: 500,
        }
    } else {
        ChartStrategy::Lttb { target_points: 500 }
    }
}

/// A snapshot of measured request characteristics fed to the recommender.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfMetrics {
    pub render_time_ms: f64,
    pub data_fetch_time_ms: f64,
    /// Percentage in `[0, 100]`.
    pub cache_hit_rate: f64,
    pub memory_usage_mb: f64,
    pub data_size: usize,
    pub strategy: RenderStrategy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Recommendation {
    fn new(severity: Severity, message: &str, action: Option<&str>) -> Self {
        Self { severity, message: message.to_string(), action: action.map(str::to_string) }
    }
}

/// Evaluate the fixed rule table against a metrics snapshot. Never returns an
/// empty list: when no rule fires, a single info record reports nominal
/// performance.
pub fn generate_recommendations(metrics: &PerfMetrics) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if metrics.render_time_ms > 1000.0 {
        out.push(Recommendation::new(
            Severity::Critical,
            "render time exceeds 1s",
            Some("switch to server-side pagination or reduce the working set"),
        ));
    } else if metrics.render_time_ms > 500.0 {
        out.push(Recommendation::new(
            Severity::Warning,
            "render time exceeds 500ms",
            Some("enable virtual scrolling or downsample the series"),
        ));
    }

    if metrics.data_fetch_time_ms > 3000.0 {
        out.push(Recommendation::new(
            Severity::Critical,
            "data fetch exceeds 3s",
            Some("add caching or narrow the query"),
        ));
    } else if metrics.data_fetch_time_ms > 1000.0 {
        out.push(Recommendation::new(
            Severity::Warning,
            "data fetch exceeds 1s",
            Some("consider caching frequent queries"),
        ));
    }

    if metrics.cache_hit_rate < 50.0 {
        out.push(Recommendation::new(
            Severity::Warning,
            "cache hit rate below 50%",
            Some("widen the cache TTL or warm common queries"),
        ));
    }

    if metrics.memory_usage_mb > 512.0 {
        out.push(Recommendation::new(
            Severity::Critical,
            "memory usage exceeds 512MB",
            Some("stream or page the dataset instead of holding it whole"),
        ));
    } else if metrics.memory_usage_mb > 256.0 {
        out.push(Recommendation::new(
            Severity::Warning,
            "memory usage exceeds 256MB",
            Some("reduce retained rows or sample earlier in the pipeline"),
        ));
    }

    if metrics.data_size > 10_000 && metrics.strategy == RenderStrategy::Full {
        out.push(Recommendation::new(
            Severity::Warning,
            "large dataset rendered without pagination",
            Some("move to paginated or virtual rendering"),
        ));
    }

    if out.is_empty() {
        out.push(Recommendation::new(
            Severity::Info,
            "performance is within normal operating thresholds",
            None,
        ));
    }
    out
}
