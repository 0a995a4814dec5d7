// File: crates/demo/src/main.rs
// Summary: Demo loads (timestamp, category, value) CSV rows and runs the full
//          pipeline: time bucketing, group-by, LTTB, strategy selection,
//          timing, and recommendations.

use std::path::Path;

use anyhow::{Context, Result};
use trellis_core::{
    aggregate_by, aggregate_by_time, auto_sample, generate_recommendations, lttb, record,
    select_chart_strategy, select_render_strategy, AutoSampleOptions, ChartType, GroupByOptions,
    MetricOp, MetricSpec, MetricsRegistry, PerfMetrics, Point, Record, TimeBucketOptions,
    TimeUnit,
};

fn main() -> Result<()> {
    // Accept a CSV path from CLI or fall back to deterministic synthetic rows.
    let raw = std::env::args().nth(1).unwrap_or_else(|| "dashboard_events.csv".to_string());

    let rows = if Path::new(&raw).exists() {
        let rows = load_rows_csv(Path::new(&raw))
            .with_context(|| format!("failed to load CSV '{raw}'"))?;
        println!("Loaded {} rows from {}", rows.len(), raw);
        rows
    } else {
        let rows = synthetic_rows(5000, 90);
        println!("No input file at '{raw}'; generated {} synthetic rows", rows.len());
        rows
    };

    if rows.is_empty() {
        anyhow::bail!("no rows loaded; check headers/delimiter.");
    }

    let registry = MetricsRegistry::new();

    // 1) Daily buckets with gap fill
    let buckets = {
        let _timer = registry.start_timer("aggregate_by_time");
        aggregate_by_time(
            &rows,
            &TimeBucketOptions {
                date_field: "timestamp".to_string(),
                value_field: "value".to_string(),
                time_unit: TimeUnit::Day,
                fill_gaps: true,
                default_value: 0.0,
            },
        )
    };
    println!("Daily buckets: {} (gap-filled)", buckets.len());
    if let (Some(first), Some(last)) = (buckets.first(), buckets.last()) {
        println!("  {} .. {}", first.period_key, last.period_key);
    }

    // 2) Per-category totals
    let per_category = {
        let _timer = registry.start_timer("aggregate_by");
        aggregate_by(
            &rows,
            &GroupByOptions {
                group_by: vec!["category".to_string()],
                metrics: vec![
                    MetricSpec::new("value", MetricOp::Sum).with_alias("total"),
                    MetricSpec::new("value", MetricOp::Avg).with_alias("average"),
                    MetricSpec::new("value", MetricOp::Count).with_alias("rows"),
                ],
            },
        )?
    };
    println!("Categories:");
    for group in &per_category {
        println!(
            "  {:<10} total={:<12} avg={:<10} rows={}",
            group.get("category").map(ToString::to_string).unwrap_or_default(),
            group.get("total").map(ToString::to_string).unwrap_or_default(),
            group.get("average").map(ToString::to_string).unwrap_or_default(),
            group.get("rows").map(ToString::to_string).unwrap_or_default(),
        );
    }

    // 3) Downsample the daily series for charting
    let series: Vec<Point> =
        buckets.iter().map(|b| Point::labeled(b.period_key.clone(), b.value)).collect();
    let target_points = 200usize;
    let sampled = {
        let _timer = registry.start_timer("lttb");
        lttb(&series, target_points)
    };
    println!("Downsampled {} daily points to {}", series.len(), sampled.len());

    // Row-level sampling for the raw scatter view
    let scatter = auto_sample(
        &rows,
        ChartType::Scatter,
        &AutoSampleOptions {
            max_points: 500,
            x_key: "timestamp".to_string(),
            y_key: "value".to_string(),
            series_keys: Vec::new(),
        },
    );
    println!("Auto-sampled {} raw rows to {}", rows.len(), scatter.len());

    // 4) Strategy selection from measured sizes
    let render = select_render_strategy(rows.len());
    let chart = select_chart_strategy(series.len());
    println!("Render strategy: {render:?}");
    println!("Chart strategy:  {chart:?}");

    // 5) Timing summaries and recommendations
    for key in registry.keys() {
        if let Some(s) = registry.summary(&key) {
            println!(
                "{key:<20} avg={:.3}ms min={:.3}ms max={:.3}ms p95={:.3}ms",
                s.avg, s.min, s.max, s.p95
            );
        }
    }

    let fetch_ms = registry.summary("aggregate_by_time").map(|s| s.avg).unwrap_or(0.0);
    let render_ms = registry.summary("lttb").map(|s| s.avg).unwrap_or(0.0);
    let metrics = PerfMetrics {
        render_time_ms: render_ms,
        data_fetch_time_ms: fetch_ms,
        cache_hit_rate: 100.0,
        memory_usage_mb: approx_mb(&rows),
        data_size: rows.len(),
        strategy: render,
    };
    println!("Recommendations:");
    for rec in generate_recommendations(&metrics) {
        match &rec.action {
            Some(action) => println!("  [{:?}] {} -> {}", rec.severity, rec.message, action),
            None => println!("  [{:?}] {}", rec.severity, rec.message),
        }
    }

    Ok(())
}

/// Load `(timestamp, category, value)` rows from a headered CSV.
fn load_rows_csv(path: &Path) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers =
        rdr.headers()?.iter().map(|h| h.trim().to_lowercase()).collect::<Vec<_>>();
    println!("Headers: {headers:?}");

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let mut row = Record::new();
        for (i, header) in headers.iter().enumerate() {
            let Some(cell) = rec.get(i) else { continue };
            let value = match cell.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => trellis_core::Value::Number(v),
                _ => trellis_core::Value::Text(cell.trim().to_string()),
            };
            row.insert(header.clone(), value);
        }
        out.push(row);
    }
    Ok(out)
}

/// Deterministic synthetic rows: `count` events over `days` days across four
/// categories, values from a small linear-congruential sequence.
fn synthetic_rows(count: usize, days: u32) -> Vec<Record> {
    const CATEGORIES: [&str; 4] = ["orders", "refunds", "signups", "visits"];
    let mut state = 0x2545F4914F6CDD1Du64;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let day = (i as u32 * days / count as u32).min(days - 1);
        let hour = (state >> 33) % 24;
        let value = 10.0 + (state >> 40) as f64 % 90.0;
        let category = CATEGORIES[(state >> 21) as usize % CATEGORIES.len()];
        // Epoch seconds starting 2026-01-01; exercises the numeric parse path.
        let epoch = 1_767_225_600u64 + day as u64 * 86_400 + hour * 3_600;
        out.push(record([
            ("timestamp", trellis_core::Value::Number(epoch as f64)),
            ("category", trellis_core::Value::Text(category.to_string())),
            ("value", trellis_core::Value::Number(value)),
        ]));
    }
    out
}

fn approx_mb(rows: &[Record]) -> f64 {
    // Rough per-row footprint for the recommendation input; not a measurement.
    (rows.len() * 256) as f64 / (1024.0 * 1024.0)
}
