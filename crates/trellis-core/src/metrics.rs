// File: crates/trellis-core/src/metrics.rs
// Summary: Explicit, capped-FIFO performance sample registry with summary
//          statistics and an RAII timer.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::stats::percentile;

/// Samples retained per metric key; the oldest is dropped past this.
pub const MAX_SAMPLES: usize = 100;

/// Derived view over one key's retained samples.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Bounded per-key sample ring. Constructed explicitly and threaded through
/// callers; there is no process-wide instance. Writers are serialized behind
/// a mutex so the FIFO cap holds under concurrent recording; reads take a
/// snapshot.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    inner: Mutex<HashMap<String, VecDeque<f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, evicting the oldest once the key holds `MAX_SAMPLES`.
    /// Fire-and-forget: never blocks beyond the registry lock.
    pub fn record(&self, key: &str, value: f64) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let ring = guard.entry(key.to_string()).or_default();
        if ring.len() == MAX_SAMPLES {
            ring.pop_front();
        }
        ring.push_back(value);
    }

    /// Summarize a key's retained samples; `None` when the key is unknown.
    pub fn summary(&self, key: &str) -> Option<MetricSummary> {
        let samples: Vec<f64> = {
            let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            guard.get(key)?.iter().copied().collect()
        };
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(MetricSummary {
            avg: samples.iter().sum::<f64>() / samples.len() as f64,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }

    pub fn keys(&self) -> Vec<String> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = guard.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn clear_key(&self, key: &str) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
    }

    /// Start a timer that records elapsed milliseconds under `key` on drop.
    pub fn start_timer(&self, key: &str) -> MetricTimer<'_> {
        MetricTimer { registry: self, key: key.to_string(), started: Instant::now() }
    }
}

/// RAII timing guard; recording happens when the guard goes out of scope.
pub struct MetricTimer<'a> {
    registry: &'a MetricsRegistry,
    key: String,
    started: Instant,
}

impl Drop for MetricTimer<'_> {
    fn drop(&mut self) {
        self.registry.record(&self.key, self.started.elapsed().as_secs_f64() * 1000.0);
    }
}
