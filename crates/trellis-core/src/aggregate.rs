// File: crates/trellis-core/src/aggregate.rs
// Summary: Generic group-by aggregation over dynamic rows (sum/avg/min/max/
//          count/median/stddev), one output record per group.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TrellisError;
use crate::record::{Record, Value};
use crate::stats::{mean, std_dev};

/// Separator joining multi-field group keys.
pub const KEY_SEPARATOR: &str = "|";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    Median,
    Stddev,
}

impl MetricOp {
    pub fn name(&self) -> &'static str {
        match self {
            MetricOp::Sum => "sum",
            MetricOp::Avg => "avg",
            MetricOp::Min => "min",
            MetricOp::Max => "max",
            MetricOp::Count => "count",
            MetricOp::Median => "median",
            MetricOp::Stddev => "stddev",
        }
    }
}

/// One requested metric: which field, which op, and the output alias
/// (defaulting to `{op}_{field}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSpec {
    pub field: String,
    pub op: MetricOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl MetricSpec {
    pub fn new(field: impl Into<String>, op: MetricOp) -> Self {
        Self { field: field.into(), op, alias: None }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn output_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| format!("{}_{}", self.op.name(), self.field))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByOptions {
    pub group_by: Vec<String>,
    pub metrics: Vec<MetricSpec>,
}

/// Group rows by the `"|"`-joined string values of the key fields and compute
/// each requested metric over the strictly numeric values of its field
/// (non-numeric entries are ignored). Groups appear in first-encounter order.
/// A group with no numeric values yields 0 for every metric, count included.
/// Output records carry the group-key fields plus the metric aliases.
pub fn aggregate_by(rows: &[Record], options: &GroupByOptions) -> Result<Vec<Record>, TrellisError> {
    if options.group_by.is_empty() {
        return Err(TrellisError::EmptyGroupBy);
    }
    if options.metrics.is_empty() {
        return Err(TrellisError::EmptyMetrics);
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&Record>> = HashMap::new();

    for row in rows {
        let key = options
            .group_by
            .iter()
            .map(|field| row.get(field).map(Value::to_string).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut out = Vec::with_capacity(order.len());
    for key in order {
        let members = &groups[&key];
        let mut record = Record::new();
        // Carry the original group-key fields from the first member.
        if let Some(first) = members.first() {
            for field in &options.group_by {
                let value = first.get(field).cloned().unwrap_or_default();
                record.insert(field.clone(), value);
            }
        }
        for spec in &options.metrics {
            let values: Vec<f64> =
                members.iter().filter_map(|row| row.get(&spec.field).and_then(Value::as_number)).collect();
            record.insert(spec.output_name(), Value::Number(compute_metric(spec.op, &values)));
        }
        out.push(record);
    }
    Ok(out)
}

fn compute_metric(op: MetricOp, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match op {
        MetricOp::Sum => values.iter().sum(),
        MetricOp::Avg => mean(values),
        MetricOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        MetricOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        MetricOp::Count => values.len() as f64,
        MetricOp::Median => median(values),
        MetricOp::Stddev => std_dev(values),
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
