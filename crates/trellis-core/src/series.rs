// File: crates/trellis-core/src/series.rs
// Summary: Ordered point model for sampling; rows normalize into points, labels
//          fall back to ordinal coordinates for geometric math.

use serde::{Deserialize, Serialize};

use crate::record::{Record, Value};

/// X coordinate of a point: numeric, or an opaque label whose geometric
/// coordinate is the point's ordinal position in the sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Number(f64),
    Label(String),
}

/// One sample in an ordered series. The engine never reorders points;
/// the caller guarantees chronological/logical order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Record::is_empty")]
    pub extra: Record,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x: Coord::Number(x), y, extra: Record::new() }
    }

    pub fn labeled(label: impl Into<String>, y: f64) -> Self {
        Self { x: Coord::Label(label.into()), y, extra: Record::new() }
    }

    /// Geometric X: the numeric coordinate, or `index` for labeled points.
    #[inline]
    pub fn coord_x(&self, index: usize) -> f64 {
        match &self.x {
            Coord::Number(v) => *v,
            Coord::Label(_) => index as f64,
        }
    }
}

/// Normalize rows into points using `x_key`/`y_key`. Numeric X values are used
/// directly; text X values stay labels; missing X falls back to the row index.
/// Y is coerced (non-numeric becomes 0.0).
pub fn points_from_rows(rows: &[Record], x_key: &str, y_key: &str) -> Vec<Point> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let x = match row.get(x_key) {
                Some(Value::Number(v)) if v.is_finite() => Coord::Number(*v),
                Some(Value::Text(s)) => Coord::Label(s.clone()),
                _ => Coord::Number(i as f64),
            };
            let y = row.get(y_key).map(Value::coerce).unwrap_or(0.0);
            Point { x, y, extra: Record::new() }
        })
        .collect()
}
