// File: crates/trellis-core/src/timebucket.rs
// Summary: Calendar-aligned time bucketing with Monday weeks, leap-correct
//          month/quarter steps, and optional gap fill.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::record::{Record, Value};

/// Calendar unit a timestamp is bucketed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucketOptions {
    pub date_field: String,
    pub value_field: String,
    pub time_unit: TimeUnit,
    #[serde(default)]
    pub fill_gaps: bool,
    #[serde(default)]
    pub default_value: f64,
}

/// One calendar period: canonical key, summed value, and row count.
/// After gap fill the buckets are contiguous under the unit's increment rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    pub period_key: String,
    pub value: f64,
    pub count: u64,
}

/// Generic date parsing chain: RFC 3339, common datetime/date layouts, then
/// numeric epoch seconds or milliseconds. Returns `None` for anything else.
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => epoch_to_datetime(*n),
        Value::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_utc());
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt);
                }
            }
            for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
                if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                    return d.and_hms_opt(0, 0, 0);
                }
            }
            s.parse::<f64>().ok().and_then(epoch_to_datetime)
        }
        _ => None,
    }
}

fn epoch_to_datetime(n: f64) -> Option<NaiveDateTime> {
    if !n.is_finite() {
        return None;
    }
    // Heuristic shared with common exporters: values past 1e12 are epoch millis.
    if n.abs() >= 1e12 {
        DateTime::from_timestamp_millis(n as i64).map(|dt| dt.naive_utc())
    } else {
        DateTime::from_timestamp(n as i64, 0).map(|dt| dt.naive_utc())
    }
}

/// Truncate a timestamp to the start of its period. Weeks start on Monday.
pub fn period_start(dt: NaiveDateTime, unit: TimeUnit) -> NaiveDateTime {
    let date = dt.date();
    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).unwrap_or(dt);
    match unit {
        TimeUnit::Hour => date.and_hms_opt(dt.hour(), 0, 0).unwrap_or(dt),
        TimeUnit::Day => midnight(date),
        TimeUnit::Week => {
            let back = date.weekday().num_days_from_monday() as u64;
            midnight(date.checked_sub_days(Days::new(back)).unwrap_or(date))
        }
        TimeUnit::Month => midnight(date.with_day(1).unwrap_or(date)),
        TimeUnit::Quarter => {
            let month = date.month0() / 3 * 3 + 1;
            midnight(NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date))
        }
        TimeUnit::Year => midnight(NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)),
    }
}

/// Canonical key for a period start: `YYYY-MM-DD HH:00`, `YYYY-MM-DD`,
/// Monday's day key for weeks, `YYYY-MM`, `YYYY-Qn`, `YYYY`.
pub fn period_key(start: NaiveDateTime, unit: TimeUnit) -> String {
    match unit {
        TimeUnit::Hour => start.format("%Y-%m-%d %H:00").to_string(),
        TimeUnit::Day | TimeUnit::Week => start.format("%Y-%m-%d").to_string(),
        TimeUnit::Month => start.format("%Y-%m").to_string(),
        TimeUnit::Quarter => format!("{}-Q{}", start.year(), start.month0() / 3 + 1),
        TimeUnit::Year => start.format("%Y").to_string(),
    }
}

/// Step one period forward. Month/quarter/year steps are calendar-correct
/// (Jan 31 + 1 month clamps to Feb's last day; leap years handled by chrono).
pub fn next_period(start: NaiveDateTime, unit: TimeUnit) -> NaiveDateTime {
    match unit {
        TimeUnit::Hour => start + Duration::hours(1),
        TimeUnit::Day => start + Duration::days(1),
        TimeUnit::Week => start + Duration::days(7),
        TimeUnit::Month => start + Months::new(1),
        TimeUnit::Quarter => start + Months::new(3),
        TimeUnit::Year => start + Months::new(12),
    }
}

/// Bucket rows into calendar periods, summing the coerced value field.
/// Rows whose date field does not parse are dropped silently. With
/// `fill_gaps`, missing periods between the earliest and latest bucket are
/// inserted with the default value and a count of 0. Output is ascending by
/// period start (not lexical key order).
pub fn aggregate_by_time(rows: &[Record], options: &TimeBucketOptions) -> Vec<TimeBucket> {
    let unit = options.time_unit;
    let mut buckets: BTreeMap<NaiveDateTime, TimeBucket> = BTreeMap::new();

    for row in rows {
        let Some(dt) = row.get(&options.date_field).and_then(parse_date) else {
            continue;
        };
        let start = period_start(dt, unit);
        let value = row.get(&options.value_field).map(Value::coerce).unwrap_or(0.0);
        let bucket = buckets.entry(start).or_insert_with(|| TimeBucket {
            period_key: period_key(start, unit),
            value: 0.0,
            count: 0,
        });
        bucket.value += value;
        bucket.count += 1;
    }

    if options.fill_gaps {
        let bounds = buckets
            .keys()
            .next()
            .copied()
            .zip(buckets.keys().next_back().copied());
        if let Some((first, last)) = bounds {
            let mut cursor = next_period(first, unit);
            while cursor < last {
                buckets.entry(cursor).or_insert_with(|| TimeBucket {
                    period_key: period_key(cursor, unit),
                    value: options.default_value,
                    count: 0,
                });
                cursor = next_period(cursor, unit);
            }
        }
    }

    buckets.into_values().collect()
}
