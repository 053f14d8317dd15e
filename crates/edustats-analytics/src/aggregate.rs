//! Group-wise aggregation over rows.
//!
//! The engine must stay correct under duplicate (year, school, degree)
//! keys: upstream deduplication is out of scope, so duplicates are
//! mean-reduced rather than assumed unique. Output order is always
//! deterministic: groups are emitted in ascending natural key order,
//! and ranked sorts break ties the same way.

use edustats_domain::{num, CellValue, Row};
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How a metric column is reduced within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Arithmetic mean, ignoring missing values. An all-missing group
    /// yields missing, not zero.
    Mean,
    /// Sum, excluding missing values. An all-missing group yields
    /// missing, so "no data" stays distinct from "zero activity".
    Sum,
}

/// A group-key cell with a total order, so `BTreeMap` grouping gives
/// ascending natural key order for free. Numbers sort before text,
/// missing sorts last.
#[derive(Debug, Clone, PartialEq)]
enum KeyCell {
    Num(f64),
    Text(String),
    Missing,
}

impl Eq for KeyCell {}

impl Ord for KeyCell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Num(_), _) => Ordering::Less,
            (_, Self::Num(_)) => Ordering::Greater,
            (Self::Text(_), Self::Missing) => Ordering::Less,
            (Self::Missing, Self::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&CellValue> for KeyCell {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Number(v) => Self::Num(*v),
            CellValue::Text(s) => Self::Text(s.clone()),
            CellValue::Missing => Self::Missing,
        }
    }
}

impl From<KeyCell> for CellValue {
    fn from(key: KeyCell) -> Self {
        match key {
            KeyCell::Num(v) => Self::Number(v),
            KeyCell::Text(s) => Self::Text(s),
            KeyCell::Missing => Self::Missing,
        }
    }
}

fn key_of(row: &Row, keys: &[&str]) -> Vec<KeyCell> {
    keys.iter()
        .map(|k| row.get(*k).map_or(KeyCell::Missing, KeyCell::from))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct MetricAcc {
    sum: f64,
    count: usize,
}

impl MetricAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn finish(self, reducer: Reducer) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match reducer {
            Reducer::Mean => Some(self.sum / self.count as f64),
            Reducer::Sum => Some(self.sum),
        }
    }
}

/// One output row per distinct `group_keys` combination, carrying the
/// reduced value of every metric. Rows come out in ascending natural
/// key order.
#[must_use]
pub fn aggregate(rows: &[Row], group_keys: &[&str], metrics: &[&str], reducer: Reducer) -> Vec<Row> {
    let mut groups: BTreeMap<Vec<KeyCell>, Vec<MetricAcc>> = BTreeMap::new();

    for row in rows {
        let accs = groups
            .entry(key_of(row, group_keys))
            .or_insert_with(|| vec![MetricAcc::default(); metrics.len()]);
        for (acc, metric) in accs.iter_mut().zip(metrics) {
            acc.push(num(row, metric));
        }
    }

    groups
        .into_iter()
        .map(|(key, accs)| {
            let mut out = Row::new();
            for (name, cell) in group_keys.iter().zip(key) {
                out.insert((*name).to_string(), cell.into());
            }
            for (name, acc) in metrics.iter().zip(accs) {
                out.insert((*name).to_string(), CellValue::from(acc.finish(reducer)));
            }
            out
        })
        .collect()
}

/// Sort ranked breakdowns: descending by `metric` with missing values
/// last, ties broken by ascending `tie_keys` so output is stable
/// across runs.
pub fn sort_desc_by(rows: &mut [Row], metric: &str, tie_keys: &[&str]) {
    rows.sort_by(|a, b| {
        let ord = match (num(a, metric), num(b, metric)) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ord.then_with(|| key_of(a, tie_keys).cmp(&key_of(b, tie_keys)))
    });
}

/// Mean of the defined values, `None` when every value is missing.
#[must_use]
pub fn mean_ignoring_missing<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let valid: Vec<f64> = values.into_iter().flatten().collect();
    if valid.is_empty() {
        None
    } else {
        Some(valid.mean())
    }
}

/// Presentation rounding to `dp` decimal places. Applied only when
/// shaping responses, never before further computation.
#[must_use]
pub fn round_dp(value: f64, dp: u32) -> f64 {
    let factor = 10_f64.powi(dp as i32);
    (value * factor).round() / factor
}
