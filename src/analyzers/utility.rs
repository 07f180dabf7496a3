use crate::dataset::{Record, View};
use std::collections::BTreeMap;

/// Average of per-day or per-row entry counts; 0.0 when nothing matched.
pub fn mean(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        n => values.iter().sum::<f64>() / n as f64,
    }
}

/// Population spread of entry counts around `center`, used for the forecast
/// confidence band. 0.0 when nothing matched.
pub fn stddev(values: &[f64], center: f64) -> f64 {
    match values.len() {
        0 => 0.0,
        n => (values.iter().map(|v| (v - center).powi(2)).sum::<f64>() / n as f64).sqrt(),
    }
}

/// Sample (n - 1) standard deviation. Returns 0.0 for fewer than two values.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// `part / total * 100`, or 0.0 when `total` is zero.
pub fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sums `value` over the rows of `view`, grouped by `key`.
pub fn sum_by<K: Ord>(
    view: &View<'_>,
    key: impl Fn(&Record) -> K,
    value: impl Fn(&Record) -> u64,
) -> BTreeMap<K, u64> {
    let mut groups = BTreeMap::new();
    for r in view.iter() {
        *groups.entry(key(r)).or_insert(0) += value(r);
    }
    groups
}

/// Ordinary least-squares slope of `values` against their 0-based index.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Sorts `(key, volume)` pairs by volume, largest first, keeping the
/// incoming order among equal volumes.
pub fn sort_by_volume_desc<K>(items: &mut [(K, u64)]) {
    items.sort_by(|a, b| b.1.cmp(&a.1));
}

/// Key with the largest value; the first one wins on ties.
pub fn argmax<K: Clone>(items: impl IntoIterator<Item = (K, u64)>) -> Option<K> {
    let mut best: Option<(K, u64)> = None;
    for (k, v) in items {
        if best.as_ref().is_none_or(|(_, bv)| v > *bv) {
            best = Some((k, v));
        }
    }
    best.map(|(k, _)| k)
}
