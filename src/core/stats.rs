// core/stats.rs
// Aggregations over per-run measurement columns

use std::cmp::Ordering;

/// Running sum.
pub fn cumulative(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0f64, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Divide by the number of simulation iterations. Returns `None` for zero
/// iterations.
pub fn scale(values: &[f64], iterations: u64) -> Option<Vec<f64>> {
    if iterations == 0 {
        return None;
    }
    let denom = iterations as f64;
    Some(values.iter().map(|v| v / denom).collect())
}

/// `E[X]` of a PMF whose first entry is `X = 1`.
pub fn expected_value(pmf: &[f64]) -> f64 {
    pmf.iter()
        .enumerate()
        .map(|(i, p)| (i + 1) as f64 * p)
        .sum()
}

/// `sqrt(E[X²] - E[X]²)` over the same 1-based support as [`expected_value`].
pub fn standard_deviation(pmf: &[f64]) -> f64 {
    let mut e_x = 0.0f64;
    let mut e_x2 = 0.0f64;
    for (i, &p) in pmf.iter().enumerate() {
        let x = (i + 1) as f64;
        e_x += x * p;
        e_x2 += x * x * p;
    }
    (e_x2 - e_x * e_x).max(0.0).sqrt()
}

/// First and last 1-based positions holding non-zero mass.
pub fn support_bounds(pmf: &[f64]) -> Option<(usize, usize)> {
    let first = pmf.iter().position(|&p| p != 0.0)?;
    let last = pmf.iter().rposition(|&p| p != 0.0)?;
    Some((first + 1, last + 1))
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupStats {
    pub key: f64,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1 denominator); zero for single rows.
    pub std: f64,
    pub sum: f64,
}

/// Group `(key, value)` pairs by key, ascending.
pub fn group_by(pairs: &[(f64, f64)]) -> Vec<GroupStats> {
    let mut sorted: Vec<(f64, f64)> = pairs.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    sorted
        .chunk_by(|a, b| a.0 == b.0)
        .map(|chunk| {
            let values: Vec<f64> = chunk.iter().map(|(_, v)| *v).collect();
            let count = values.len();
            let sum: f64 = values.iter().sum();
            let mean = sum / count as f64;
            let std = if count < 2 {
                0.0
            } else {
                let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
                    / (count as f64 - 1.0);
                var.sqrt()
            };
            GroupStats {
                key: chunk[0].0,
                count,
                mean,
                std,
                sum,
            }
        })
        .collect()
}
