//! Closed-form recovery distribution for grouped shares.
//!
//! A secret is split into `r` groups of `s` shares. A group counts toward
//! reconstruction once at least `t` of its shares have been contacted.
//! For a fixed `t`, `N(t, p)` counts the per-group contact vectors
//! `(x_1..x_r)` with `t <= x_j <= s` and `Σ x_j = p`, computed by
//! inclusion–exclusion over groups that overflow their capacity:
//!
//! `N(t, p) = Σ_{i=0}^{r-1} (-1)^i C(r, i) C(p - r·t - i·(s-t+1) + r-1, r-1)`
//!
//! The sweep evaluates `p = 1 ..= r·s - 1` for every `t = 2 ..= s-1`.

use std::ops::RangeInclusive;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::binomial::{binomial, sign};

/// Upper bound on the number of significant bits kept when converting a
/// big ratio to `f64`.
const RATIO_BITS: u64 = 1000;

/// Largest accepted `r·s`. One curve holds `r·s - 1` counts.
pub const MAX_TOTAL_SHARES: u64 = 1 << 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("degenerate distribution: raw counts sum to zero")]
    DegenerateDistribution,
}

/// How a raw count sequence becomes a plotted probability curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// Divide by the sum of the raw counts of the same threshold.
    #[default]
    Sum,
    /// Divide `N(t, p)` by `C(r·s, p)`.
    PerPoint,
}

/// One normalized curve of the sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveryCurve {
    pub threshold: u32,
    /// Raw `N(t, p)` for `p = 1 ..= r·s - 1`.
    pub counts: Vec<BigInt>,
    pub probabilities: Vec<f64>,
}

impl RecoveryCurve {
    /// `(p, probability)` pairs with `p` starting at 1.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, &y)| ((i + 1) as f64, y))
    }
}

/// Validated `(r, s)` pair plus the normalization applied to every curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryModel {
    groups: u32,
    shares_per_group: u32,
    normalization: Normalization,
}

impl RecoveryModel {
    pub fn new(
        groups: u32,
        shares_per_group: u32,
        normalization: Normalization,
    ) -> Result<Self, RecoveryError> {
        validate_shape(groups, shares_per_group)?;
        Ok(Self {
            groups,
            shares_per_group,
            normalization,
        })
    }

    pub fn groups(&self) -> u32 {
        self.groups
    }

    pub fn shares_per_group(&self) -> u32 {
        self.shares_per_group
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn total_shares(&self) -> u64 {
        self.groups as u64 * self.shares_per_group as u64
    }

    /// Thresholds `2 ..= s-1`; empty ranges are rejected.
    pub fn thresholds(&self) -> Result<RangeInclusive<u32>, RecoveryError> {
        if self.shares_per_group < 3 {
            return Err(RecoveryError::InvalidParameter(format!(
                "shares per group must be at least 3 to sweep thresholds 2..=s-1, got s={}",
                self.shares_per_group
            )));
        }
        Ok(2..=self.shares_per_group - 1)
    }

    pub fn curve(&self, threshold: u32) -> Result<RecoveryCurve, RecoveryError> {
        let counts = compute_distribution(self.groups, self.shares_per_group, threshold)?;
        let probabilities = match self.normalization {
            Normalization::Sum => normalize(&counts)?,
            Normalization::PerPoint => {
                per_point_probabilities(self.groups, self.shares_per_group, &counts)
            }
        };
        debug!(
            threshold,
            points = counts.len(),
            normalization = ?self.normalization,
            "recovery curve computed"
        );
        Ok(RecoveryCurve {
            threshold,
            counts,
            probabilities,
        })
    }

    /// One curve per threshold, in ascending threshold order.
    pub fn sweep(&self) -> Result<Vec<RecoveryCurve>, RecoveryError> {
        self.thresholds()?.map(|t| self.curve(t)).collect()
    }
}

fn validate_shape(groups: u32, shares_per_group: u32) -> Result<(), RecoveryError> {
    if groups < 1 {
        return Err(RecoveryError::InvalidParameter(format!(
            "group count must be at least 1, got r={groups}"
        )));
    }
    if shares_per_group < 2 {
        return Err(RecoveryError::InvalidParameter(format!(
            "shares per group must be at least 2, got s={shares_per_group}"
        )));
    }
    let total = groups as u64 * shares_per_group as u64;
    if total > MAX_TOTAL_SHARES {
        return Err(RecoveryError::InvalidParameter(format!(
            "total share count r·s={total} exceeds {MAX_TOTAL_SHARES}"
        )));
    }
    Ok(())
}

/// Raw counts `N(t, p)` for `p = 1 ..= r·s - 1`.
///
/// Terms with an undefined binomial are skipped. A defined coefficient is
/// never zero, so this matches skipping non-positive terms.
pub fn compute_distribution(
    groups: u32,
    shares_per_group: u32,
    threshold: u32,
) -> Result<Vec<BigInt>, RecoveryError> {
    validate_shape(groups, shares_per_group)?;
    if threshold < 2 || threshold > shares_per_group - 1 {
        return Err(RecoveryError::InvalidParameter(format!(
            "threshold must lie in 2..={}, got t={threshold}",
            shares_per_group - 1
        )));
    }

    let r = groups as i64;
    let s = shares_per_group as i64;
    let t = threshold as i64;

    let counts = (1..r * s)
        .map(|p| {
            let mut numerator = BigInt::zero();
            for i in 0..r {
                let Some(term1) = binomial(r, i) else {
                    continue;
                };
                let Some(term2) = binomial(p - r * t - i * (s - t + 1) + r - 1, r - 1) else {
                    continue;
                };
                let term = BigInt::from(term1 * term2);
                if sign(i as u32) > 0 {
                    numerator += term;
                } else {
                    numerator -= term;
                }
            }
            numerator
        })
        .collect();
    Ok(counts)
}

/// Divide every element by the sum of the sequence.
pub fn normalize(counts: &[BigInt]) -> Result<Vec<f64>, RecoveryError> {
    let total: BigInt = counts.iter().sum();
    if total.is_zero() {
        return Err(RecoveryError::DegenerateDistribution);
    }
    Ok(counts.iter().map(|c| ratio_to_f64(c, &total)).collect())
}

/// `N(t, p) / C(r·s, p)` for each `p`, `counts[0]` being `p = 1`.
pub fn per_point_probabilities(groups: u32, shares_per_group: u32, counts: &[BigInt]) -> Vec<f64> {
    let total = groups as i64 * shares_per_group as i64;
    counts
        .iter()
        .enumerate()
        .map(|(i, count)| match binomial(total, i as i64 + 1) {
            Some(denominator) => ratio_to_f64(count, &BigInt::from(denominator)),
            None => 0.0,
        })
        .collect()
}

fn ratio_to_f64(num: &BigInt, den: &BigInt) -> f64 {
    let excess = den.bits().saturating_sub(RATIO_BITS);
    let num = num >> excess;
    let den = den >> excess;
    match (num.to_f64(), den.to_f64()) {
        (Some(n), Some(d)) if d != 0.0 => n / d,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|&v| BigInt::from(v)).collect()
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            compute_distribution(0, 5, 2),
            Err(RecoveryError::InvalidParameter(_))
        ));
        assert!(matches!(
            compute_distribution(3, 1, 2),
            Err(RecoveryError::InvalidParameter(_))
        ));
        assert!(matches!(
            compute_distribution(3, 4, 4),
            Err(RecoveryError::InvalidParameter(_))
        ));
        assert!(matches!(
            compute_distribution(3, 4, 1),
            Err(RecoveryError::InvalidParameter(_))
        ));
    }

    #[test]
    fn oversized_shapes_are_rejected_before_computing() {
        assert!(matches!(
            compute_distribution(u32::MAX, u32::MAX, 2),
            Err(RecoveryError::InvalidParameter(_))
        ));
        assert!(matches!(
            RecoveryModel::new(1 << 11, 1 << 10, Normalization::Sum),
            Err(RecoveryError::InvalidParameter(_))
        ));
        assert!(RecoveryModel::new(1 << 10, 1 << 10, Normalization::Sum).is_ok());
    }

    #[test]
    fn empty_threshold_range_is_an_error() {
        let model = RecoveryModel::new(4, 2, Normalization::Sum).unwrap();
        assert!(matches!(
            model.sweep(),
            Err(RecoveryError::InvalidParameter(_))
        ));
    }

    #[test]
    fn normalize_rejects_zero_sum() {
        let counts = ints(&[0, 0, 0]);
        assert_eq!(
            normalize(&counts),
            Err(RecoveryError::DegenerateDistribution)
        );
    }

    #[test]
    fn normalize_divides_by_sum() {
        let probs = normalize(&ints(&[1, 3, 0, 4])).unwrap();
        assert_eq!(probs, vec![0.125, 0.375, 0.0, 0.5]);
    }

    #[test]
    fn ratio_survives_huge_operands() {
        let big = BigInt::from(1u8) << 3000u32;
        let half = &big >> 1u32;
        let ratio = ratio_to_f64(&half, &big);
        assert!((ratio - 0.5).abs() < 1e-12, "ratio {ratio}");
    }

    #[test]
    fn sweep_covers_every_threshold() {
        let model = RecoveryModel::new(3, 5, Normalization::Sum).unwrap();
        let curves = model.sweep().unwrap();
        let thresholds: Vec<u32> = curves.iter().map(|c| c.threshold).collect();
        assert_eq!(thresholds, vec![2, 3, 4]);
        for curve in &curves {
            assert_eq!(curve.counts.len(), 14);
            assert_eq!(curve.probabilities.len(), 14);
        }
    }
}
