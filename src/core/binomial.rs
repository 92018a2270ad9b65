// core/binomial.rs
// Exact binomial coefficients and inclusion–exclusion signs

use num_bigint::BigUint;
use num_traits::One;

/// Binomial coefficient C(n, k).
///
/// Returns `None` when the coefficient is undefined: a negative operand or
/// `k > n`. Callers skip undefined terms instead of treating them as zero.
/// Arbitrary precision, so `C(400, 200)` is exact.
pub fn binomial(n: i64, k: i64) -> Option<BigUint> {
    if n < 0 || k < 0 || k > n {
        return None;
    }
    let k = k.min(n - k) as u64;
    let n = n as u64;
    let mut acc = BigUint::one();
    for i in 0..k {
        // acc holds C(n, i) here; the division is exact.
        acc *= n - i;
        acc /= i + 1;
    }
    Some(acc)
}

/// Alternating sign `(-1)^k`.
#[inline]
pub fn sign(k: u32) -> i32 {
    if k % 2 == 0 { 1 } else { -1 }
}
