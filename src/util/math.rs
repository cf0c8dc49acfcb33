//! Scalar helpers shared by the decode and ranking stages.

use std::cmp::Ordering;

/// Clamps `value` into `[0, upper]`, mapping NaN to zero.
#[inline]
pub(crate) fn clamp_unit_range(value: f64, upper: f64) -> f64 {
    value.max(0.0).min(upper)
}

/// Ranking key that sorts NaN below every other value.
#[inline]
pub(crate) fn rank_key(prob: f64) -> f64 {
    if prob.is_nan() {
        f64::NEG_INFINITY
    } else {
        prob
    }
}

/// Descending order on probabilities; a total order even with NaN inputs.
#[inline]
pub(crate) fn prob_cmp_desc(a: f64, b: f64) -> Ordering {
    rank_key(b).total_cmp(&rank_key(a))
}
