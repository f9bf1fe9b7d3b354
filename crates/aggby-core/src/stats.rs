//! Per-key summary statistics: the two accumulator styles.
//!
//! `MarketValueStats` is an immutable value; every `add` returns a new one and
//! partials combine with `merge`. `MarketValueAccumulator` is created once per
//! key and updated in place through `accept`; its sum is compensated (Kahan) so
//! long runs of small values do not drift.

use serde::{Deserialize, Serialize};

/// A record exposing the numeric measure being summarized.
pub trait Measured {
    fn measure(&self) -> f64;
}

impl Measured for f64 {
    fn measure(&self) -> f64 {
        *self
    }
}

impl<T: Measured + ?Sized> Measured for &T {
    fn measure(&self) -> f64 {
        (**self).measure()
    }
}

/// `true` when both floats are the same value under a total order
/// (so `+inf == +inf` and `NaN == NaN`, but `0.0 != -0.0`).
fn same_float(a: f64, b: f64) -> bool {
    a.total_cmp(&b).is_eq()
}

fn sums_close(a: f64, b: f64, tolerance: f64) -> bool {
    if a.is_finite() && b.is_finite() {
        (a - b).abs() <= tolerance
    } else {
        same_float(a, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketValueStats {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl MarketValueStats {
    /// Identity for `add` and `merge`.
    pub const ZERO: Self = Self {
        count: 0,
        sum: 0.0,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    pub const fn new(count: u64, sum: f64, min: f64, max: f64) -> Self {
        Self {
            count,
            sum,
            min,
            max,
        }
    }

    pub fn add<R: Measured + ?Sized>(&self, record: &R) -> Self {
        self.add_value(record.measure())
    }

    pub fn add_value(&self, value: f64) -> Self {
        Self {
            count: self.count + 1,
            sum: self.sum + value,
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    /// Combine two partials. Associative and commutative up to summation order.
    pub fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Exact on count, min and max; within `tolerance` on sum.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.count == other.count
            && same_float(self.min, other.min)
            && same_float(self.max, other.max)
            && sums_close(self.sum, other.sum, tolerance)
    }
}

impl Default for MarketValueStats {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Mutable per-key accumulator updated through `accept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketValueAccumulator {
    count: u64,
    sum: f64,
    compensation: f64,
    // Uncompensated sum, used when the compensated one degenerates to NaN
    // because of infinities.
    simple_sum: f64,
    min: f64,
    max: f64,
}

impl Default for MarketValueAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketValueAccumulator {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            compensation: 0.0,
            simple_sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn accept<R: Measured + ?Sized>(&mut self, record: &R) {
        self.accept_value(record.measure());
    }

    pub fn accept_value(&mut self, value: f64) {
        self.count += 1;
        self.simple_sum += value;
        self.add_compensated(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Fold another accumulator into this one.
    pub fn combine(&mut self, other: &Self) {
        self.count += other.count;
        self.simple_sum += other.simple_sum;
        self.add_compensated(other.sum);
        self.add_compensated(-other.compensation);
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    fn add_compensated(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        let total = self.sum - self.compensation;
        if total.is_nan() && self.simple_sum.is_infinite() {
            self.simple_sum
        } else {
            total
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum() / self.count as f64
        }
    }

    /// Immutable view of the current totals.
    pub fn snapshot(&self) -> MarketValueStats {
        MarketValueStats {
            count: self.count,
            sum: self.sum(),
            min: self.min,
            max: self.max,
        }
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.snapshot().approx_eq(&other.snapshot(), tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(values: &[f64]) -> MarketValueStats {
        values
            .iter()
            .fold(MarketValueStats::ZERO, |acc, v| acc.add(v))
    }

    #[test]
    fn zero_is_the_identity() {
        let s = fold(&[4.0, 2.0]);
        assert_eq!(s.merge(MarketValueStats::ZERO), s);
        assert_eq!(MarketValueStats::ZERO.merge(s), s);
        assert!(MarketValueStats::ZERO.is_empty());
        assert_eq!(MarketValueStats::ZERO.average(), 0.0);
    }

    #[test]
    fn add_tracks_count_sum_min_max() {
        let a = fold(&[1.0, 2.0, 3.0]);
        assert_eq!(a, MarketValueStats::new(3, 6.0, 1.0, 3.0));
        let b = fold(&[10.0, 20.0]);
        assert_eq!(b, MarketValueStats::new(2, 30.0, 10.0, 20.0));
        assert_eq!(b.average(), 15.0);
    }

    #[test]
    fn merge_of_halves_equals_whole() {
        let whole = fold(&[5.0, 1.0, 9.0, 3.0]);
        let merged = fold(&[5.0, 1.0]).merge(fold(&[9.0, 3.0]));
        assert_eq!(merged, whole);
    }

    #[test]
    fn approx_eq_is_exact_except_for_sum() {
        let a = MarketValueStats::new(2, 10.0, 1.0, 9.0);
        let close = MarketValueStats::new(2, 10.00005, 1.0, 9.0);
        let far = MarketValueStats::new(2, 10.1, 1.0, 9.0);
        let other_count = MarketValueStats::new(3, 10.0, 1.0, 9.0);
        assert!(a.approx_eq(&close, 1e-4));
        assert!(!a.approx_eq(&far, 1e-4));
        assert!(!a.approx_eq(&other_count, 1.0));
        assert!(MarketValueStats::ZERO.approx_eq(&MarketValueStats::ZERO, 0.0));
    }

    #[test]
    fn accumulator_matches_immutable_fold() {
        let values = [1.0, 2.0, 3.0, 10.0, 20.0];
        let mut acc = MarketValueAccumulator::new();
        for v in &values {
            acc.accept(v);
        }
        assert_eq!(acc.count(), 5);
        assert_eq!(acc.min(), 1.0);
        assert_eq!(acc.max(), 20.0);
        assert!(acc.snapshot().approx_eq(&fold(&values), 1e-12));
        assert_eq!(acc.average(), 36.0 / 5.0);
    }

    #[test]
    fn compensated_sum_beats_naive_summation() {
        let mut acc = MarketValueAccumulator::new();
        let mut naive = 0.0;
        for _ in 0..10_000 {
            acc.accept_value(0.1);
            naive += 0.1;
        }
        assert!((acc.sum() - 1_000.0).abs() <= (naive - 1_000.0_f64).abs());
        assert!((acc.sum() - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn combine_merges_partials() {
        let mut left = MarketValueAccumulator::new();
        let mut right = MarketValueAccumulator::new();
        left.accept_value(4.0);
        right.accept_value(-2.0);
        right.accept_value(8.0);
        left.combine(&right);
        assert_eq!(left.snapshot(), MarketValueStats::new(3, 10.0, -2.0, 8.0));
    }

    #[test]
    fn infinite_values_do_not_turn_sum_into_nan() {
        let mut acc = MarketValueAccumulator::new();
        acc.accept_value(f64::INFINITY);
        acc.accept_value(1.0);
        assert_eq!(acc.sum(), f64::INFINITY);
    }
}
