//! Accumulator capabilities the aggregation paths rely on.
//!
//! The parallel fold needs `Merge` to combine per-batch partials; result
//! comparison across modes needs `ApproxEq`.

use aggby_core::stats::{MarketValueAccumulator, MarketValueStats};

/// Combine two partial accumulators for the same key.
///
/// Implementations must be associative and commutative (up to floating-point
/// summation order), since partials are reduced in whatever order batches finish.
pub trait Merge: Sized {
    fn merge(self, other: Self) -> Self;
}

/// Equality with a tolerance on floating-point sums.
pub trait ApproxEq {
    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool;
}

impl Merge for MarketValueStats {
    fn merge(self, other: Self) -> Self {
        MarketValueStats::merge(self, other)
    }
}

impl Merge for MarketValueAccumulator {
    fn merge(mut self, other: Self) -> Self {
        self.combine(&other);
        self
    }
}

impl ApproxEq for MarketValueStats {
    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        MarketValueStats::approx_eq(self, other, tolerance)
    }
}

impl ApproxEq for MarketValueAccumulator {
    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        MarketValueAccumulator::approx_eq(self, other, tolerance)
    }
}

macro_rules! exact_approx_eq {
    ($($t:ty),*) => {
        $(impl ApproxEq for $t {
            fn approx_eq(&self, other: &Self, _tolerance: f64) -> bool {
                self == other
            }
        })*
    };
}

exact_approx_eq!(u32, u64, usize, i32, i64);

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self - other).abs() <= tolerance || self.total_cmp(other).is_eq()
    }
}

macro_rules! additive_merge {
    ($($t:ty),*) => {
        $(impl Merge for $t {
            fn merge(self, other: Self) -> Self {
                self + other
            }
        })*
    };
}

additive_merge!(u32, u64, usize, i32, i64, f64);
