#![forbid(unsafe_code)]
//! aggby-ops: serial grouped aggregation.
//!
//! Design intent:
//! - Pure and synchronous: no pools, no threads. The exec crate reuses these
//!   folds per batch and merges the partials.
//! - Two accumulation styles: a functional fold (`add(&acc, record) -> acc`) and
//!   an in-place update (`accept(&mut acc, record)`).
//! - Results are either materialized (`HashMap`) or deferred behind a
//!   `LazyAggregation` that evaluates once, on first use.

pub mod aggregate;
pub mod lazy;
pub mod traits;
pub mod verify;

pub use aggregate::{aggregate_by, aggregate_in_place_by, merge_partials};
pub use lazy::{aggregate_by_lazy, aggregate_in_place_by_lazy, LazyAggregation};
pub use traits::{ApproxEq, Merge};
pub use verify::{verify_maps_equal, VerifyError};
