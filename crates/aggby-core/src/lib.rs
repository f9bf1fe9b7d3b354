#![forbid(unsafe_code)]
//! aggby-core: pure data for grouped aggregation.
//!
//! Records (positions), their grouping keys and pools, the summary statistics
//! accumulators, configuration, ids, digests, and the run manifest. Threads,
//! pools, and I/O live in the exec and io crates; nothing here spawns or blocks.

pub mod config;
pub mod error;
pub mod generate;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod mode;
pub mod pool;
pub mod position;
pub mod prelude;
pub mod stats;

/// Crate version recorded in every run manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
