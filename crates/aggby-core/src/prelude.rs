//! Convenient re-exports for downstream crates.

pub use crate::config::{AggConfig, ConfigOverrides};
pub use crate::error::{Error, Result};
pub use crate::generate::PositionGenerator;
pub use crate::hash::{digest_entries, Hash256};
pub use crate::id::{BatchId, WorkerId};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::mode::{AccumulationStyle, ExecMode};
pub use crate::pool::KeyPool;
pub use crate::position::{Account, GroupKey, Grouping, Position, Product};
pub use crate::stats::{MarketValueAccumulator, MarketValueStats, Measured};
