//! Execution modes and accumulation styles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecMode {
    SerialEager,
    SerialLazy,
    ParallelEager,
    ParallelLazy,
}

impl ExecMode {
    pub const ALL: [ExecMode; 4] = [
        ExecMode::SerialEager,
        ExecMode::SerialLazy,
        ExecMode::ParallelEager,
        ExecMode::ParallelLazy,
    ];

    pub fn is_parallel(self) -> bool {
        matches!(self, ExecMode::ParallelEager | ExecMode::ParallelLazy)
    }

    pub fn is_lazy(self) -> bool {
        matches!(self, ExecMode::SerialLazy | ExecMode::ParallelLazy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecMode::SerialEager => "serial-eager",
            ExecMode::SerialLazy => "serial-lazy",
            ExecMode::ParallelEager => "parallel-eager",
            ExecMode::ParallelLazy => "parallel-lazy",
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('_', "-");
        ExecMode::ALL
            .into_iter()
            .find(|m| m.as_str() == norm)
            .ok_or(Error::Parse {
                kind: "execution mode",
                value: s.to_string(),
            })
    }
}

/// How per-key accumulators are updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulationStyle {
    /// Pure fold: `add(&acc, record) -> acc`, partials merged.
    Immutable,
    /// One accumulator per key mutated through `accept`; parallel runs share
    /// one map with a lock per accumulator.
    InPlace,
    /// Mutated through `accept` like `InPlace`, but parallel runs give every
    /// batch private accumulators and combine the partials, without locks.
    InPlaceReduce,
}

impl AccumulationStyle {
    pub const ALL: [AccumulationStyle; 3] = [
        AccumulationStyle::Immutable,
        AccumulationStyle::InPlace,
        AccumulationStyle::InPlaceReduce,
    ];

    pub fn is_in_place(self) -> bool {
        !matches!(self, AccumulationStyle::Immutable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccumulationStyle::Immutable => "immutable",
            AccumulationStyle::InPlace => "in-place",
            AccumulationStyle::InPlaceReduce => "in-place-reduce",
        }
    }
}

impl fmt::Display for AccumulationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccumulationStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "immutable" => Ok(AccumulationStyle::Immutable),
            "in-place" | "inplace" | "mutable" => Ok(AccumulationStyle::InPlace),
            "in-place-reduce" | "inplace-reduce" | "reduce" => Ok(AccumulationStyle::InPlaceReduce),
            _ => Err(Error::Parse {
                kind: "accumulation style",
                value: s.to_string(),
            }),
        }
    }
}
