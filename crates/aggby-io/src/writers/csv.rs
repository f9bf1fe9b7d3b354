//! CSV writers: position files (same layout the reader expects) and per-key
//! result tables.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use aggby_core::mode::{AccumulationStyle, ExecMode};
use aggby_core::position::{GroupKey, Grouping, Position};
use aggby_core::stats::MarketValueStats;

use crate::error::Result;

#[derive(Serialize)]
struct PositionRow<'a> {
    account: &'a str,
    product: &'a str,
    category: &'a str,
    price: f64,
    quantity: u32,
}

pub struct PositionCsvWriter<W: Write> {
    wtr: csv::Writer<W>,
}

impl PositionCsvWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            wtr: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: Write> PositionCsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            wtr: csv::Writer::from_writer(writer),
        }
    }

    pub fn write_all(&mut self, positions: &[Position]) -> Result<()> {
        for p in positions {
            self.wtr.serialize(PositionRow {
                account: p.account().name(),
                product: p.product().name(),
                category: p.category(),
                price: p.product().price(),
                quantity: p.quantity(),
            })?;
        }
        self.wtr.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct StatsRow<'a> {
    mode: ExecMode,
    style: AccumulationStyle,
    grouping: Grouping,
    key: &'a str,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    average: f64,
}

/// Result table: one row per (run, key), keys in ascending order.
pub struct StatsCsvWriter<W: Write> {
    wtr: csv::Writer<W>,
}

impl StatsCsvWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            wtr: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: Write> StatsCsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            wtr: csv::Writer::from_writer(writer),
        }
    }

    pub fn write_result(
        &mut self,
        mode: ExecMode,
        style: AccumulationStyle,
        grouping: Grouping,
        result: &HashMap<GroupKey, MarketValueStats>,
    ) -> Result<()> {
        let mut keys: Vec<&GroupKey> = result.keys().collect();
        keys.sort();
        for key in keys {
            let stats = &result[key];
            self.wtr.serialize(StatsRow {
                mode,
                style,
                grouping,
                key: key.name(),
                count: stats.count,
                sum: stats.sum,
                min: stats.min,
                max: stats.max,
                average: stats.average(),
            })?;
        }
        self.wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn stats_rows_are_sorted_by_key() {
        let mut result = HashMap::new();
        result.insert(
            GroupKey::Category(Arc::from("B")),
            MarketValueStats::new(2, 30.0, 10.0, 20.0),
        );
        result.insert(
            GroupKey::Category(Arc::from("A")),
            MarketValueStats::new(3, 6.0, 1.0, 3.0),
        );
        let mut buf = Vec::new();
        {
            let mut w = StatsCsvWriter::to_writer(&mut buf);
            w.write_result(
                ExecMode::ParallelEager,
                AccumulationStyle::InPlace,
                Grouping::Category,
                &result,
            )
            .unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "mode,style,grouping,key,count,sum,min,max,average"
        );
        assert_eq!(lines[1], "parallel-eager,in-place,category,A,3,6.0,1.0,3.0,2.0");
        assert_eq!(lines[2], "parallel-eager,in-place,category,B,2,30.0,10.0,20.0,15.0");
    }
}
