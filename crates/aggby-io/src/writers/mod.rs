//! Writers for position files, result tables, and manifest logs.

pub mod csv;
pub mod jsonl;
