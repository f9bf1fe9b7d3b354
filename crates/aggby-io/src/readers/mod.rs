//! Readers for position files and manifest logs.

pub mod csv;
pub mod jsonl;
