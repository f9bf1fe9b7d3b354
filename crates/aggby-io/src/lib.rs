//! aggby-io: CSV position files, result tables, and JSONL run manifests.

pub mod error;
pub mod readers;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::PositionCsvReader;
pub use readers::jsonl::read_manifests;
pub use writers::csv::{PositionCsvWriter, StatsCsvWriter};
pub use writers::jsonl::ManifestWriter;
