//! Streaming NDJSON manifest writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use aggby_core::manifest::RunManifest;

use crate::error::Result;

pub struct ManifestWriter<W: Write> {
    writer: BufWriter<W>,
}

impl ManifestWriter<File> {
    /// Append to `path`, creating it if needed.
    pub fn append_to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> ManifestWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Write one manifest as a single line.
    pub fn write(&mut self, manifest: &RunManifest) -> Result<()> {
        let line = serde_json::to_string(manifest)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::jsonl::read_manifests;
    use aggby_core::mode::{AccumulationStyle, ExecMode};
    use aggby_core::position::Grouping;

    #[test]
    fn manifests_are_one_per_line() {
        let mut buf = Vec::new();
        {
            let mut w = ManifestWriter::to_writer(&mut buf);
            for mode in ExecMode::ALL {
                let m = RunManifest::new(mode, AccumulationStyle::Immutable, Grouping::Product, 5, 1)
                    .finish(2, 3, None);
                w.write(&m).unwrap();
            }
        }
        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().count(), 4);

        let back = read_manifests(buf.as_slice()).unwrap();
        let modes: Vec<_> = back.iter().map(|m| m.mode).collect();
        assert_eq!(modes, ExecMode::ALL.to_vec());
        assert!(back.iter().all(|m| m.groups == 3));
    }
}
