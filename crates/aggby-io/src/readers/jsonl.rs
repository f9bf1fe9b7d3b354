//! Manifest log reader (one JSON object per line).

use std::io::BufRead;

use aggby_core::manifest::RunManifest;

use crate::error::Result;

/// Parse every non-blank line of a manifest log.
pub fn read_manifests<R: BufRead>(reader: R) -> Result<Vec<RunManifest>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}
