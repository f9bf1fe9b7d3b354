//! Stable digests for aggregation results and manifests.

use blake3::Hasher;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Digest a key → value mapping independently of its iteration order.
///
/// Entries are sorted by key before hashing, so two maps with bit-identical
/// contents digest the same no matter how they were built. Values that only
/// agree within a tolerance generally digest differently.
pub fn digest_entries<'a, K, V, I>(entries: I) -> Result<Hash256>
where
    K: Serialize + Ord + 'a,
    V: Serialize + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let mut sorted: Vec<(&K, &V)> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut h = Hasher::new();
    h.update(&(sorted.len() as u64).to_le_bytes());
    for entry in &sorted {
        let bytes = serde_json::to_vec(entry)?;
        h.update(&(bytes.len() as u64).to_le_bytes());
        h.update(&bytes);
    }
    Ok(Hash256(h.finalize().into()))
}
