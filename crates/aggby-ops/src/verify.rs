//! Cross-mode result verification.
//!
//! Key sets must match exactly. Accumulators are compared with `ApproxEq`, so
//! summed measures may differ by the tolerance while counts and extrema may not.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

use crate::traits::ApproxEq;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    #[error("key {key} missing from actual result")]
    MissingKey { key: String },

    #[error("unexpected key {key} in actual result")]
    UnexpectedKey { key: String },

    #[error("size mismatch: expected {expected} keys, actual {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("value mismatch for key {key}: expected {expected}, actual {actual} (tolerance {tolerance})")]
    ValueMismatch {
        key: String,
        expected: String,
        actual: String,
        tolerance: f64,
    },
}

/// Check that both mappings have exactly the same keys.
pub fn verify_same_keys<K, A, B>(
    expected: &HashMap<K, A>,
    actual: &HashMap<K, B>,
) -> Result<(), VerifyError>
where
    K: Eq + Hash + Debug,
{
    if let Some(key) = expected.keys().find(|k| !actual.contains_key(*k)) {
        return Err(VerifyError::MissingKey {
            key: format!("{key:?}"),
        });
    }
    if let Some(key) = actual.keys().find(|k| !expected.contains_key(*k)) {
        return Err(VerifyError::UnexpectedKey {
            key: format!("{key:?}"),
        });
    }
    if expected.len() != actual.len() {
        return Err(VerifyError::SizeMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(())
}

/// Check same keys and per-key `approx_eq` within `tolerance`.
pub fn verify_maps_equal<K, A>(
    expected: &HashMap<K, A>,
    actual: &HashMap<K, A>,
    tolerance: f64,
) -> Result<(), VerifyError>
where
    K: Eq + Hash + Debug,
    A: ApproxEq + Debug,
{
    verify_same_keys(expected, actual)?;
    for (key, want) in expected {
        // Presence was checked above.
        let Some(got) = actual.get(key) else {
            continue;
        };
        if !want.approx_eq(got, tolerance) {
            return Err(VerifyError::ValueMismatch {
                key: format!("{key:?}"),
                expected: format!("{want:?}"),
                actual: format!("{got:?}"),
                tolerance,
            });
        }
    }
    Ok(())
}
