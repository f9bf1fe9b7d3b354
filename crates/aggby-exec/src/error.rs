use thiserror::Error;

use aggby_core::mode::ExecMode;
use aggby_ops::VerifyError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("worker pool build failed: {0}")]
    PoolBuild(String),

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("worker pool shutdown timed out after {timeout_ms}ms with {live} workers still running")]
    ShutdownTimeout { live: usize, timeout_ms: u64 },

    #[error("{mode} result differs from serial-eager baseline: {source}")]
    Verify {
        mode: ExecMode,
        #[source]
        source: VerifyError,
    },

    #[error("hashing error: {0}")]
    Hash(String),
}

impl From<aggby_core::error::Error> for ExecError {
    fn from(e: aggby_core::error::Error) -> Self {
        match e {
            aggby_core::error::Error::Hash(msg) => ExecError::Hash(msg),
            other => ExecError::Config(other.to_string()),
        }
    }
}
