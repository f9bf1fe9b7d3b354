//! Metrics/tracing hooks.
//!
//! Events go through `tracing` (bridged to `log` so a plain logger sees them).
//! With the `tracing` feature off every hook compiles to nothing.

use aggby_core::id::BatchId;
use aggby_core::manifest::RunManifest;

#[cfg(feature = "tracing")]
pub fn record_batch(batch: BatchId, records: usize, groups: usize) {
    let worker = rayon::current_thread_index();
    tracing::trace!(batch = batch.get(), ?worker, records, groups, "batch folded");
}

#[cfg(not(feature = "tracing"))]
pub fn record_batch(_batch: BatchId, _records: usize, _groups: usize) { /* no-op */
}

#[cfg(feature = "tracing")]
pub fn record_run(manifest: &RunManifest) {
    tracing::debug!(
        mode = %manifest.mode,
        style = %manifest.style,
        grouping = %manifest.grouping,
        records = manifest.records,
        groups = manifest.groups,
        batches = manifest.batches,
        workers = manifest.workers,
        duration_ms = manifest.duration_ms(),
        "aggregation run finished"
    );
}

#[cfg(not(feature = "tracing"))]
pub fn record_run(_manifest: &RunManifest) { /* no-op */
}

#[cfg(feature = "tracing")]
pub fn record_pool(event: &'static str, threads: usize) {
    tracing::debug!(threads, "worker pool {event}");
}

#[cfg(not(feature = "tracing"))]
pub fn record_pool(_event: &'static str, _threads: usize) { /* no-op */
}
