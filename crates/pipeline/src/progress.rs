//! Progress reporting for migration runs.

/// Receives a notification after every batch is persisted.
pub trait ProgressReporter: Send + Sync {
    /// `batch` is 1-based; `inserted` is the size of this batch and `total`
    /// the cumulative number of documents persisted so far.
    fn batch_loaded(&self, batch: u64, inserted: u64, total: u64);
}

/// Emits one `info` event per batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn batch_loaded(&self, batch: u64, inserted: u64, total: u64) {
        tracing::info!(batch, inserted, total, "{total} documents migrated");
    }
}
