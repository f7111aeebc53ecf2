use std::time::Duration;

use citsm_core::transform::MigrationProfile;

/// Outcome of a successful migration run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationReport {
    pub profile: MigrationProfile,
    /// Source table, as displayed.
    pub table: String,
    pub collection: String,
    pub batches: u64,
    pub documents: u64,
    pub elapsed: Duration,
}

impl MigrationReport {
    /// One-line human-readable summary naming the target collection.
    pub fn summary(&self) -> String {
        format!(
            "Migration complete: {} documents from {} into collection '{}' in {} batches ({:.1}s)",
            self.documents,
            self.table,
            self.collection,
            self.batches,
            self.elapsed.as_secs_f64(),
        )
    }

    pub fn log_summary(&self) {
        tracing::info!(
            profile = %self.profile,
            table = %self.table,
            collection = %self.collection,
            batches = self.batches,
            documents = self.documents,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}",
            self.summary(),
        );
    }
}
