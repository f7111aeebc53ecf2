//! Batch migration of a relational table into a document collection.
//!
//! [`MigrationPipeline`] drives one run: it connects both endpoints,
//! streams the table in fixed-size chunks, transforms every row for the
//! run's [`MigrationProfile`](citsm_core::transform::MigrationProfile) and
//! appends the resulting documents to the store.

pub mod config;
pub mod pipeline;
pub mod progress;
pub mod report;

pub use config::MigrationConfig;
pub use pipeline::{MigrationPipeline, MigrationPlan};
pub use progress::{ProgressReporter, TracingProgress};
pub use report::MigrationReport;
