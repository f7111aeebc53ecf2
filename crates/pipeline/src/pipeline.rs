//! The migration run itself.
//!
//! A run is strictly sequential: each chunk is fetched, transformed and
//! inserted before the next fetch is issued, so at most one batch is held in
//! memory. Nothing is retried. A failed insert stops the run and reports how
//! many documents earlier batches already persisted; those are not rolled
//! back.

use std::time::Instant;

use chrono::Utc;
use citsm_core::error::{MigrationError, MigrationResult};
use citsm_core::store::{DocumentStore, RelationalSource, SourceConnector, StoreConnector};
use citsm_core::table::TableRef;
use citsm_core::transform::{MigrationProfile, RowTransform};

use crate::config::MigrationConfig;
use crate::progress::{ProgressReporter, TracingProgress};
use crate::report::MigrationReport;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// What to migrate: source table, row profile and chunk size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub table: TableRef,
    pub profile: MigrationProfile,
    pub batch_size: usize,
}

impl MigrationPlan {
    pub fn new(
        table: TableRef,
        profile: MigrationProfile,
        batch_size: usize,
    ) -> MigrationResult<Self> {
        if batch_size == 0 {
            return Err(MigrationError::Config(
                "Batch size must be greater than zero".into(),
            ));
        }
        Ok(Self {
            table,
            profile,
            batch_size,
        })
    }

    /// The ticket migration described by `config`.
    pub fn tickets(config: &MigrationConfig) -> Self {
        Self {
            table: config.source_table.clone(),
            profile: MigrationProfile::Tickets,
            batch_size: config.batch_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct MigrationPipeline<C, D> {
    source: C,
    store: D,
    plan: MigrationPlan,
}

impl<C, D> MigrationPipeline<C, D>
where
    C: SourceConnector,
    D: StoreConnector,
{
    pub fn new(source: C, store: D, plan: MigrationPlan) -> Self {
        Self {
            source,
            store,
            plan,
        }
    }

    pub fn plan(&self) -> &MigrationPlan {
        &self.plan
    }

    /// Run the migration, logging progress through `tracing`.
    pub async fn run(&self) -> MigrationResult<MigrationReport> {
        self.run_with_progress(&TracingProgress).await
    }

    /// Run the migration, notifying `progress` after every persisted batch.
    ///
    /// Both connections are closed before this returns, whatever the
    /// outcome. Failures are returned, not logged.
    pub async fn run_with_progress(
        &self,
        progress: &dyn ProgressReporter,
    ) -> MigrationResult<MigrationReport> {
        let started = Instant::now();
        tracing::info!(
            table = %self.plan.table,
            profile = %self.plan.profile,
            batch_size = self.plan.batch_size,
            "Starting migration",
        );

        let mut report = self.connect_and_transfer(progress).await?;
        report.elapsed = started.elapsed();
        report.log_summary();
        Ok(report)
    }

    async fn connect_and_transfer(
        &self,
        progress: &dyn ProgressReporter,
    ) -> MigrationResult<MigrationReport> {
        let mut source = self.source.connect().await?;
        let mut store = match self.store.connect().await {
            Ok(store) => store,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        let result = self.transfer(&mut source, &mut store, progress).await;

        source.close().await;
        store.close().await;
        result
    }

    async fn transfer(
        &self,
        source: &mut C::Source,
        store: &mut D::Store,
        progress: &dyn ProgressReporter,
    ) -> MigrationResult<MigrationReport> {
        let table = &self.plan.table;

        let columns = source.describe(table).await?;
        if columns.is_empty() {
            return Err(MigrationError::SourceRead(format!(
                "Table {table} not found or has no columns"
            )));
        }
        tracing::info!(table = %table, columns = columns.len(), "Discovered source columns");

        let transform = RowTransform::for_profile(self.plan.profile, &columns)?;
        source.open_scan(table, &columns).await?;

        let mut batches: u64 = 0;
        let mut persisted: u64 = 0;
        loop {
            let rows = source.fetch_chunk(self.plan.batch_size).await?;
            if rows.is_empty() {
                break;
            }
            batches += 1;

            let documents = transform.apply_all(rows, Utc::now());
            let inserted = store
                .insert_batch(documents)
                .await
                .map_err(|e| MigrationError::Load {
                    batch: batches,
                    persisted,
                    message: match e {
                        MigrationError::Write(message) => message,
                        other => other.to_string(),
                    },
                })?;

            persisted += inserted;
            progress.batch_loaded(batches, inserted, persisted);
        }

        Ok(MigrationReport {
            profile: self.plan.profile,
            table: table.to_string(),
            collection: store.collection_name().to_string(),
            batches,
            documents: persisted,
            elapsed: Default::default(),
        })
    }
}
