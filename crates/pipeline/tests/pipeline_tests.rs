//! Integration tests for [`MigrationPipeline`] driven by in-memory
//! endpoints.
//!
//! The fakes record every call so the tests can check batch sizing,
//! cumulative progress and that both connections are always released.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use citsm_core::error::{Endpoint, MigrationError, MigrationResult};
use citsm_core::fields::TextIndexSpec;
use citsm_core::store::{DocumentStore, RelationalSource, SourceConnector, StoreConnector};
use citsm_core::table::{ColumnInfo, TableRef};
use citsm_core::transform::MigrationProfile;
use citsm_core::value::{Document, SourceRow};
use citsm_pipeline::{MigrationPipeline, MigrationPlan, ProgressReporter};

// ---------------------------------------------------------------------------
// Fake relational source
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SourceLog {
    connected: bool,
    closed: bool,
    fetch_sizes: Vec<usize>,
}

#[derive(Clone)]
struct FakeSourceConnector {
    columns: Vec<ColumnInfo>,
    rows: Vec<SourceRow>,
    fail_connect: bool,
    log: Arc<Mutex<SourceLog>>,
}

impl FakeSourceConnector {
    fn new(columns: Vec<ColumnInfo>, rows: Vec<SourceRow>) -> Self {
        Self {
            columns,
            rows,
            fail_connect: false,
            log: Arc::default(),
        }
    }

    fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Self::new(Vec::new(), Vec::new())
        }
    }
}

struct FakeSource {
    columns: Vec<ColumnInfo>,
    pending: std::vec::IntoIter<SourceRow>,
    scanning: bool,
    log: Arc<Mutex<SourceLog>>,
}

#[async_trait]
impl SourceConnector for FakeSourceConnector {
    type Source = FakeSource;

    async fn connect(&self) -> MigrationResult<FakeSource> {
        if self.fail_connect {
            return Err(MigrationError::source_connection("listener refused the connection"));
        }
        self.log.lock().unwrap().connected = true;
        Ok(FakeSource {
            columns: self.columns.clone(),
            pending: self.rows.clone().into_iter(),
            scanning: false,
            log: Arc::clone(&self.log),
        })
    }
}

#[async_trait]
impl RelationalSource for FakeSource {
    async fn describe(&mut self, _table: &TableRef) -> MigrationResult<Vec<ColumnInfo>> {
        Ok(self.columns.clone())
    }

    async fn open_scan(
        &mut self,
        _table: &TableRef,
        _columns: &[ColumnInfo],
    ) -> MigrationResult<()> {
        self.scanning = true;
        Ok(())
    }

    async fn fetch_chunk(&mut self, max_rows: usize) -> MigrationResult<Vec<SourceRow>> {
        assert!(self.scanning, "fetch before open_scan");
        self.log.lock().unwrap().fetch_sizes.push(max_rows);
        Ok(self.pending.by_ref().take(max_rows).collect())
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().closed = true;
    }
}

// ---------------------------------------------------------------------------
// Fake document store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreLog {
    connected: bool,
    closed: bool,
    batches: Vec<Vec<Document>>,
}

impl StoreLog {
    fn documents(&self) -> impl Iterator<Item = &Document> {
        self.batches.iter().flatten()
    }
}

#[derive(Clone, Default)]
struct FakeStoreConnector {
    fail_connect: bool,
    /// 1-based batch number whose insert fails.
    fail_on_batch: Option<usize>,
    log: Arc<Mutex<StoreLog>>,
}

struct FakeStore {
    fail_on_batch: Option<usize>,
    log: Arc<Mutex<StoreLog>>,
}

#[async_trait]
impl StoreConnector for FakeStoreConnector {
    type Store = FakeStore;

    async fn connect(&self) -> MigrationResult<FakeStore> {
        if self.fail_connect {
            return Err(MigrationError::store_connection("server selection timeout"));
        }
        self.log.lock().unwrap().connected = true;
        Ok(FakeStore {
            fail_on_batch: self.fail_on_batch,
            log: Arc::clone(&self.log),
        })
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    fn collection_name(&self) -> &str {
        "ods_itsm"
    }

    async fn insert_batch(&mut self, documents: Vec<Document>) -> MigrationResult<u64> {
        let mut log = self.log.lock().unwrap();
        if self.fail_on_batch == Some(log.batches.len() + 1) {
            return Err(MigrationError::Write("E11000 duplicate key error".into()));
        }
        let count = documents.len() as u64;
        log.batches.push(documents);
        Ok(count)
    }

    async fn ensure_text_index(&mut self, _spec: &TextIndexSpec) -> MigrationResult<()> {
        Ok(())
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().closed = true;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<(u64, u64, u64)>>,
}

impl ProgressReporter for RecordingProgress {
    fn batch_loaded(&self, batch: u64, inserted: u64, total: u64) {
        self.events.lock().unwrap().push((batch, inserted, total));
    }
}

fn ticket_columns() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo::new("TICKET_SUBTICKET", "character varying"),
        ColumnInfo::new("RESUMO_TICKET", "character varying"),
        ColumnInfo::new("STATUS", "character varying"),
        ColumnInfo::new("DTABERTURA", "character varying"),
        ColumnInfo::new("DTFIM", "character varying"),
        ColumnInfo::new("DTULTIMAMODIFICACAO", "character varying"),
    ]
}

fn ticket_row(n: usize) -> SourceRow {
    let mut row = SourceRow::default();
    row.push("TICKET_SUBTICKET", format!("{n}-1"));
    row.push("RESUMO_TICKET", "  Erro ao emitir guia  ");
    row.push("STATUS", "Aberto");
    row.push("DTABERTURA", "03/01/2025 09:15:00");
    row.push("DTFIM", "None");
    row.push("DTULTIMAMODIFICACAO", "2025-01-04 10:00:00");
    row
}

fn ticket_rows(count: usize) -> Vec<SourceRow> {
    (1..=count).map(ticket_row).collect()
}

fn plan(batch_size: usize) -> MigrationPlan {
    MigrationPlan::new(
        TableRef::parse("dwitsm.ods_itsm").unwrap(),
        MigrationProfile::Tickets,
        batch_size,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Test: batching and progress
// ---------------------------------------------------------------------------

/// 2500 rows with a batch size of 1000 load as 1000, 1000 and 500 with
/// cumulative progress after each batch.
#[tokio::test]
async fn rows_load_in_batches_with_cumulative_progress() {
    let source = FakeSourceConnector::new(ticket_columns(), ticket_rows(2500));
    let store = FakeStoreConnector::default();
    let progress = RecordingProgress::default();

    let pipeline = MigrationPipeline::new(source.clone(), store.clone(), plan(1000));
    let report = pipeline.run_with_progress(&progress).await.unwrap();

    assert_eq!(report.documents, 2500);
    assert_eq!(report.batches, 3);
    assert_eq!(report.collection, "ods_itsm");

    let sizes: Vec<usize> = store.log.lock().unwrap().batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![1000, 1000, 500]);

    assert_eq!(
        *progress.events.lock().unwrap(),
        vec![(1, 1000, 1000), (2, 1000, 2000), (3, 500, 2500)]
    );
    assert_eq!(source.log.lock().unwrap().fetch_sizes, vec![1000; 4]);
}

/// An exact multiple of the batch size produces no trailing empty insert.
#[tokio::test]
async fn exact_multiple_produces_no_empty_batch() {
    let source = FakeSourceConnector::new(ticket_columns(), ticket_rows(20));
    let store = FakeStoreConnector::default();

    let report = MigrationPipeline::new(source, store.clone(), plan(10))
        .run()
        .await
        .unwrap();

    assert_eq!(report.batches, 2);
    let log = store.log.lock().unwrap();
    assert!(log.batches.iter().all(|b| b.len() == 10));
}

#[test]
fn zero_batch_size_is_rejected() {
    let table = TableRef::parse("ods_itsm").unwrap();
    assert_matches!(
        MigrationPlan::new(table, MigrationProfile::Tickets, 0),
        Err(MigrationError::Config(_))
    );
}

// ---------------------------------------------------------------------------
// Test: document shape
// ---------------------------------------------------------------------------

/// A literal `None` date becomes null; parseable dates become timestamps and
/// trimmed fields lose their surrounding whitespace.
#[tokio::test]
async fn documents_carry_analysis_block() {
    let source = FakeSourceConnector::new(ticket_columns(), ticket_rows(1));
    let store = FakeStoreConnector::default();

    MigrationPipeline::new(source, store.clone(), plan(1000))
        .run()
        .await
        .unwrap();

    let log = store.log.lock().unwrap();
    let doc = log.documents().next().unwrap();

    assert_eq!(doc.get("RESUMO_TICKET").and_then(|v| v.as_text()), Some("Erro ao emitir guia"));
    assert_eq!(doc.keys().last(), Some("ia_analysis_ready"));

    let block = doc.get("ia_analysis_ready").and_then(|v| v.as_map()).unwrap();
    assert_eq!(
        block.get("dt_abertura_iso").and_then(|v| v.as_timestamp()).map(|t| t.to_rfc3339()),
        Some("2025-01-03T09:15:00+00:00".to_string())
    );
    assert!(block.get("dt_fim_iso").unwrap().is_null());
    assert!(block.get("dt_modificacao_iso").and_then(|v| v.as_timestamp()).is_some());
    assert!(block.get("timestamp_migracao").and_then(|v| v.as_timestamp()).is_some());
}

/// The cube profile copies rows as they are.
#[tokio::test]
async fn cube_profile_copies_verbatim() {
    let columns = vec![
        ColumnInfo::new("REGIAO", "character varying"),
        ColumnInfo::new("TOTAL", "bigint"),
    ];
    let mut row = SourceRow::default();
    row.push("REGIAO", "  Norte ");
    row.push("TOTAL", 42_i64);

    let source = FakeSourceConnector::new(columns, vec![row]);
    let store = FakeStoreConnector::default();
    let table = TableRef::parse("cubo_pericia").unwrap();
    let plan = MigrationPlan::new(table, MigrationProfile::Cube, 100).unwrap();

    MigrationPipeline::new(source, store.clone(), plan).run().await.unwrap();

    let log = store.log.lock().unwrap();
    let doc = log.documents().next().unwrap();
    assert_eq!(doc.len(), 2);
    assert_eq!(doc.get("REGIAO").and_then(|v| v.as_text()), Some("  Norte "));
    assert!(!doc.contains_key("ia_analysis_ready"));
}

// ---------------------------------------------------------------------------
// Test: empty and missing tables
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_table_succeeds_with_nothing_inserted() {
    let source = FakeSourceConnector::new(ticket_columns(), Vec::new());
    let store = FakeStoreConnector::default();

    let report = MigrationPipeline::new(source.clone(), store.clone(), plan(1000))
        .run()
        .await
        .unwrap();

    assert_eq!(report.documents, 0);
    assert_eq!(report.batches, 0);
    assert!(store.log.lock().unwrap().batches.is_empty());
    assert!(source.log.lock().unwrap().closed);
    assert!(store.log.lock().unwrap().closed);
}

#[tokio::test]
async fn table_without_columns_is_a_source_error() {
    let source = FakeSourceConnector::new(Vec::new(), Vec::new());
    let store = FakeStoreConnector::default();

    let err = MigrationPipeline::new(source.clone(), store.clone(), plan(1000))
        .run()
        .await
        .unwrap_err();

    assert_matches!(err, MigrationError::SourceRead(msg) if msg.contains("not found"));
    assert!(source.log.lock().unwrap().closed);
    assert!(store.log.lock().unwrap().closed);
}

// ---------------------------------------------------------------------------
// Test: failures
// ---------------------------------------------------------------------------

/// An unreachable source aborts before anything is written.
#[tokio::test]
async fn source_connect_failure_writes_nothing() {
    let store = FakeStoreConnector::default();

    let err = MigrationPipeline::new(FakeSourceConnector::unreachable(), store.clone(), plan(1000))
        .run()
        .await
        .unwrap_err();

    assert_matches!(
        err,
        MigrationError::Connection {
            endpoint: Endpoint::RelationalSource,
            ..
        }
    );
    let log = store.log.lock().unwrap();
    assert!(log.batches.is_empty());
    assert!(!log.connected || log.closed);
}

/// A store that cannot be reached still releases the source connection.
#[tokio::test]
async fn store_connect_failure_closes_source() {
    let source = FakeSourceConnector::new(ticket_columns(), ticket_rows(5));
    let store = FakeStoreConnector {
        fail_connect: true,
        ..Default::default()
    };

    let err = MigrationPipeline::new(source.clone(), store, plan(1000))
        .run()
        .await
        .unwrap_err();

    assert_matches!(
        err,
        MigrationError::Connection {
            endpoint: Endpoint::DocumentStore,
            ..
        }
    );
    let log = source.log.lock().unwrap();
    assert!(log.connected);
    assert!(log.closed);
    assert!(log.fetch_sizes.is_empty());
}

/// A failed insert stops the run and reports what was already persisted.
#[tokio::test]
async fn load_failure_stops_run_and_reports_persisted() {
    let source = FakeSourceConnector::new(ticket_columns(), ticket_rows(35));
    let store = FakeStoreConnector {
        fail_on_batch: Some(3),
        ..Default::default()
    };
    let progress = RecordingProgress::default();

    let err = MigrationPipeline::new(source.clone(), store.clone(), plan(10))
        .run_with_progress(&progress)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        MigrationError::Load { batch: 3, persisted: 20, ref message } if message.contains("E11000")
    );
    assert_eq!(progress.events.lock().unwrap().len(), 2);
    assert_eq!(source.log.lock().unwrap().fetch_sizes.len(), 3);
    assert!(source.log.lock().unwrap().closed);
    assert!(store.log.lock().unwrap().closed);
}

/// A source column spelled like the reserved analysis field aborts the
/// ticket migration before any row is read.
#[tokio::test]
async fn reserved_field_collision_is_rejected() {
    let mut columns = ticket_columns();
    columns.push(ColumnInfo::new("IA_ANALYSIS_READY", "character varying"));
    let source = FakeSourceConnector::new(columns, ticket_rows(3));
    let store = FakeStoreConnector::default();

    let err = MigrationPipeline::new(source.clone(), store.clone(), plan(1000))
        .run()
        .await
        .unwrap_err();

    assert_matches!(err, MigrationError::Transformation(_));
    assert!(source.log.lock().unwrap().fetch_sizes.is_empty());
    assert!(store.log.lock().unwrap().batches.is_empty());
    assert!(store.log.lock().unwrap().closed);
}
