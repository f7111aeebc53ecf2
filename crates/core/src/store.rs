//! Seams between the migration pipeline and the two external stores.
//!
//! The relational warehouse and the document store are both reached
//! through these traits. Connectors open a fresh connection per run; the
//! returned handles are owned by that run and must be closed by it.

use async_trait::async_trait;

use crate::error::MigrationResult;
use crate::fields::TextIndexSpec;
use crate::table::{ColumnInfo, TableRef};
use crate::value::{Document, SourceRow};

// ---------------------------------------------------------------------------
// Relational side
// ---------------------------------------------------------------------------

/// An open connection to the relational source.
#[async_trait]
pub trait RelationalSource: Send {
    /// Describe the columns of `table` in declaration order.
    ///
    /// An unknown table yields an empty list rather than an error.
    async fn describe(&mut self, table: &TableRef) -> MigrationResult<Vec<ColumnInfo>>;

    /// Start a forward-only scan over every row of `table`, selecting
    /// `columns` in the given order.
    async fn open_scan(&mut self, table: &TableRef, columns: &[ColumnInfo]) -> MigrationResult<()>;

    /// Fetch up to `max_rows` rows from the open scan. An empty result
    /// means the scan is exhausted.
    async fn fetch_chunk(&mut self, max_rows: usize) -> MigrationResult<Vec<SourceRow>>;

    /// Release the connection. Failures are logged, not returned.
    async fn close(&mut self);
}

/// Opens [`RelationalSource`] connections.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    type Source: RelationalSource;

    async fn connect(&self) -> MigrationResult<Self::Source>;
}

// ---------------------------------------------------------------------------
// Document side
// ---------------------------------------------------------------------------

/// An open handle on one target collection.
#[async_trait]
pub trait DocumentStore: Send {
    /// Name of the collection documents are written to.
    fn collection_name(&self) -> &str;

    /// Insert `documents` as a single batch write and return how many were
    /// inserted. A failed call may have persisted a prefix of the batch.
    async fn insert_batch(&mut self, documents: Vec<Document>) -> MigrationResult<u64>;

    /// Create `spec` unless an identical index already exists.
    async fn ensure_text_index(&mut self, spec: &TextIndexSpec) -> MigrationResult<()>;

    /// Release the connection. Failures are logged, not returned.
    async fn close(&mut self);
}

/// Opens [`DocumentStore`] handles.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Store: DocumentStore;

    async fn connect(&self) -> MigrationResult<Self::Store>;
}
