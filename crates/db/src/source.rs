//! [`RelationalSource`] implementation over a single PostgreSQL connection.

use std::str::FromStr;

use async_trait::async_trait;
use citsm_core::error::{MigrationError, MigrationResult};
use citsm_core::store::{RelationalSource, SourceConnector};
use citsm_core::table::{ColumnInfo, TableRef};
use citsm_core::value::SourceRow;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, Executor, PgConnection};

use crate::{catalog, decode, sql};

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Connection settings for the relational source.
#[derive(Clone)]
pub struct PgSourceConnector {
    options: PgConnectOptions,
}

impl PgSourceConnector {
    /// Build a connector from credentials and a `postgres://` DSN.
    ///
    /// Credentials given here take precedence over any embedded in the DSN.
    pub fn new(user: &str, password: &str, dsn: &str) -> MigrationResult<Self> {
        let options = PgConnectOptions::from_str(dsn)
            .map_err(|e| MigrationError::Config(format!("Invalid source DSN: {e}")))?
            .username(user)
            .password(password);
        Ok(Self { options })
    }

    /// Open a standalone connection, outside of any migration run.
    pub async fn open(&self) -> MigrationResult<PgSource> {
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| MigrationError::source_connection(e.to_string()))?;

        tracing::info!(
            host = self.options.get_host(),
            port = self.options.get_port(),
            database = self.options.get_database().unwrap_or_default(),
            "Connected to relational source",
        );

        Ok(PgSource::from_connection(conn))
    }
}

impl std::fmt::Debug for PgSourceConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSourceConnector")
            .field("host", &self.options.get_host())
            .field("port", &self.options.get_port())
            .field("database", &self.options.get_database())
            .finish()
    }
}

#[async_trait]
impl SourceConnector for PgSourceConnector {
    type Source = PgSource;

    async fn connect(&self) -> MigrationResult<PgSource> {
        self.open().await
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// An open relational source with at most one active scan.
pub struct PgSource {
    conn: Option<PgConnection>,
    /// Columns of the active scan, in projection order.
    scan: Option<Vec<ColumnInfo>>,
}

impl PgSource {
    pub fn from_connection(conn: PgConnection) -> Self {
        Self {
            conn: Some(conn),
            scan: None,
        }
    }

    fn conn(&mut self) -> MigrationResult<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| MigrationError::SourceRead("Connection already closed".into()))
    }

    /// Server version, used by the connectivity check.
    pub async fn server_version(&mut self) -> MigrationResult<String> {
        let conn = self.conn()?;
        catalog::server_version(conn)
            .await
            .map_err(|e| MigrationError::SourceRead(e.to_string()))
    }
}

#[async_trait]
impl RelationalSource for PgSource {
    async fn describe(&mut self, table: &TableRef) -> MigrationResult<Vec<ColumnInfo>> {
        let conn = self.conn()?;
        let columns = catalog::describe_table(conn, table)
            .await
            .map_err(|e| MigrationError::SourceRead(format!("Failed to describe {table}: {e}")))?;

        tracing::debug!(table = %table, columns = columns.len(), "Described source table");
        Ok(columns)
    }

    async fn open_scan(&mut self, table: &TableRef, columns: &[ColumnInfo]) -> MigrationResult<()> {
        if self.scan.is_some() {
            return Err(MigrationError::SourceRead(
                "A scan is already open on this connection".into(),
            ));
        }
        if columns.is_empty() {
            return Err(MigrationError::SourceRead(format!(
                "Cannot scan {table} without columns"
            )));
        }

        let conn = self.conn()?;
        if let Err(e) = run_statements(conn, &sql::open_scan_statements(table, columns)).await {
            if let Err(rollback) = conn.execute(sql::ABORT_SCAN).await {
                tracing::warn!(error = %rollback, "Failed to roll back rejected scan");
            }
            return Err(MigrationError::SourceRead(format!(
                "Failed to open scan on {table}: {e}"
            )));
        }

        tracing::debug!(table = %table, "Opened server-side cursor");
        self.scan = Some(columns.to_vec());
        Ok(())
    }

    async fn fetch_chunk(&mut self, max_rows: usize) -> MigrationResult<Vec<SourceRow>> {
        let (Some(conn), Some(columns)) = (self.conn.as_mut(), self.scan.as_ref()) else {
            return Err(MigrationError::SourceRead("No scan is open".into()));
        };

        let statement = sql::fetch_forward(max_rows);
        let rows = sqlx::query(&statement)
            .persistent(false)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrationError::SourceRead(format!("Failed to fetch rows: {e}")))?;

        let chunk = decode::decode_rows(&rows, columns)
            .map_err(|e| MigrationError::SourceRead(format!("Failed to decode row: {e}")))?;

        if chunk.is_empty() {
            run_statements(conn, &sql::finish_scan_statements())
                .await
                .map_err(|e| MigrationError::SourceRead(format!("Failed to close scan: {e}")))?;
            self.scan = None;
            tracing::debug!("Server-side cursor exhausted");
        }

        Ok(chunk)
    }

    async fn close(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        if self.scan.take().is_some() {
            if let Err(e) = (&mut conn).execute(sql::ABORT_SCAN).await {
                tracing::warn!(error = %e, "Failed to abandon open scan");
            }
        }

        match conn.close().await {
            Ok(()) => tracing::debug!("Relational source connection closed"),
            Err(e) => tracing::warn!(error = %e, "Failed to close relational source connection"),
        }
    }
}

/// Execute `statements` one at a time on `conn`.
async fn run_statements(
    conn: &mut PgConnection,
    statements: &[String],
) -> Result<(), sqlx::Error> {
    for statement in statements {
        (&mut *conn).execute(statement.as_str()).await?;
    }
    Ok(())
}
