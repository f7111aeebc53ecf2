//! SQL text builders for the table scan.
//!
//! Identifiers come from the source catalog or from configuration and are
//! always quoted, so mixed-case warehouse names survive PostgreSQL's
//! lower-case folding.

use citsm_core::table::{ColumnInfo, ColumnKind, TableRef};

/// Name of the server-side cursor used for table scans.
pub const SCAN_CURSOR: &str = "citsm_migration_scan";

/// Layout temporal columns are rendered in. Matches one of the accepted
/// date layouts of the normalizer.
pub const TEMPORAL_TEXT_FORMAT: &str = "YYYY-MM-DD HH24:MI:SS";

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quoted, optionally schema-qualified table name.
pub fn qualified_table(table: &TableRef) -> String {
    match &table.schema {
        Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&table.name)),
        None => quote_ident(&table.name),
    }
}

/// Select-list entry for one column, cast to the wire type its
/// [`ColumnKind`] is decoded from and aliased back to its own name.
pub fn column_projection(column: &ColumnInfo) -> String {
    let ident = quote_ident(&column.name);
    match column.kind() {
        ColumnKind::Integer => format!("CAST({ident} AS BIGINT) AS {ident}"),
        ColumnKind::Float => format!("CAST({ident} AS DOUBLE PRECISION) AS {ident}"),
        ColumnKind::Temporal => {
            format!("TO_CHAR({ident}, '{TEMPORAL_TEXT_FORMAT}') AS {ident}")
        }
        ColumnKind::Numeric | ColumnKind::Text => format!("CAST({ident} AS TEXT) AS {ident}"),
    }
}

/// Unbounded select of every listed column.
pub fn select_all(table: &TableRef, columns: &[ColumnInfo]) -> String {
    let projection = columns
        .iter()
        .map(column_projection)
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {projection} FROM {}", qualified_table(table))
}

/// Statements that open a full table scan, in execution order.
///
/// The scan runs in a read-only transaction whose session time zone is UTC,
/// so `timestamptz` values render as UTC wall-clock text.
pub fn open_scan_statements(table: &TableRef, columns: &[ColumnInfo]) -> Vec<String> {
    vec![
        "BEGIN READ ONLY".to_string(),
        "SET LOCAL TIME ZONE 'UTC'".to_string(),
        format!(
            "DECLARE {SCAN_CURSOR} NO SCROLL CURSOR FOR {}",
            select_all(table, columns)
        ),
    ]
}

/// Fetch the next `max_rows` rows from the scan cursor.
pub fn fetch_forward(max_rows: usize) -> String {
    format!("FETCH FORWARD {max_rows} FROM {SCAN_CURSOR}")
}

/// Statements that close an exhausted scan, in execution order.
pub fn finish_scan_statements() -> Vec<String> {
    vec![format!("CLOSE {SCAN_CURSOR}"), "COMMIT".to_string()]
}

/// Abandons a scan that was not read to the end.
pub const ABORT_SCAN: &str = "ROLLBACK";
