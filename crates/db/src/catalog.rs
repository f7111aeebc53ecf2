//! Table introspection through `information_schema`.

use citsm_core::table::{ColumnInfo, TableRef};
use sqlx::PgConnection;

/// Columns of one table in declaration order. `$1` is the schema (or
/// `NULL` for the session's current schema), `$2` the table name.
const DESCRIBE_QUERY: &str = "SELECT column_name::text AS column_name,
        data_type::text AS data_type,
        numeric_precision::int4 AS numeric_precision,
        numeric_scale::int4 AS numeric_scale
     FROM information_schema.columns
     WHERE table_schema::text = COALESCE($1::text, current_schema()::text)
       AND table_name::text = $2
     ORDER BY ordinal_position";

#[derive(sqlx::FromRow)]
struct CatalogRow {
    column_name: String,
    data_type: String,
    numeric_precision: Option<i32>,
    numeric_scale: Option<i32>,
}

impl From<CatalogRow> for ColumnInfo {
    fn from(row: CatalogRow) -> Self {
        Self {
            name: row.column_name,
            data_type: row.data_type,
            precision: row.numeric_precision,
            scale: row.numeric_scale,
        }
    }
}

/// Describe `table` in a single round trip.
///
/// Names are matched exactly. A table that does not exist yields an empty
/// list.
pub async fn describe_table(
    conn: &mut PgConnection,
    table: &TableRef,
) -> Result<Vec<ColumnInfo>, sqlx::Error> {
    let rows: Vec<CatalogRow> = sqlx::query_as(DESCRIBE_QUERY)
        .bind(table.schema.as_deref())
        .bind(&table.name)
        .fetch_all(conn)
        .await?;

    Ok(rows.into_iter().map(ColumnInfo::from).collect())
}

/// PostgreSQL server version string.
pub async fn server_version(conn: &mut PgConnection) -> Result<String, sqlx::Error> {
    let (version,): (String,) = sqlx::query_as("SELECT version()").fetch_one(conn).await?;
    Ok(version)
}
