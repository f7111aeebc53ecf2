//! Integration tests for the PostgreSQL source.
//!
//! These need a live database (`DATABASE_URL`) and are ignored by default:
//! `cargo test -p citsm-db -- --ignored`.

use assert_matches::assert_matches;
use citsm_core::error::MigrationError;
use citsm_core::store::RelationalSource;
use citsm_core::table::{ColumnKind, TableRef};
use citsm_core::value::SourceValue;
use citsm_db::PgSource;
use sqlx::PgPool;

const SEED: &str = r#"
    CREATE TABLE "ODS_ITSM" (
        "TICKET_SUBTICKET" varchar(40),
        "DTABERTURA" timestamp,
        "QTD" numeric(5, 0),
        "VALOR" numeric(10, 2),
        "RESUMO_TICKET" text
    );
    INSERT INTO "ODS_ITSM"
    SELECT 'T-' || g, TIMESTAMP '2025-01-03 10:00:00', g, g / 2.0, NULL
    FROM generate_series(1, 25) AS g;
"#;

/// Wide and unconstrained numerics next to a zoned timestamp, read from a
/// session whose time zone is not UTC.
const WIDE_SEED: &str = r#"
    CREATE TABLE "CUBO_VALORES" (
        "ID" numeric,
        "SALDO" numeric(30, 0),
        "TAXA" numeric,
        "REGISTRADO" timestamptz
    );
    INSERT INTO "CUBO_VALORES" VALUES (
        12345678901234567,
        123456789012345678901234567890,
        2.50,
        TIMESTAMPTZ '2025-01-03 10:00:00+00'
    );
    SET TIME ZONE 'America/Sao_Paulo';
"#;

async fn seeded_source(pool: &PgPool) -> PgSource {
    source_with(pool, SEED).await
}

async fn source_with(pool: &PgPool, seed: &str) -> PgSource {
    let mut conn = pool.acquire().await.unwrap().detach();
    sqlx::raw_sql(seed).execute(&mut conn).await.unwrap();
    PgSource::from_connection(conn)
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn describe_lists_columns_in_declaration_order(pool: PgPool) {
    let mut source = seeded_source(&pool).await;
    let table = TableRef::parse("ODS_ITSM").unwrap();

    let columns = source.describe(&table).await.unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["TICKET_SUBTICKET", "DTABERTURA", "QTD", "VALOR", "RESUMO_TICKET"]
    );
    assert_eq!(columns[2].kind(), ColumnKind::Integer);
    assert_eq!(columns[3].kind(), ColumnKind::Float);
    assert_eq!(columns[1].kind(), ColumnKind::Temporal);

    source.close().await;
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn describe_unknown_table_is_empty(pool: PgPool) {
    let mut source = seeded_source(&pool).await;
    let table = TableRef::parse("NO_SUCH_TABLE").unwrap();

    assert!(source.describe(&table).await.unwrap().is_empty());
    source.close().await;
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn scan_yields_bounded_chunks(pool: PgPool) {
    let mut source = seeded_source(&pool).await;
    let table = TableRef::parse("ODS_ITSM").unwrap();
    let columns = source.describe(&table).await.unwrap();

    source.open_scan(&table, &columns).await.unwrap();

    let mut sizes = Vec::new();
    loop {
        let chunk = source.fetch_chunk(10).await.unwrap();
        if chunk.is_empty() {
            break;
        }
        sizes.push(chunk.len());
    }
    assert_eq!(sizes, vec![10, 10, 5]);

    source.close().await;
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn scan_decodes_by_column_kind(pool: PgPool) {
    let mut source = seeded_source(&pool).await;
    let table = TableRef::parse("ODS_ITSM").unwrap();
    let columns = source.describe(&table).await.unwrap();

    source.open_scan(&table, &columns).await.unwrap();
    let chunk = source.fetch_chunk(1).await.unwrap();
    let row = &chunk[0];

    assert_eq!(row.get("TICKET_SUBTICKET"), Some(&SourceValue::from("T-1")));
    assert_eq!(
        row.get("DTABERTURA"),
        Some(&SourceValue::from("2025-01-03 10:00:00"))
    );
    assert_eq!(row.get("QTD"), Some(&SourceValue::Integer(1)));
    assert_eq!(row.get("VALOR"), Some(&SourceValue::Float(0.5)));
    assert_eq!(row.get("RESUMO_TICKET"), Some(&SourceValue::Null));

    source.close().await;
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn wide_numerics_keep_exact_values(pool: PgPool) {
    let mut source = source_with(&pool, WIDE_SEED).await;
    let table = TableRef::parse("CUBO_VALORES").unwrap();
    let columns = source.describe(&table).await.unwrap();
    assert_eq!(columns[0].kind(), ColumnKind::Numeric);
    assert_eq!(columns[1].kind(), ColumnKind::Numeric);

    source.open_scan(&table, &columns).await.unwrap();
    let chunk = source.fetch_chunk(10).await.unwrap();
    let row = &chunk[0];

    assert_eq!(row.get("ID"), Some(&SourceValue::Integer(12_345_678_901_234_567)));
    assert_eq!(
        row.get("SALDO"),
        Some(&SourceValue::from("123456789012345678901234567890"))
    );
    assert_eq!(row.get("TAXA"), Some(&SourceValue::Float(2.5)));

    source.close().await;
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn zoned_timestamps_render_in_utc(pool: PgPool) {
    let mut source = source_with(&pool, WIDE_SEED).await;
    let table = TableRef::parse("CUBO_VALORES").unwrap();
    let columns = source.describe(&table).await.unwrap();

    source.open_scan(&table, &columns).await.unwrap();
    let chunk = source.fetch_chunk(10).await.unwrap();

    assert_eq!(
        chunk[0].get("REGISTRADO"),
        Some(&SourceValue::from("2025-01-03 10:00:00"))
    );

    source.close().await;
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn fetch_without_open_scan_is_a_read_error(pool: PgPool) {
    let mut source = seeded_source(&pool).await;

    let err = source.fetch_chunk(10).await.unwrap_err();
    assert_matches!(err, MigrationError::SourceRead(_));

    source.close().await;
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a PostgreSQL instance via DATABASE_URL"]
async fn rejected_scan_leaves_connection_usable(pool: PgPool) {
    let mut source = seeded_source(&pool).await;
    let table = TableRef::parse("NO_SUCH_TABLE").unwrap();
    let columns = vec![citsm_core::table::ColumnInfo::new("ID", "integer")];

    let err = source.open_scan(&table, &columns).await.unwrap_err();
    assert_matches!(err, MigrationError::SourceRead(_));

    let seeded = TableRef::parse("ODS_ITSM").unwrap();
    assert_eq!(source.describe(&seeded).await.unwrap().len(), 5);

    source.close().await;
}
