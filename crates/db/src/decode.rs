//! Decoding of scan rows into [`SourceRow`]s.
//!
//! The scan projection casts every column to `BIGINT`, `DOUBLE PRECISION`
//! or `TEXT` according to its [`ColumnKind`], so decoding only has to deal
//! with those three wire types. Wide `numeric` arrives as text and is
//! narrowed per value.

use citsm_core::table::{ColumnInfo, ColumnKind};
use citsm_core::value::{SourceRow, SourceValue};
use sqlx::postgres::PgRow;
use sqlx::Row;

/// Decode one scan row. Values are read by position, in the order of
/// `columns`, and keyed by the catalog column names.
pub fn decode_row(row: &PgRow, columns: &[ColumnInfo]) -> Result<SourceRow, sqlx::Error> {
    let mut out = SourceRow::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value = match column.kind() {
            ColumnKind::Integer => SourceValue::from(row.try_get::<Option<i64>, _>(idx)?),
            ColumnKind::Float => SourceValue::from(row.try_get::<Option<f64>, _>(idx)?),
            ColumnKind::Numeric => row
                .try_get::<Option<String>, _>(idx)?
                .map_or(SourceValue::Null, |text| SourceValue::from_numeric_text(&text)),
            ColumnKind::Temporal | ColumnKind::Text => {
                SourceValue::from(row.try_get::<Option<String>, _>(idx)?)
            }
        };
        out.push(column.name.clone(), value);
    }
    Ok(out)
}

/// Decode a fetched chunk, failing on the first undecodable row.
pub fn decode_rows(rows: &[PgRow], columns: &[ColumnInfo]) -> Result<Vec<SourceRow>, sqlx::Error> {
    rows.iter().map(|row| decode_row(row, columns)).collect()
}
