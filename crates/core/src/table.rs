//! Source table references and catalog column metadata.

use crate::error::MigrationError;

// ---------------------------------------------------------------------------
// Table reference
// ---------------------------------------------------------------------------

/// A possibly schema-qualified table name, e.g. `dwitsm.ods_itsm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    /// Parse `table` or `schema.table`.
    pub fn parse(raw: &str) -> Result<Self, MigrationError> {
        let raw = raw.trim();
        let mut parts = raw.split('.');
        let (schema, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => (None, name),
            (Some(schema), Some(name), None) => (Some(schema), name),
            _ => {
                return Err(MigrationError::Config(format!(
                    "Invalid table name '{raw}'. Expected 'table' or 'schema.table'"
                )))
            }
        };

        if name.is_empty() || schema.is_some_and(str::is_empty) {
            return Err(MigrationError::Config(format!(
                "Invalid table name '{raw}'. Expected 'table' or 'schema.table'"
            )));
        }

        Ok(Self {
            schema: schema.map(str::to_string),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Column metadata
// ---------------------------------------------------------------------------

/// Largest decimal precision that still fits an `i64`.
const MAX_INTEGRAL_PRECISION: i32 = 18;

/// One column as described by the source catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Catalog type name, e.g. `integer`, `numeric`, `character varying`.
    pub data_type: String,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
}

/// How a column's values are carried into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    /// Unconstrained or wide `numeric`, carried as its exact decimal text and
    /// narrowed per value by [`SourceValue::from_numeric_text`].
    ///
    /// [`SourceValue::from_numeric_text`]: crate::value::SourceValue::from_numeric_text
    Numeric,
    /// Dates and timestamps, carried as `YYYY-MM-DD HH:MM:SS` text so they
    /// go through the same normalization as text-typed date columns.
    Temporal,
    /// Everything else is carried as text.
    Text,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            precision: None,
            scale: None,
        }
    }

    pub fn with_precision(mut self, precision: i32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Classify the column from its catalog type.
    ///
    /// `numeric` columns declared with scale 0 and a precision that fits an
    /// `i64` are integral, and ones with a fractional scale are float.
    /// Unconstrained or wider `numeric` is decided per value.
    pub fn kind(&self) -> ColumnKind {
        match self.data_type.to_ascii_lowercase().as_str() {
            "smallint" | "integer" | "bigint" | "int2" | "int4" | "int8" => ColumnKind::Integer,
            "numeric" | "decimal" => match (self.precision, self.scale) {
                (Some(p), Some(0)) if p <= MAX_INTEGRAL_PRECISION => ColumnKind::Integer,
                (_, Some(scale)) if scale > 0 => ColumnKind::Float,
                _ => ColumnKind::Numeric,
            },
            "real" | "double precision" | "float4" | "float8" => ColumnKind::Float,
            "date" | "timestamp without time zone" | "timestamp with time zone" | "timestamp"
            | "timestamptz" => ColumnKind::Temporal,
            _ => ColumnKind::Text,
        }
    }
}

/// Find a column by name, ignoring ASCII case.
pub fn find_column<'a>(columns: &'a [ColumnInfo], name: &str) -> Option<&'a ColumnInfo> {
    columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}
