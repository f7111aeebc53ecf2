//! Row → document transformation.
//!
//! A [`RowTransform`] is built once per run from the discovered columns and
//! then applied to every row. Known ticket fields are resolved against the
//! catalog up front, ignoring ASCII case, so the per-row work is a plain
//! copy plus the date normalization.

use crate::dates::normalize_date;
use crate::error::{MigrationError, MigrationResult};
use crate::fields::{
    ANALYSIS_DATE_FIELDS, ANALYSIS_FIELD, ANALYSIS_MIGRATED_AT, TRIMMED_TEXT_FIELDS,
};
use crate::table::{find_column, ColumnInfo};
use crate::types::Timestamp;
use crate::value::{DocValue, Document, SourceRow, SourceValue};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// What kind of table is being migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationProfile {
    /// The ODS ticket table: trimmed text fields plus the analysis block.
    Tickets,
    /// A generic reporting table copied column for column.
    Cube,
}

impl MigrationProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tickets => "tickets",
            Self::Cube => "cube",
        }
    }
}

impl std::fmt::Display for MigrationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Ticket columns resolved to their catalog spelling.
#[derive(Debug, Clone)]
struct TicketLayout {
    trimmed: Vec<String>,
    /// Source column (if present in the table) and the analysis key it feeds.
    dates: Vec<(Option<String>, &'static str)>,
}

#[derive(Debug, Clone)]
enum TransformKind {
    Tickets(TicketLayout),
    Verbatim,
}

/// Per-run row transformation.
#[derive(Debug, Clone)]
pub struct RowTransform {
    kind: TransformKind,
}

impl RowTransform {
    /// Build the transform for `profile` over the discovered `columns`.
    ///
    /// For the ticket profile a source column named like the reserved
    /// analysis field is rejected, since the block would overwrite it.
    pub fn for_profile(
        profile: MigrationProfile,
        columns: &[ColumnInfo],
    ) -> MigrationResult<Self> {
        match profile {
            MigrationProfile::Cube => Ok(Self::verbatim()),
            MigrationProfile::Tickets => {
                if let Some(clash) = find_column(columns, ANALYSIS_FIELD) {
                    return Err(MigrationError::Transformation(format!(
                        "Source column '{}' collides with the reserved field '{ANALYSIS_FIELD}'",
                        clash.name
                    )));
                }

                let trimmed = TRIMMED_TEXT_FIELDS
                    .iter()
                    .filter_map(|field| find_column(columns, field))
                    .map(|c| c.name.clone())
                    .collect();

                let dates = ANALYSIS_DATE_FIELDS
                    .iter()
                    .map(|(column, key)| {
                        (find_column(columns, column).map(|c| c.name.clone()), *key)
                    })
                    .collect();

                Ok(Self {
                    kind: TransformKind::Tickets(TicketLayout { trimmed, dates }),
                })
            }
        }
    }

    /// A transform that copies every column unchanged.
    pub fn verbatim() -> Self {
        Self {
            kind: TransformKind::Verbatim,
        }
    }

    pub fn profile(&self) -> MigrationProfile {
        match self.kind {
            TransformKind::Tickets(_) => MigrationProfile::Tickets,
            TransformKind::Verbatim => MigrationProfile::Cube,
        }
    }

    /// Turn one source row into its target document.
    pub fn apply(&self, row: SourceRow, migrated_at: Timestamp) -> Document {
        match &self.kind {
            TransformKind::Verbatim => {
                let mut doc = Document::with_capacity(row.len());
                for (column, value) in row {
                    doc.insert(column, DocValue::from(value));
                }
                doc
            }
            TransformKind::Tickets(layout) => {
                let analysis = layout.analysis_block(&row, migrated_at);

                let mut doc = Document::with_capacity(row.len() + 1);
                for (column, value) in row {
                    let value = if layout.trimmed.contains(&column) {
                        trim_text(value)
                    } else {
                        value
                    };
                    doc.insert(column, DocValue::from(value));
                }
                doc.insert(ANALYSIS_FIELD, analysis);
                doc
            }
        }
    }

    /// Transform a whole chunk, stamping every document with `migrated_at`.
    pub fn apply_all(&self, rows: Vec<SourceRow>, migrated_at: Timestamp) -> Vec<Document> {
        rows.into_iter()
            .map(|row| self.apply(row, migrated_at))
            .collect()
    }
}

impl TicketLayout {
    fn analysis_block(&self, row: &SourceRow, migrated_at: Timestamp) -> Document {
        let mut block = Document::with_capacity(self.dates.len() + 1);
        for (column, key) in &self.dates {
            let parsed = column
                .as_deref()
                .and_then(|c| row.get(c))
                .and_then(normalize_date);
            block.insert(*key, parsed);
        }
        block.insert(ANALYSIS_MIGRATED_AT, DocValue::Timestamp(migrated_at));
        block
    }
}

fn trim_text(value: SourceValue) -> SourceValue {
    match value {
        SourceValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.len() == s.len() {
                SourceValue::Text(s)
            } else {
                SourceValue::Text(trimmed.to_string())
            }
        }
        other => other,
    }
}
