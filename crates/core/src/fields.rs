//! Names of the ODS ticket columns and of the persisted document fields.
//!
//! Column names follow the warehouse DDL. Document field names are read by
//! the report queries and by the agent layer, so they are part of the
//! stored layout and must not change.

// ---------------------------------------------------------------------------
// ODS ticket columns
// ---------------------------------------------------------------------------

/// Fine-grained work item identifier; primary key for ticket lookups.
pub const TICKET_SUBTICKET: &str = "TICKET_SUBTICKET";
pub const RESUMO_TICKET: &str = "RESUMO_TICKET";
pub const DESCRICAO: &str = "DESCRICAO";
pub const SISTEMA: &str = "SISTEMA";
pub const STATUS: &str = "STATUS";
pub const TECNICO_RESPONSAVEL: &str = "TECNICORESPONSAVEL";
pub const DT_ABERTURA: &str = "DTABERTURA";
pub const DT_FIM: &str = "DTFIM";
pub const DT_ULTIMA_MODIFICACAO: &str = "DTULTIMAMODIFICACAO";

/// Text columns whose surrounding whitespace is stripped during migration.
pub const TRIMMED_TEXT_FIELDS: &[&str] = &[RESUMO_TICKET, DESCRICAO, SISTEMA, STATUS];

/// `STATUS` value of a finished ticket.
pub const STATUS_CLOSED: &str = "Fechado";

// ---------------------------------------------------------------------------
// Analysis block
// ---------------------------------------------------------------------------

/// Reserved top-level field holding the derived analysis block.
pub const ANALYSIS_FIELD: &str = "ia_analysis_ready";

pub const ANALYSIS_OPENED_AT: &str = "dt_abertura_iso";
pub const ANALYSIS_FINISHED_AT: &str = "dt_fim_iso";
pub const ANALYSIS_MODIFIED_AT: &str = "dt_modificacao_iso";
pub const ANALYSIS_MIGRATED_AT: &str = "timestamp_migracao";

/// Dotted path of the normalized opening timestamp, as used in queries.
pub const OPENED_AT_PATH: &str = "ia_analysis_ready.dt_abertura_iso";

/// Source date column → analysis key, in the order the block is written.
pub const ANALYSIS_DATE_FIELDS: &[(&str, &str)] = &[
    (DT_ABERTURA, ANALYSIS_OPENED_AT),
    (DT_FIM, ANALYSIS_FINISHED_AT),
    (DT_ULTIMA_MODIFICACAO, ANALYSIS_MODIFIED_AT),
];

// ---------------------------------------------------------------------------
// Text index
// ---------------------------------------------------------------------------

/// Definition of a text index over free-text document fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextIndexSpec {
    pub name: String,
    pub fields: Vec<String>,
}

/// Name of the text index used by search-style ticket queries.
pub const TICKET_TEXT_INDEX: &str = "pmo_text_index";

impl TextIndexSpec {
    /// The ticket search index over summary, description and system.
    pub fn tickets() -> Self {
        Self {
            name: TICKET_TEXT_INDEX.to_string(),
            fields: [RESUMO_TICKET, DESCRICAO, SISTEMA]
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}
