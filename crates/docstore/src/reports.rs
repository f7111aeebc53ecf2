//! Read-only report queries over the migrated ticket collection.
//!
//! Every query treats a ticket as open when its `STATUS` is anything but
//! [`STATUS_CLOSED`]. The queries that look at recent activity only consider
//! tickets opened on or after [`active_since`].
//!
//! Building the filters and pipelines and shaping the raw documents are pure
//! functions so they can be tested without a server. [`TicketReports`] ties
//! them to a [`MongoStore`].

use chrono::{TimeZone, Utc};
use citsm_core::error::MigrationResult;
use citsm_core::fields::{
    DESCRICAO, OPENED_AT_PATH, RESUMO_TICKET, SISTEMA, STATUS, STATUS_CLOSED,
    TECNICO_RESPONSAVEL, TICKET_SUBTICKET,
};
use citsm_core::types::Timestamp;
use mongodb::bson::{self, doc, Bson};
use serde::Serialize;

use crate::convert::{field_int, field_text, path_timestamp, to_bson_datetime};
use crate::store::MongoStore;

/// Maximum number of tickets listed by [`TicketReports::open_demands`].
pub const OPEN_DEMANDS_LIMIT: i64 = 15;

/// Maximum number of groups listed by [`TicketReports::duplicate_summaries`].
pub const DUPLICATE_GROUPS_LIMIT: i64 = 5;

/// Summaries in the open-demands listing are cut to this many characters.
pub const SUMMARY_MAX_CHARS: usize = 80;

pub const MISSING_SUMMARY: &str = "Sem resumo";

/// Start of the activity window: 2025-01-01T00:00:00Z.
pub fn active_since() -> Timestamp {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a report: either rows or an explanation of why there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportOutcome<T> {
    Rows(T),
    NoData(String),
}

impl<T> ReportOutcome<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData(_))
    }
}

impl<T> ReportOutcome<Vec<T>> {
    /// Wrap a list, turning an empty one into [`ReportOutcome::NoData`].
    fn from_rows(rows: Vec<T>, empty_message: impl FnOnce() -> String) -> Self {
        if rows.is_empty() {
            Self::NoData(empty_message())
        } else {
            Self::Rows(rows)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenDemand {
    pub subticket: Option<String>,
    pub sistema: Option<String>,
    pub status: Option<String>,
    pub resumo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubticketDetail {
    pub subticket: Option<String>,
    pub descricao: Option<String>,
    pub status: Option<String>,
    pub tecnico: Option<String>,
    pub abertura: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicianLoad {
    /// `None` groups the tickets with no technician assigned.
    pub tecnico: Option<String>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateSummary {
    pub resumo: Option<String>,
    pub ocorrencias: i64,
    pub subtickets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingTicket {
    pub subticket: Option<String>,
    pub sistema: Option<String>,
    pub status: Option<String>,
    pub tecnico: Option<String>,
    pub dias_aberto: i64,
}

// ---------------------------------------------------------------------------
// Query builders
// ---------------------------------------------------------------------------

fn open_filter() -> bson::Document {
    doc! { STATUS: { "$ne": STATUS_CLOSED } }
}

/// Open tickets opened on or after `since`.
pub fn active_filter(since: Timestamp) -> bson::Document {
    let mut filter = open_filter();
    filter.insert(OPENED_AT_PATH, doc! { "$gte": to_bson_datetime(since) });
    filter
}

pub fn open_demands_sort() -> bson::Document {
    doc! { OPENED_AT_PATH: -1 }
}

pub fn subticket_filter(id: &str) -> bson::Document {
    doc! { TICKET_SUBTICKET: id }
}

pub fn technician_ranking_pipeline(since: Timestamp) -> Vec<bson::Document> {
    vec![
        doc! { "$match": active_filter(since) },
        doc! { "$group": { "_id": format!("${TECNICO_RESPONSAVEL}"), "total": { "$sum": 1 } } },
        doc! { "$sort": { "total": -1 } },
    ]
}

/// Open tickets grouped by identical summary. Not restricted to the activity
/// window.
pub fn duplicate_summaries_pipeline() -> Vec<bson::Document> {
    vec![
        doc! { "$match": open_filter() },
        doc! { "$group": {
            "_id": format!("${RESUMO_TICKET}"),
            "ocorrencias": { "$sum": 1 },
            "subtickets": { "$push": format!("${TICKET_SUBTICKET}") },
        } },
        doc! { "$match": { "ocorrencias": { "$gt": 1 } } },
        doc! { "$limit": DUPLICATE_GROUPS_LIMIT },
    ]
}

/// Open tickets since `since` that have been open for at least `min_days`
/// whole days as of `now`, oldest first.
pub fn aging_pipeline(now: Timestamp, since: Timestamp, min_days: i64) -> Vec<bson::Document> {
    vec![
        doc! { "$match": active_filter(since) },
        doc! { "$addFields": {
            "dias_de_vida": { "$dateDiff": {
                "startDate": format!("${OPENED_AT_PATH}"),
                "endDate": to_bson_datetime(now),
                "unit": "day",
            } },
        } },
        doc! { "$match": { "dias_de_vida": { "$gte": min_days } } },
        doc! { "$project": {
            "subticket": format!("${TICKET_SUBTICKET}"),
            "sistema": format!("${SISTEMA}"),
            "status": format!("${STATUS}"),
            "tecnico": format!("${TECNICO_RESPONSAVEL}"),
            "dias_aberto": "$dias_de_vida",
        } },
        doc! { "$sort": { "dias_aberto": -1 } },
    ]
}

// ---------------------------------------------------------------------------
// Shaping
// ---------------------------------------------------------------------------

/// Cut a summary to [`SUMMARY_MAX_CHARS`] characters, substituting
/// [`MISSING_SUMMARY`] when there is nothing to show.
pub fn truncate_summary(summary: Option<&str>) -> String {
    match summary {
        Some(s) if !s.is_empty() => s.chars().take(SUMMARY_MAX_CHARS).collect(),
        _ => MISSING_SUMMARY.to_string(),
    }
}

pub fn shape_open_demand(doc: &bson::Document) -> OpenDemand {
    OpenDemand {
        subticket: field_text(doc, TICKET_SUBTICKET),
        sistema: field_text(doc, SISTEMA),
        status: field_text(doc, STATUS),
        resumo: truncate_summary(field_text(doc, RESUMO_TICKET).as_deref()),
    }
}

pub fn shape_subticket_detail(doc: &bson::Document) -> SubticketDetail {
    SubticketDetail {
        subticket: field_text(doc, TICKET_SUBTICKET),
        descricao: field_text(doc, DESCRICAO),
        status: field_text(doc, STATUS),
        tecnico: field_text(doc, TECNICO_RESPONSAVEL),
        abertura: path_timestamp(doc, OPENED_AT_PATH),
    }
}

pub fn shape_technician_load(doc: &bson::Document) -> TechnicianLoad {
    TechnicianLoad {
        tecnico: field_text(doc, "_id"),
        total: field_int(doc, "total").unwrap_or_default(),
    }
}

pub fn shape_duplicate_summary(doc: &bson::Document) -> DuplicateSummary {
    let subtickets = match doc.get("subtickets") {
        Some(Bson::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Bson::String(s) => Some(s.clone()),
                Bson::Int32(i) => Some(i.to_string()),
                Bson::Int64(i) => Some(i.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    DuplicateSummary {
        resumo: field_text(doc, "_id"),
        ocorrencias: field_int(doc, "ocorrencias").unwrap_or_default(),
        subtickets,
    }
}

pub fn shape_aging_ticket(doc: &bson::Document) -> AgingTicket {
    AgingTicket {
        subticket: field_text(doc, "subticket"),
        sistema: field_text(doc, "sistema"),
        status: field_text(doc, "status"),
        tecnico: field_text(doc, "tecnico"),
        dias_aberto: field_int(doc, "dias_aberto").unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Report queries bound to an open ticket collection.
pub struct TicketReports<'a> {
    store: &'a MongoStore,
    since: Timestamp,
}

impl<'a> TicketReports<'a> {
    pub fn new(store: &'a MongoStore) -> Self {
        Self {
            store,
            since: active_since(),
        }
    }

    /// Most recently opened open tickets in the activity window.
    pub async fn open_demands(&self) -> MigrationResult<ReportOutcome<Vec<OpenDemand>>> {
        let docs = self
            .store
            .find(active_filter(self.since), open_demands_sort(), OPEN_DEMANDS_LIMIT)
            .await?;
        tracing::debug!(count = docs.len(), "open_demands query finished");

        Ok(ReportOutcome::from_rows(
            docs.iter().map(shape_open_demand).collect(),
            || "No active demands found from 2025 onwards.".to_string(),
        ))
    }

    pub async fn subticket_detail(
        &self,
        id: &str,
    ) -> MigrationResult<ReportOutcome<SubticketDetail>> {
        let found = self.store.find_one(subticket_filter(id)).await?;
        Ok(match found {
            Some(doc) => ReportOutcome::Rows(shape_subticket_detail(&doc)),
            None => ReportOutcome::NoData(format!("Subticket {id} not found.")),
        })
    }

    /// Open tickets in the activity window counted per technician.
    pub async fn technician_ranking(&self) -> MigrationResult<ReportOutcome<Vec<TechnicianLoad>>> {
        let docs = self
            .store
            .aggregate(technician_ranking_pipeline(self.since))
            .await?;

        Ok(ReportOutcome::from_rows(
            docs.iter().map(shape_technician_load).collect(),
            || "No open tickets to rank.".to_string(),
        ))
    }

    pub async fn duplicate_summaries(
        &self,
    ) -> MigrationResult<ReportOutcome<Vec<DuplicateSummary>>> {
        let docs = self.store.aggregate(duplicate_summaries_pipeline()).await?;

        Ok(ReportOutcome::from_rows(
            docs.iter().map(shape_duplicate_summary).collect(),
            || "No open tickets share a summary.".to_string(),
        ))
    }

    pub async fn aging_report(
        &self,
        min_days: i64,
    ) -> MigrationResult<ReportOutcome<Vec<AgingTicket>>> {
        let docs = self
            .store
            .aggregate(aging_pipeline(Utc::now(), self.since, min_days))
            .await?;
        tracing::debug!(count = docs.len(), min_days, "aging query finished");

        Ok(ReportOutcome::from_rows(
            docs.iter().map(shape_aging_ticket).collect(),
            || format!("No active demands open for more than {min_days} days."),
        ))
    }
}
