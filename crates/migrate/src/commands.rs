//! Subcommand implementations.

use anyhow::{bail, Result};
use citsm_core::fields::TextIndexSpec;
use citsm_core::store::{DocumentStore, RelationalSource};
use citsm_core::table::TableRef;
use citsm_core::transform::MigrationProfile;
use citsm_db::PgSourceConnector;
use citsm_docstore::reports::{ReportOutcome, TicketReports};
use citsm_docstore::{MongoConnector, MongoStore};
use citsm_pipeline::{MigrationConfig, MigrationPipeline, MigrationPlan};
use serde::Serialize;

use crate::cli::ReportCommand;

fn source_connector(config: &MigrationConfig) -> Result<PgSourceConnector> {
    Ok(PgSourceConnector::new(
        &config.source_user,
        &config.source_password,
        &config.source_dsn,
    )?)
}

fn store_connector(
    config: &MigrationConfig,
    database: Option<&str>,
    collection: Option<&str>,
) -> MongoConnector {
    MongoConnector::new(
        &config.mongo_uri,
        database.unwrap_or(config.mongo_database.as_str()),
        collection.unwrap_or(config.mongo_collection.as_str()),
    )
}

/// Ticket migration, optionally redirected to another table or collection.
pub async fn migrate(
    config: &MigrationConfig,
    table: Option<&str>,
    collection: Option<&str>,
) -> Result<()> {
    let mut plan = MigrationPlan::tickets(config);
    if let Some(table) = table {
        plan.table = TableRef::parse(table)?;
    }

    let pipeline = MigrationPipeline::new(
        source_connector(config)?,
        store_connector(config, None, collection),
        plan,
    );
    let report = pipeline.run().await?;
    println!("{}", report.summary());
    Ok(())
}

pub async fn migrate_cube(
    config: &MigrationConfig,
    table: &str,
    collection: &str,
    database: &str,
) -> Result<()> {
    let plan = MigrationPlan::new(
        TableRef::parse(table)?,
        MigrationProfile::Cube,
        config.batch_size,
    )?;

    let pipeline = MigrationPipeline::new(
        source_connector(config)?,
        store_connector(config, Some(database), Some(collection)),
        plan,
    );
    let report = pipeline.run().await?;
    println!("{}", report.summary());
    Ok(())
}

pub async fn ensure_index(config: &MigrationConfig, collection: Option<&str>) -> Result<()> {
    let mut store = store_connector(config, None, collection).open().await?;
    let result = store.ensure_text_index(&TextIndexSpec::tickets()).await;
    store.close().await;
    result?;

    let collection = collection.unwrap_or(config.mongo_collection.as_str());
    println!("Text index ensured on '{collection}'");
    Ok(())
}

/// Connect to both endpoints, reporting each independently.
pub async fn check(config: &MigrationConfig) -> Result<()> {
    let mut failures = 0;

    match source_connector(config)?.open().await {
        Ok(mut source) => {
            let version = source.server_version().await;
            source.close().await;
            match version {
                Ok(version) => println!("relational source: ok ({version})"),
                Err(e) => {
                    failures += 1;
                    println!("relational source: FAILED ({e})");
                }
            }
        }
        Err(e) => {
            failures += 1;
            println!("relational source: FAILED ({e})");
        }
    }

    match store_connector(config, None, None).open().await {
        Ok(mut store) => {
            store.close().await;
            println!("document store: ok ({})", config.mongo_database);
        }
        Err(e) => {
            failures += 1;
            println!("document store: FAILED ({e})");
        }
    }

    if failures > 0 {
        bail!("{failures} endpoint(s) unreachable");
    }
    Ok(())
}

pub async fn report(config: &MigrationConfig, command: ReportCommand) -> Result<()> {
    let mut store = store_connector(config, None, None).open().await?;
    let result = run_report(&store, config, command).await;
    store.close().await;

    println!("{}", result?);
    Ok(())
}

async fn run_report(
    store: &MongoStore,
    config: &MigrationConfig,
    command: ReportCommand,
) -> Result<String> {
    let reports = TicketReports::new(store);
    match command {
        ReportCommand::OpenDemands => render(&reports.open_demands().await?),
        ReportCommand::Subticket { id } => render(&reports.subticket_detail(&id).await?),
        ReportCommand::Technicians => render(&reports.technician_ranking().await?),
        ReportCommand::Duplicates => render(&reports.duplicate_summaries().await?),
        ReportCommand::Aging { min_days } => {
            let min_days = min_days.unwrap_or(config.aging_threshold_days);
            render(&reports.aging_report(min_days).await?)
        }
    }
}

fn render<T: Serialize>(outcome: &ReportOutcome<T>) -> Result<String> {
    match outcome {
        ReportOutcome::NoData(message) => Ok(message.clone()),
        ReportOutcome::Rows(rows) => Ok(serde_json::to_string_pretty(rows)?),
    }
}
