//! `citsm-migrate` -- ITSM warehouse to MongoDB migration tool.
//!
//! Streams the ODS ticket table (or a reporting cube) out of the
//! PostgreSQL warehouse in fixed-size batches and appends the rows to a
//! MongoDB collection. Also provisions the ticket text index and runs the
//! read-side reports over the migrated tickets.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default           | Description                          |
//! |------------------------|----------|-------------------|--------------------------------------|
//! | `SOURCE_DB_USER`       | yes      | --                | Warehouse user                       |
//! | `SOURCE_DB_PASSWORD`   | yes      | --                | Warehouse password                   |
//! | `SOURCE_DB_DSN`        | yes      | --                | e.g. `postgres://host:5432/dw`       |
//! | `SOURCE_TABLE`         | no       | `dwitsm.ods_itsm` | Ticket table                         |
//! | `MONGO_URI`            | yes      | --                | MongoDB connection string            |
//! | `MONGO_DATABASE`       | no       | `citsm_analyzer`  | Target database                      |
//! | `MONGO_COLLECTION`     | no       | `ods_itsm`        | Target collection                    |
//! | `MIGRATION_BATCH_SIZE` | no       | `1000`            | Rows per fetch and per insert        |
//! | `AGING_THRESHOLD_DAYS` | no       | `10`              | Default for `report aging`           |
//!
//! `RUST_LOG` overrides the default log filter.

mod cli;
mod commands;

use std::process::ExitCode;

use citsm_pipeline::MigrationConfig;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

const DEFAULT_LOG_FILTER: &str =
    "citsm_migrate=info,citsm_pipeline=info,citsm_db=info,citsm_docstore=info";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "citsm-migrate failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = MigrationConfig::from_env()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    match cli.command {
        Command::Migrate { table, collection } => {
            commands::migrate(&config, table.as_deref(), collection.as_deref()).await
        }
        Command::MigrateCube {
            table,
            collection,
            database,
        } => commands::migrate_cube(&config, &table, &collection, &database).await,
        Command::EnsureIndex { collection } => {
            commands::ensure_index(&config, collection.as_deref()).await
        }
        Command::Check => commands::check(&config).await,
        Command::Report { report } => commands::report(&config, report).await,
    }
}
