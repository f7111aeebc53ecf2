use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "citsm-migrate")]
#[command(
    about = "Migrate ITSM warehouse tables into MongoDB and query the result",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Migrate the ODS ticket table with date normalization
    Migrate {
        /// Source table, `table` or `schema.table` (overrides SOURCE_TABLE)
        #[arg(long)]
        table: Option<String>,

        /// Target collection (overrides MONGO_COLLECTION)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Copy a reporting cube table verbatim
    MigrateCube {
        /// Source table, `table` or `schema.table`
        #[arg(long)]
        table: String,

        /// Target collection
        #[arg(long)]
        collection: String,

        /// Target database
        #[arg(long, default_value = "pericia_db")]
        database: String,
    },

    /// Create the ticket text index
    EnsureIndex {
        /// Target collection (overrides MONGO_COLLECTION)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Check connectivity to both endpoints
    Check,

    /// Run a report over the migrated tickets and print it as JSON
    Report {
        #[command(subcommand)]
        report: ReportCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Open tickets since 2025, newest first
    OpenDemands,

    /// Details of one subticket
    Subticket {
        /// Subticket identifier
        id: String,
    },

    /// Open tickets per technician
    Technicians,

    /// Open tickets sharing the same summary
    Duplicates,

    /// Open tickets older than a number of days
    Aging {
        /// Minimum age in days (defaults to AGING_THRESHOLD_DAYS)
        #[arg(long)]
        min_days: Option<i64>,
    },
}
