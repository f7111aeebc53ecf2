use citsm_core::error::{MigrationError, MigrationResult};
use citsm_core::table::TableRef;

pub const DEFAULT_SOURCE_TABLE: &str = "dwitsm.ods_itsm";
pub const DEFAULT_MONGO_DATABASE: &str = "citsm_analyzer";
pub const DEFAULT_MONGO_COLLECTION: &str = "ods_itsm";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_AGING_THRESHOLD_DAYS: i64 = 10;

const REQUIRED_VARS: &[&str] = &[
    "SOURCE_DB_USER",
    "SOURCE_DB_PASSWORD",
    "SOURCE_DB_DSN",
    "MONGO_URI",
];

/// Migration settings resolved once at process start.
#[derive(Clone)]
pub struct MigrationConfig {
    pub source_user: String,
    pub source_password: String,
    /// `postgres://host:port/database`.
    pub source_dsn: String,
    pub source_table: TableRef,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_collection: String,
    /// Rows fetched and documents inserted per round trip. Never zero.
    pub batch_size: usize,
    /// Default `min_days` for the aging report.
    pub aging_threshold_days: i64,
}

impl MigrationConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Required | Default           |
    /// |------------------------|----------|-------------------|
    /// | `SOURCE_DB_USER`       | yes      | --                |
    /// | `SOURCE_DB_PASSWORD`   | yes      | --                |
    /// | `SOURCE_DB_DSN`        | yes      | --                |
    /// | `SOURCE_TABLE`         | no       | `dwitsm.ods_itsm` |
    /// | `MONGO_URI`            | yes      | --                |
    /// | `MONGO_DATABASE`       | no       | `citsm_analyzer`  |
    /// | `MONGO_COLLECTION`     | no       | `ods_itsm`        |
    /// | `MIGRATION_BATCH_SIZE` | no       | `1000`            |
    /// | `AGING_THRESHOLD_DAYS` | no       | `10`              |
    pub fn from_env() -> MigrationResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset. Every missing required variable is
    /// named in the returned error.
    pub fn from_lookup<F>(lookup: F) -> MigrationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(MigrationError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }
        let required = |key: &str| get(key).unwrap_or_default();

        let source_table = TableRef::parse(
            &get("SOURCE_TABLE").unwrap_or_else(|| DEFAULT_SOURCE_TABLE.into()),
        )?;

        let batch_size = parse_or(
            "MIGRATION_BATCH_SIZE",
            get("MIGRATION_BATCH_SIZE"),
            DEFAULT_BATCH_SIZE,
        )?;
        if batch_size == 0 {
            return Err(MigrationError::Config(
                "MIGRATION_BATCH_SIZE must be greater than zero".into(),
            ));
        }

        let aging_threshold_days = parse_or(
            "AGING_THRESHOLD_DAYS",
            get("AGING_THRESHOLD_DAYS"),
            DEFAULT_AGING_THRESHOLD_DAYS,
        )?;
        if aging_threshold_days < 0 {
            return Err(MigrationError::Config(
                "AGING_THRESHOLD_DAYS must not be negative".into(),
            ));
        }

        Ok(Self {
            source_user: required("SOURCE_DB_USER"),
            source_password: required("SOURCE_DB_PASSWORD"),
            source_dsn: required("SOURCE_DB_DSN"),
            source_table,
            mongo_uri: required("MONGO_URI"),
            mongo_database: get("MONGO_DATABASE").unwrap_or_else(|| DEFAULT_MONGO_DATABASE.into()),
            mongo_collection: get("MONGO_COLLECTION")
                .unwrap_or_else(|| DEFAULT_MONGO_COLLECTION.into()),
            batch_size,
            aging_threshold_days,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    raw: Option<String>,
    default: T,
) -> MigrationResult<T> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| {
                MigrationError::Config(format!("{key} must be a valid integer, got {raw:?}"))
            }),
    }
}

impl std::fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationConfig")
            .field("source_user", &self.source_user)
            .field("source_password", &"[REDACTED]")
            .field("source_dsn", &"[REDACTED]")
            .field("source_table", &self.source_table)
            .field("mongo_uri", &"[REDACTED]")
            .field("mongo_database", &self.mongo_database)
            .field("mongo_collection", &self.mongo_collection)
            .field("batch_size", &self.batch_size)
            .field("aging_threshold_days", &self.aging_threshold_days)
            .finish()
    }
}
