/// Which side of a migration an I/O failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The relational warehouse the rows are read from.
    RelationalSource,
    /// The document store the documents are written to.
    DocumentStore,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelationalSource => f.write_str("relational source"),
            Self::DocumentStore => f.write_str("document store"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to {endpoint}: {message}")]
    Connection { endpoint: Endpoint, message: String },

    #[error("Failed to read from source: {0}")]
    SourceRead(String),

    #[error("Failed to transform rows: {0}")]
    Transformation(String),

    #[error("Failed to write to document store: {0}")]
    Write(String),

    #[error("Batch {batch} failed to load ({persisted} documents already persisted): {message}")]
    Load {
        batch: u64,
        persisted: u64,
        message: String,
    },

    #[error("Index provisioning failed: {0}")]
    Index(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl MigrationError {
    /// Shorthand for a connection failure on the relational side.
    pub fn source_connection(message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: Endpoint::RelationalSource,
            message: message.into(),
        }
    }

    /// Shorthand for a connection failure on the document side.
    pub fn store_connection(message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: Endpoint::DocumentStore,
            message: message.into(),
        }
    }
}

/// Result type for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;
