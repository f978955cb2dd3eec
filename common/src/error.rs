//! Error types shared by the store client, the synchronizer and the verifier.

use thiserror::Error;

/// A failure reported by the remote store client.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable ({kind}): {message}")]
    Unreachable { kind: &'static str, message: String },

    #[error("store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("could not decode store response: {0}")]
    Decode(String),
}

/// A failed maintenance run, tagged with the step that failed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot reach the store for table {table}: {source}")]
    Connection {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("query on table {table} failed: {source}")]
    Query {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("delete on table {table} failed, the table may be empty: {source}")]
    Delete {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("insert into table {table} failed after its rows were deleted, the table is left empty: {source}")]
    Insert {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("invalid source data: {0}")]
    Validation(String),
}

impl SyncError {
    /// Build the error for a set of unset configuration variables.
    pub fn missing_config(names: &[&str]) -> Self {
        Self::Configuration(format!(
            "missing required environment variable(s): {}",
            names.join(", ")
        ))
    }

    /// Classify a failed read. Unreachable stores are connection errors, everything else is a query error.
    pub(crate) fn read(table: &str, source: StoreError) -> Self {
        let table = table.to_string();
        match source {
            StoreError::Unreachable { .. } => Self::Connection { table, source },
            _ => Self::Query { table, source },
        }
    }

    /// Short name of the step that failed, for log lines.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Connection { .. } => "connect",
            Self::Query { .. } => "query",
            Self::Delete { .. } => "delete",
            Self::Insert { .. } => "insert",
            Self::Validation(_) => "validation",
        }
    }

    /// True when the run stopped after rows had already been deleted.
    pub fn left_table_empty(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }
}
