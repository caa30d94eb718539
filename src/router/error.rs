//! Router error types

use thiserror::Error;

/// Router errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// No database was given and the table is unqualified
    #[error("database can't be empty")]
    EmptyDatabase,

    /// Database is not configured
    #[error("database '{0}' doesn't exist")]
    DatabaseNotFound(String),

    /// Database is already configured
    #[error("database '{0}' already exists")]
    DatabaseExists(String),

    /// Table is not configured in the database
    #[error("Table '{database}.{table}' doesn't exist")]
    TableNotFound { database: String, table: String },

    /// Table is already configured in the database
    #[error("Table '{database}.{table}' already exists")]
    TableExists { database: String, table: String },

    /// Table or partition layout is not usable
    #[error("invalid router config: {0}")]
    InvalidConfig(String),

    /// Value lookup on a table that is not sharded
    #[error("table '{0}' is not sharded")]
    NotSharded(String),

    /// Hash slot not covered by any partition
    #[error("no partition of table '{table}' owns slot {slot}")]
    SlotNotCovered { table: String, slot: u32 },

    /// Config file could not be read
    #[error("failed to read router config: {0}")]
    Io(String),

    /// Config file is not valid JSON for a router config
    #[error("failed to parse router config: {0}")]
    Parse(String),
}

/// Result type for router operations
pub type RouterResult<T> = Result<T, RouterError>;
