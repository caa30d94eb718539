//! SQL error types

use std::fmt;

/// SQL error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// Tokenizer error from sqlparser
    Tokenize(String),
    /// Parse error in the statement grammar
    Parse(String),
    /// Statement kind the planner has no plan for
    Unsupported(String),
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlError::Tokenize(msg) => write!(f, "Tokenize error: {}", msg),
            SqlError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SqlError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for SqlError {}

impl From<sqlparser::tokenizer::TokenizerError> for SqlError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        SqlError::Tokenize(err.to_string())
    }
}

/// Result type for SQL operations
pub type SqlResult<T> = Result<T, SqlError>;
