//! Planner error types

use thiserror::Error;

use crate::router::RouterError;

/// DELETE with a subquery in its WHERE clause
pub const SUBQUERIES_IN_DELETE: &str = "subqueries.in.delete";
/// DELETE touching more than one table
pub const MULTITABLES_IN_DELETE: &str = "currently.not.support.multitables.in.delete";
/// DELETE with a PARTITION hint
pub const PARTITIONS_IN_DELETE: &str = "currently.not.support.partitions.in.delete";

/// Planner error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// Statement shape that cannot be sharded safely; the client must
    /// rewrite the statement
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// Table resolution or partition lookup failed
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Plan tree was already built or aborted
    #[error("plan tree is frozen")]
    TreeFrozen,

    /// Plan tree is being handed off before a successful build
    #[error("plan tree is not built")]
    TreeNotBuilt,

    /// Plan re-entered while building
    #[error("plan is already building")]
    Reentrant,

    /// Plan output could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::Serialization(err.to_string())
    }
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
