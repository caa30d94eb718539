//! Router configuration
//!
//! The topology is described in JSON:
//!
//! ```json
//! {
//!   "slots": 4096,
//!   "schemas": [
//!     { "database": "sbtest",
//!       "tables": [
//!         { "name": "A", "kind": "sharded", "shard_key": "id",
//!           "partitions": [ { "backend": "backend1", "suffix": "1", "segment": "0-32" } ] }
//!       ] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::router::error::{RouterError, RouterResult};
use crate::router::hash::DEFAULT_SLOTS;

/// How a table is laid out across backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Lives whole on one backend
    Single,
    /// Fully replicated to every listed backend
    Global,
    /// Split by hash slot of the shard key
    Sharded,
}

/// One partition of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Backend hosting the partition
    pub backend: String,
    /// Appended to the logical table name to form the physical one
    #[serde(default)]
    pub suffix: String,
    /// Slot segment `"start-end"`, sharded tables only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

/// One logical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub kind: TableKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_key: Option<String>,
    pub partitions: Vec<PartitionConfig>,
}

/// Tables of one logical database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub database: String,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// Whole router topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_slots")]
    pub slots: u32,
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,
}

fn default_slots() -> u32 {
    DEFAULT_SLOTS
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
            schemas: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Load a config from a JSON file
    pub fn load(path: &Path) -> RouterResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RouterError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Parse a config from JSON text
    pub fn from_json(content: &str) -> RouterResult<Self> {
        serde_json::from_str(content).map_err(|e| RouterError::Parse(e.to_string()))
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> RouterResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RouterError::Parse(e.to_string()))
    }
}
