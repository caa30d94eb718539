//! Router - sharding topology (tables, partitions, backends)
//!
//! The router stores, per logical database, how each table is laid out
//! across backends, and maps shard-key values to partitions.
//!
//! ## Concurrency
//!
//! `Router` is `Send + Sync` and meant to be shared by every request. The
//! topology sits behind a `parking_lot::RwLock`: lookups take the read lock
//! and hand out `Arc<TableMeta>` snapshots, so callers never hold the lock
//! while they work with a table. Mutations (`create_database`, `add_table`,
//! `drop_table`, `reload`) take the write lock; a plan built against a
//! snapshot keeps seeing that snapshot even if the topology is reloaded.

pub mod config;
pub mod error;
pub mod hash;
pub mod mock;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

pub use config::{PartitionConfig, RouterConfig, SchemaConfig, TableConfig, TableKind};
pub use error::{RouterError, RouterResult};
pub use hash::{ShardValue, DEFAULT_SLOTS};

/// Half-open range of hash slots, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: u32,
    pub end: u32,
}

impl SlotRange {
    /// Parse a `"start-end"` segment
    pub fn parse(segment: &str) -> RouterResult<Self> {
        let invalid = || RouterError::InvalidConfig(format!("bad segment '{}'", segment));
        let (start, end) = segment.split_once('-').ok_or_else(invalid)?;
        let start: u32 = start.trim().parse().map_err(|_| invalid())?;
        let end: u32 = end.trim().parse().map_err(|_| invalid())?;
        if start >= end {
            return Err(invalid());
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, slot: u32) -> bool {
        self.start <= slot && slot < self.end
    }
}

impl fmt::Display for SlotRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

/// One partition of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMeta {
    /// Backend hosting this partition
    pub backend: String,
    /// Physical table name suffix, empty for single and global tables
    pub suffix: String,
    /// Owned slots, sharded tables only
    pub range: Option<SlotRange>,
}

impl PartitionMeta {
    /// Display label of the owned slots, empty when there are none
    pub fn range_label(&self) -> String {
        self.range.map(|r| r.to_string()).unwrap_or_default()
    }
}

/// Sharding metadata of one logical table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// Logical database
    pub database: String,
    /// Logical table name
    pub name: String,
    pub kind: TableKind,
    /// Shard column, sharded tables only
    pub shard_key: Option<String>,
    /// Size of the hash slot space
    pub slots: u32,
    /// Partitions in topology order
    pub partitions: Vec<PartitionMeta>,
}

impl TableMeta {
    /// Build and validate table metadata from its config
    pub fn from_config(database: &str, config: &TableConfig, slots: u32) -> RouterResult<Self> {
        let invalid = |msg: String| {
            RouterError::InvalidConfig(format!("table '{}.{}': {}", database, config.name, msg))
        };

        if config.name.is_empty() {
            return Err(RouterError::InvalidConfig(format!(
                "table name in database '{}' is empty",
                database
            )));
        }
        if config.partitions.is_empty() {
            return Err(invalid("no partitions".to_string()));
        }
        if let Some(p) = config.partitions.iter().find(|p| p.backend.is_empty()) {
            return Err(invalid(format!("partition '{}' has no backend", p.suffix)));
        }

        let partitions = match config.kind {
            TableKind::Single | TableKind::Global => {
                if config.kind == TableKind::Single && config.partitions.len() != 1 {
                    return Err(invalid(format!(
                        "single table needs exactly one partition, got {}",
                        config.partitions.len()
                    )));
                }
                if config.partitions.iter().any(|p| p.segment.is_some()) {
                    return Err(invalid("segments are only valid on sharded tables".into()));
                }
                let mut backends: Vec<&str> =
                    config.partitions.iter().map(|p| p.backend.as_str()).collect();
                backends.sort_unstable();
                backends.dedup();
                if backends.len() != config.partitions.len() {
                    return Err(invalid("backend listed twice".to_string()));
                }
                config
                    .partitions
                    .iter()
                    .map(|p| PartitionMeta {
                        backend: p.backend.clone(),
                        suffix: String::new(),
                        range: None,
                    })
                    .collect()
            }
            TableKind::Sharded => Self::sharded_partitions(config, slots).map_err(invalid)?,
        };

        let shard_key = match config.kind {
            TableKind::Sharded => match config.shard_key.as_deref() {
                Some(key) if !key.is_empty() => Some(key.to_string()),
                _ => return Err(invalid("sharded table needs a shard_key".to_string())),
            },
            TableKind::Single | TableKind::Global => None,
        };

        Ok(Self {
            database: database.to_string(),
            name: config.name.clone(),
            kind: config.kind,
            shard_key,
            slots,
            partitions,
        })
    }

    /// Sharded partitions must tile `[0, slots)` in order with distinct suffixes
    fn sharded_partitions(config: &TableConfig, slots: u32) -> Result<Vec<PartitionMeta>, String> {
        let mut partitions = Vec::with_capacity(config.partitions.len());
        let mut next = 0;
        for p in &config.partitions {
            let segment = p
                .segment
                .as_deref()
                .ok_or_else(|| format!("partition '{}' has no segment", p.suffix))?;
            let range =
                SlotRange::parse(segment).map_err(|_| format!("bad segment '{}'", segment))?;
            if range.start != next {
                return Err(format!(
                    "segment {} does not start at slot {}",
                    range, next
                ));
            }
            if p.suffix.is_empty() {
                return Err(format!("partition {} has no suffix", range));
            }
            if partitions.iter().any(|q: &PartitionMeta| q.suffix == p.suffix) {
                return Err(format!("suffix '{}' used twice", p.suffix));
            }
            next = range.end;
            partitions.push(PartitionMeta {
                backend: p.backend.clone(),
                suffix: p.suffix.clone(),
                range: Some(range),
            });
        }
        if next != slots {
            return Err(format!("segments end at slot {}, expected {}", next, slots));
        }
        Ok(partitions)
    }

    /// Physical table name of a partition
    pub fn physical_name(&self, partition: &PartitionMeta) -> String {
        format!("{}{}", self.name, partition.suffix)
    }
}

/// Topology guarded by the router lock
#[derive(Debug)]
struct Topology {
    slots: u32,
    schemas: HashMap<String, HashMap<String, Arc<TableMeta>>>,
}

impl Topology {
    fn from_config(config: &RouterConfig) -> RouterResult<Self> {
        if config.slots == 0 {
            return Err(RouterError::InvalidConfig("slots must be positive".into()));
        }
        let mut topology = Topology {
            slots: config.slots,
            schemas: HashMap::new(),
        };
        for schema in &config.schemas {
            topology.create_database(&schema.database)?;
            for table in &schema.tables {
                topology.add_table(&schema.database, table)?;
            }
        }
        Ok(topology)
    }

    fn create_database(&mut self, database: &str) -> RouterResult<()> {
        if database.is_empty() {
            return Err(RouterError::EmptyDatabase);
        }
        if self.schemas.contains_key(database) {
            return Err(RouterError::DatabaseExists(database.to_string()));
        }
        self.schemas.insert(database.to_string(), HashMap::new());
        Ok(())
    }

    fn add_table(&mut self, database: &str, config: &TableConfig) -> RouterResult<()> {
        let meta = TableMeta::from_config(database, config, self.slots)?;
        let tables = self
            .schemas
            .get_mut(database)
            .ok_or_else(|| RouterError::DatabaseNotFound(database.to_string()))?;
        if tables.contains_key(&meta.name) {
            return Err(RouterError::TableExists {
                database: database.to_string(),
                table: meta.name,
            });
        }
        tables.insert(meta.name.clone(), Arc::new(meta));
        Ok(())
    }
}

/// Sharding router
#[derive(Debug)]
pub struct Router {
    topology: RwLock<Topology>,
}

impl Router {
    /// Create an empty router with the default slot count
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_SLOTS)
    }

    /// Create an empty router with `slots` hash slots
    pub fn with_slots(slots: u32) -> Self {
        Self {
            topology: RwLock::new(Topology {
                slots: slots.max(1),
                schemas: HashMap::new(),
            }),
        }
    }

    /// Create a router from a validated config
    pub fn from_config(config: &RouterConfig) -> RouterResult<Self> {
        Ok(Self {
            topology: RwLock::new(Topology::from_config(config)?),
        })
    }

    /// Replace the whole topology. On error the old topology stays in place.
    pub fn reload(&self, config: &RouterConfig) -> RouterResult<()> {
        let topology = Topology::from_config(config)?;
        info!(
            slots = topology.slots,
            databases = topology.schemas.len(),
            "Router topology reloaded"
        );
        *self.topology.write() = topology;
        Ok(())
    }

    /// Size of the hash slot space
    pub fn slots(&self) -> u32 {
        self.topology.read().slots
    }

    /// Register an empty database
    pub fn create_database(&self, database: &str) -> RouterResult<()> {
        self.topology.write().create_database(database)?;
        info!(database, "Database created");
        Ok(())
    }

    /// Remove a database and all its tables
    pub fn drop_database(&self, database: &str) -> RouterResult<()> {
        self.topology
            .write()
            .schemas
            .remove(database)
            .ok_or_else(|| RouterError::DatabaseNotFound(database.to_string()))?;
        info!(database, "Database dropped");
        Ok(())
    }

    /// Register a table in an existing database
    pub fn add_table(&self, database: &str, config: &TableConfig) -> RouterResult<()> {
        self.topology.write().add_table(database, config)?;
        info!(
            database,
            table = %config.name,
            kind = ?config.kind,
            partitions = config.partitions.len(),
            "Table added"
        );
        Ok(())
    }

    /// Remove a table
    pub fn drop_table(&self, database: &str, table: &str) -> RouterResult<()> {
        let mut topology = self.topology.write();
        let tables = topology
            .schemas
            .get_mut(database)
            .ok_or_else(|| RouterError::DatabaseNotFound(database.to_string()))?;
        tables
            .remove(table)
            .ok_or_else(|| RouterError::TableNotFound {
                database: database.to_string(),
                table: table.to_string(),
            })?;
        info!(database, table, "Table dropped");
        Ok(())
    }

    /// Names of configured databases, sorted
    pub fn databases(&self) -> Vec<String> {
        let mut names: Vec<_> = self.topology.read().schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of the tables in a database, sorted
    pub fn tables(&self, database: &str) -> RouterResult<Vec<String>> {
        let topology = self.topology.read();
        let tables = topology
            .schemas
            .get(database)
            .ok_or_else(|| RouterError::DatabaseNotFound(database.to_string()))?;
        let mut names: Vec<_> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Look up the metadata of `database.table`
    pub fn resolve_table(&self, database: &str, table: &str) -> RouterResult<Arc<TableMeta>> {
        if database.is_empty() {
            return Err(RouterError::EmptyDatabase);
        }
        let topology = self.topology.read();
        let tables = topology
            .schemas
            .get(database)
            .ok_or_else(|| RouterError::DatabaseNotFound(database.to_string()))?;
        tables
            .get(table)
            .cloned()
            .ok_or_else(|| RouterError::TableNotFound {
                database: database.to_string(),
                table: table.to_string(),
            })
    }

    /// Position, in `all_partitions` order, of the partition owning `value`
    pub fn locate_partition(&self, table: &TableMeta, value: &ShardValue<'_>) -> RouterResult<usize> {
        if table.kind != TableKind::Sharded {
            return Err(RouterError::NotSharded(table.name.clone()));
        }
        let slot = value.slot(table.slots);
        table
            .partitions
            .iter()
            .position(|p| p.range.is_some_and(|r| r.contains(slot)))
            .ok_or_else(|| RouterError::SlotNotCovered {
                table: table.name.clone(),
                slot,
            })
    }

    /// Every partition of a table, in topology order
    pub fn all_partitions<'t>(&self, table: &'t TableMeta) -> &'t [PartitionMeta] {
        &table.partitions
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
