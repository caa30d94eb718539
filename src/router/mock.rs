//! Fixture topology
//!
//! Three tables over six backends, used by tests and by the CLI when no
//! config file is given:
//! - `A`: sharded on `id` into `A1`..`A6` over `backend1`..`backend6`
//! - `G`: global, replicated to `backend1` and `backend2`
//! - `S`: single, on `backend1`

use crate::router::{PartitionConfig, Router, RouterConfig, SchemaConfig, TableConfig, TableKind};

/// Sharded table `A`
pub fn mock_table_a_config() -> TableConfig {
    let segments = ["0-32", "32-64", "64-96", "96-256", "256-512", "512-4096"];
    TableConfig {
        name: "A".to_string(),
        kind: TableKind::Sharded,
        shard_key: Some("id".to_string()),
        partitions: segments
            .iter()
            .enumerate()
            .map(|(i, segment)| PartitionConfig {
                backend: format!("backend{}", i + 1),
                suffix: (i + 1).to_string(),
                segment: Some(segment.to_string()),
            })
            .collect(),
    }
}

/// Global table `G`
pub fn mock_table_g_config() -> TableConfig {
    TableConfig {
        name: "G".to_string(),
        kind: TableKind::Global,
        shard_key: None,
        partitions: ["backend1", "backend2"]
            .iter()
            .map(|backend| PartitionConfig {
                backend: backend.to_string(),
                suffix: String::new(),
                segment: None,
            })
            .collect(),
    }
}

/// Single table `S`
pub fn mock_table_s_config() -> TableConfig {
    TableConfig {
        name: "S".to_string(),
        kind: TableKind::Single,
        shard_key: None,
        partitions: vec![PartitionConfig {
            backend: "backend1".to_string(),
            suffix: String::new(),
            segment: None,
        }],
    }
}

/// Config holding `A`, `G` and `S` in `database`
pub fn mock_config(database: &str) -> RouterConfig {
    RouterConfig {
        schemas: vec![SchemaConfig {
            database: database.to_string(),
            tables: vec![
                mock_table_a_config(),
                mock_table_g_config(),
                mock_table_s_config(),
            ],
        }],
        ..RouterConfig::default()
    }
}

/// Router holding `A`, `G` and `S` in `database`; empty if `database` is empty
pub fn mock_router(database: &str) -> Router {
    Router::from_config(&mock_config(database)).unwrap_or_default()
}
