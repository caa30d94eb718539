//! shardplan - statement planning for a MySQL sharding proxy
//!
//! Features:
//! - MySQL DELETE parsing into a typed AST with canonical rendering
//! - Router topology of single, global and hash-sharded tables
//! - Per-partition rewriting of DELETE statements, serialized as JSON

pub mod planner;
pub mod router;
pub mod sql;
