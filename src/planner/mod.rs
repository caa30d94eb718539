//! Statement planner
//!
//! Turns parsed statements into plans: one rewritten statement per backend
//! partition the statement has to reach.
//!
//! ## Pipeline
//!
//! ```text
//! SQL text
//!   → Parser::parse_delete() → DeleteStatement
//!   → DeletePlan::new() → PlanTree::add()
//!   → PlanTree::build() → Vec<Partition> per plan
//! ```
//!
//! ## Example
//!
//! ```
//! use shardplan::planner::{DeletePlan, PlanTree};
//! use shardplan::router::mock::mock_router;
//! use shardplan::sql::Parser;
//!
//! let router = mock_router("sbtest");
//! let sql = "delete from A where id = 1";
//! let stmt = Parser::parse_delete(sql).unwrap();
//!
//! let mut tree = PlanTree::new();
//! tree.add(DeletePlan::new("sbtest", sql, &stmt, &router)).unwrap();
//! tree.build().unwrap();
//! assert_eq!(tree.plans()[0].partitions()[0].backend, "backend6");
//! ```

pub mod delete;
pub mod error;
pub mod plan;
pub mod tree;

pub use delete::DeletePlan;
pub use error::{PlannerError, PlannerResult};
pub use plan::{Partition, Plan, PlanState, PlanType};
pub use tree::PlanTree;
