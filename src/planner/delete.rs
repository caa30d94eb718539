//! DELETE planning
//!
//! A `DeletePlan` validates one parsed DELETE, resolves its table against
//! the router and emits one rewritten statement per target partition:
//!
//! - single and global tables go to every partition of the table
//! - sharded tables go to the partitions owning the shard-key values of the
//!   first usable `key = literal` or `key IN (literals)` conjunct of the
//!   WHERE clause, and to every partition when there is none

use std::collections::BTreeSet;

use tracing::{debug, debug_span, Span};

use super::error::{
    PlannerError, PlannerResult, MULTITABLES_IN_DELETE, PARTITIONS_IN_DELETE,
    SUBQUERIES_IN_DELETE,
};
use super::plan::{plan_json, Partition, PlanState, PlanType};
use crate::router::{PartitionMeta, Router, ShardValue, TableKind, TableMeta};
use crate::sql::{AliasedTable, BinaryOp, DeleteStatement, Expr, Literal, TableName};

/// Plan for one DELETE statement
#[derive(Debug)]
pub struct DeletePlan<'a> {
    database: String,
    raw_query: String,
    stmt: &'a DeleteStatement,
    router: &'a Router,
    partitions: Vec<Partition>,
    state: PlanState,
    span: Span,
}

impl<'a> DeletePlan<'a> {
    /// Create a plan; nothing is validated until `build`
    pub fn new(
        database: impl Into<String>,
        raw_query: impl Into<String>,
        stmt: &'a DeleteStatement,
        router: &'a Router,
    ) -> Self {
        let database = database.into();
        let span = debug_span!("delete_plan", database = %database);
        Self {
            database,
            raw_query: raw_query.into(),
            stmt,
            router,
            partitions: Vec::new(),
            state: PlanState::Constructed,
            span,
        }
    }

    /// Validate the statement and compute its partitions.
    ///
    /// Building a built plan is a no-op; building a failed plan returns the
    /// error it failed with.
    pub fn build(&mut self) -> PlannerResult<()> {
        match &self.state {
            PlanState::Built => return Ok(()),
            PlanState::Failed(err) => return Err(err.clone()),
            PlanState::Building => return Err(PlannerError::Reentrant),
            PlanState::Constructed => {}
        }
        self.state = PlanState::Building;

        let span = self.span.clone();
        let _enter = span.enter();
        match self.plan_partitions() {
            Ok(partitions) => {
                debug!(
                    query = %self.raw_query,
                    partitions = partitions.len(),
                    "Delete plan built"
                );
                self.partitions = partitions;
                self.state = PlanState::Built;
                Ok(())
            }
            Err(err) => {
                debug!(query = %self.raw_query, error = %err, "Delete plan rejected");
                self.state = PlanState::Failed(err.clone());
                Err(err)
            }
        }
    }

    pub fn plan_type(&self) -> PlanType {
        PlanType::Delete
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// The parsed statement this plan was built from
    pub fn statement(&self) -> &'a DeleteStatement {
        self.stmt
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn state(&self) -> &PlanState {
        &self.state
    }

    pub fn to_json(&self) -> PlannerResult<String> {
        plan_json(&self.raw_query, &self.partitions)
    }

    /// Reject statement shapes that cannot be routed, in a fixed order:
    /// subqueries, then multiple tables, then PARTITION hints
    fn validate(&self) -> PlannerResult<&'a AliasedTable> {
        let stmt = self.stmt;
        if stmt.selection.as_ref().is_some_and(Expr::has_subquery) {
            return Err(PlannerError::Unsupported(SUBQUERIES_IN_DELETE));
        }

        let table = stmt
            .single_table()
            .ok_or(PlannerError::Unsupported(MULTITABLES_IN_DELETE))?;
        if !stmt.targets.iter().all(|t| names_table(t, table)) {
            return Err(PlannerError::Unsupported(MULTITABLES_IN_DELETE));
        }

        if stmt.has_partition_hint() {
            return Err(PlannerError::Unsupported(PARTITIONS_IN_DELETE));
        }
        Ok(table)
    }

    fn plan_partitions(&self) -> PlannerResult<Vec<Partition>> {
        let table = self.validate()?;
        let database = table.name.schema.as_deref().unwrap_or(&self.database);
        let meta = self.router.resolve_table(database, &table.name.name)?;
        let all = self.router.all_partitions(&meta);

        let targets: Vec<&PartitionMeta> = match meta.kind {
            TableKind::Single | TableKind::Global => all.iter().collect(),
            TableKind::Sharded => match self.shard_values(&meta, table) {
                Some(values) => {
                    let mut owners = BTreeSet::new();
                    for value in &values {
                        owners.insert(self.router.locate_partition(&meta, value)?);
                    }
                    debug!(
                        table = %meta.name,
                        values = values.len(),
                        partitions = owners.len(),
                        "Pruned by shard key"
                    );
                    owners.into_iter().filter_map(|i| all.get(i)).collect()
                }
                None => {
                    debug!(table = %meta.name, partitions = all.len(), "Broadcasting delete");
                    all.iter().collect()
                }
            },
        };

        Ok(targets
            .into_iter()
            .map(|p| {
                let physical = TableName::qualified(&meta.database, meta.physical_name(p));
                Partition {
                    query: self.stmt.with_table(&physical).to_string(),
                    backend: p.backend.clone(),
                    range: p.range_label(),
                }
            })
            .collect())
    }

    /// Shard-key values of the first usable top-level conjunct
    fn shard_values(&self, meta: &TableMeta, table: &AliasedTable) -> Option<Vec<ShardValue<'a>>> {
        let key = meta.shard_key.as_deref()?;
        let selection = self.stmt.selection.as_ref()?;
        for conjunct in selection.conjuncts() {
            match conjunct {
                Expr::BinaryOp {
                    left,
                    op: BinaryOp::Eq,
                    right,
                } => {
                    if let Some(value) = key_equality(left, right, key, table) {
                        return Some(vec![value]);
                    }
                }
                Expr::InList {
                    expr,
                    list,
                    negated: false,
                } if is_shard_column(expr, key, table) => {
                    let values: Option<Vec<_>> = list.iter().map(shard_value).collect();
                    if let Some(values) = values.filter(|v| !v.is_empty()) {
                        return Some(values);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// `key = literal` or `literal = key`
fn key_equality<'e>(
    left: &'e Expr,
    right: &'e Expr,
    key: &str,
    table: &AliasedTable,
) -> Option<ShardValue<'e>> {
    if is_shard_column(left, key, table) {
        shard_value(right)
    } else if is_shard_column(right, key, table) {
        shard_value(left)
    } else {
        None
    }
}

/// Whether a DELETE target names the table being deleted from
fn names_table(target: &TableName, table: &AliasedTable) -> bool {
    match &table.alias {
        Some(alias) => target.schema.is_none() && target.name == *alias,
        None => target.refers_to(&table.name),
    }
}

fn is_shard_column(expr: &Expr, key: &str, table: &AliasedTable) -> bool {
    match expr {
        Expr::Column(col) if col.name.eq_ignore_ascii_case(key) => match &col.table {
            None => true,
            Some(qualifier) => names_table(qualifier, table),
        },
        Expr::Nested(inner) => is_shard_column(inner, key, table),
        _ => false,
    }
}

/// Routable literal; integers outside i64 are not routable
fn shard_value(expr: &Expr) -> Option<ShardValue<'_>> {
    match expr {
        Expr::Literal(Literal::Integer(text)) => text.parse().ok().map(ShardValue::Int),
        Expr::Literal(Literal::String(text)) => Some(ShardValue::Str(text)),
        Expr::Nested(inner) => shard_value(inner),
        _ => None,
    }
}
