//! Internal AST types
//!
//! These types represent a parsed DELETE statement as an immutable value
//! tree. Rewriting never mutates a tree in place: `DeleteStatement::with_table`
//! clones first and substitutes on the copy, so trees derived from one source
//! never share state.

/// Literal value, numbers kept as written
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(String),
    Float(String),
    String(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    NotEq,
    NullSafeEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // Logical
    And,
    Or,
    Xor,
    // String
    Like,
    NotLike,
    Regexp,
    NotRegexp,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `NOT`, looser than comparison
    Not,
    /// `!`, tighter than comparison
    Bang,
    Neg,
}

/// Qualified table name, `[schema.]name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Whether `other` names the same table, treating a missing schema on
    /// either side as a wildcard.
    pub fn refers_to(&self, other: &TableName) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.schema, &other.schema) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// Column reference (optionally qualified with a table name)
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<TableName>,
    pub name: String,
}

/// Subquery kept as canonical token text; never planned, only detected
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub sql: String,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(ColumnRef),
    /// Literal value
    Literal(Literal),
    /// Bind placeholder (`?`)
    Placeholder(String),
    /// Binary operation
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// Parenthesized expression
    Nested(Box<Expr>),
    /// Row constructor `(a, b)`
    Tuple(Vec<Expr>),
    /// Function call
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },
    /// IN (list)
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    /// IN (SELECT ...)
    InSubquery {
        expr: Box<Expr>,
        subquery: Subquery,
        negated: bool,
    },
    /// BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// EXISTS (SELECT ...)
    Exists(Subquery),
    /// Scalar subquery
    Subquery(Subquery),
    /// `*` inside COUNT(*)
    Wildcard,
}

impl Expr {
    /// Check whether a subquery appears anywhere in this tree
    pub fn has_subquery(&self) -> bool {
        match self {
            Expr::InSubquery { .. } | Expr::Exists(_) | Expr::Subquery(_) => true,
            Expr::Column(_) | Expr::Literal(_) | Expr::Placeholder(_) | Expr::Wildcard => false,
            Expr::BinaryOp { left, right, .. } => left.has_subquery() || right.has_subquery(),
            Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::IsNull { expr, .. } => {
                expr.has_subquery()
            }
            Expr::Tuple(items) | Expr::Function { args: items, .. } => {
                items.iter().any(Expr::has_subquery)
            }
            Expr::InList { expr, list, .. } => {
                expr.has_subquery() || list.iter().any(Expr::has_subquery)
            }
            Expr::Between {
                expr, low, high, ..
            } => expr.has_subquery() || low.has_subquery() || high.has_subquery(),
        }
    }

    /// Split the top-level AND chain into its conjuncts.
    ///
    /// Parentheses around a conjunction are looked through; anything else
    /// (OR, XOR, NOT, ...) is returned whole as a single conjunct.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::BinaryOp {
                left,
                op: BinaryOp::And,
                right,
            } => {
                left.collect_conjuncts(out);
                right.collect_conjuncts(out);
            }
            Expr::Nested(inner) => inner.collect_conjuncts(out),
            other => out.push(other),
        }
    }

    /// Point column qualifiers naming `from` at `to` instead
    fn rename_table(&mut self, from: &TableName, to: &TableName) {
        match self {
            Expr::Column(col) => {
                if let Some(table) = col.table.as_mut() {
                    if table.refers_to(from) {
                        table.name = to.name.clone();
                        if table.schema.is_some() {
                            table.schema = to.schema.clone();
                        }
                    }
                }
            }
            Expr::Literal(_)
            | Expr::Placeholder(_)
            | Expr::Wildcard
            | Expr::Subquery(_)
            | Expr::Exists(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.rename_table(from, to);
                right.rename_table(from, to);
            }
            Expr::UnaryOp { expr, .. }
            | Expr::Nested(expr)
            | Expr::IsNull { expr, .. }
            | Expr::InSubquery { expr, .. } => expr.rename_table(from, to),
            Expr::Tuple(items) | Expr::Function { args: items, .. } => {
                for item in items {
                    item.rename_table(from, to);
                }
            }
            Expr::InList { expr, list, .. } => {
                expr.rename_table(from, to);
                for item in list {
                    item.rename_table(from, to);
                }
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.rename_table(from, to);
                low.rename_table(from, to);
                high.rename_table(from, to);
            }
        }
    }
}

/// Table reference with optional PARTITION hint and alias
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedTable {
    pub name: TableName,
    pub partitions: Vec<String>,
    pub alias: Option<String>,
}

/// JOIN type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Cross,
    Straight,
    Left,
    Right,
    Natural,
}

/// JOIN condition
#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    None,
    On(Expr),
    Using(Vec<String>),
}

/// Entry of a FROM/USING table list
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    Table(AliasedTable),
    Join {
        left: Box<TableRef>,
        right: Box<TableRef>,
        join_type: JoinType,
        constraint: JoinConstraint,
    },
    /// Parenthesized table references
    Nested(Vec<TableRef>),
}

impl TableRef {
    /// Whether any table in this reference carries a PARTITION hint
    pub fn has_partition_hint(&self) -> bool {
        match self {
            TableRef::Table(table) => !table.partitions.is_empty(),
            TableRef::Join { left, right, .. } => {
                left.has_partition_hint() || right.has_partition_hint()
            }
            TableRef::Nested(refs) => refs.iter().any(TableRef::has_partition_hint),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// ORDER BY item; `order` is `None` when the source gave no direction
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub order: Option<SortOrder>,
}

/// DELETE statement modifier keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteModifier {
    LowPriority,
    Quick,
    Ignore,
}

/// DELETE statement.
///
/// Single-table syntax leaves `targets` empty. The multi-table forms
/// (`DELETE t1, t2 FROM ...` and `DELETE FROM t1, t2 USING ...`) both
/// normalize to `targets` plus the table references in `from`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub modifiers: Vec<DeleteModifier>,
    pub targets: Vec<TableName>,
    pub from: Vec<TableRef>,
    pub selection: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Expr>,
}

impl DeleteStatement {
    /// The one table this statement deletes from, if it names exactly one
    pub fn single_table(&self) -> Option<&AliasedTable> {
        if self.targets.len() > 1 || self.from.len() != 1 {
            return None;
        }
        match &self.from[0] {
            TableRef::Table(table) => Some(table),
            TableRef::Join { .. } | TableRef::Nested(_) => None,
        }
    }

    /// Whether any table reference carries a PARTITION hint
    pub fn has_partition_hint(&self) -> bool {
        self.from.iter().any(TableRef::has_partition_hint)
    }

    /// Clone this statement with its single table replaced by `table`.
    ///
    /// Targets and column qualifiers that named the old table (when it has
    /// no alias) follow the substitution. Multi-table statements come back
    /// unchanged.
    pub fn with_table(&self, table: &TableName) -> DeleteStatement {
        let mut stmt = self.clone();
        let Some(TableRef::Table(aliased)) = stmt.from.first_mut() else {
            return stmt;
        };
        let old = std::mem::replace(&mut aliased.name, table.clone());
        if aliased.alias.is_some() {
            return stmt;
        }

        for target in &mut stmt.targets {
            if target.refers_to(&old) {
                *target = table.clone();
            }
        }
        if let Some(selection) = stmt.selection.as_mut() {
            selection.rename_table(&old, table);
        }
        for item in &mut stmt.order_by {
            item.expr.rename_table(&old, table);
        }
        stmt
    }
}

/// SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// DELETE
    Delete(DeleteStatement),
}
