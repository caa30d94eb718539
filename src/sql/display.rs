//! Canonical SQL rendering
//!
//! Every AST node renders in one normalized form: keywords lower-case,
//! single spaces around binary operators, `", "` between list items, and an
//! explicit direction on each ORDER BY key. Rendered text re-parses to an
//! equal tree, which is what lets the planner hand it to a backend.

use std::fmt::{self, Display, Formatter, Write};

use super::ast::*;
use super::parser::is_reserved;

/// Write an identifier, backquoting it when it would not lex back as one
fn write_ident(f: &mut Formatter<'_>, name: &str) -> fmt::Result {
    let plain = !name.is_empty()
        && !name.bytes().all(|b| b.is_ascii_digit())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
        && !is_reserved(name);
    if plain {
        f.write_str(name)
    } else {
        write!(f, "`{}`", name.replace('`', "``"))
    }
}

fn write_string(f: &mut Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in value.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\0' => f.write_str("\\0")?,
            '\x1a' => f.write_str("\\Z")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_ident_list(f: &mut Formatter<'_>, names: &[String]) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_ident(f, name)?;
    }
    Ok(())
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(true) => f.write_str("true"),
            Literal::Boolean(false) => f.write_str("false"),
            Literal::Integer(text) | Literal::Float(text) => f.write_str(text),
            Literal::String(value) => write_string(f, value),
        }
    }
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::NullSafeEq => "<=>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Like => "like",
            BinaryOp::NotLike => "not like",
            BinaryOp::Regexp => "regexp",
            BinaryOp::NotRegexp => "not regexp",
        }
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write_ident(f, schema)?;
            f.write_char('.')?;
        }
        write_ident(f, &self.name)
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            write!(f, "{}.", table)?;
        }
        write_ident(f, &self.name)
    }
}

impl Display for Subquery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(col) => write!(f, "{}", col),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Placeholder(text) => f.write_str(text),
            Expr::BinaryOp { left, op, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            Expr::UnaryOp {
                op: UnaryOp::Not,
                expr,
            } => write!(f, "not {}", expr),
            Expr::UnaryOp {
                op: UnaryOp::Bang,
                expr,
            } => {
                // "!!" lexes as a single token
                let inner = expr.to_string();
                if inner.starts_with('!') {
                    write!(f, "! {}", inner)
                } else {
                    write!(f, "!{}", inner)
                }
            }
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                expr,
            } => {
                // "--" would start a comment
                let inner = expr.to_string();
                if inner.starts_with('-') {
                    write!(f, "- {}", inner)
                } else {
                    write!(f, "-{}", inner)
                }
            }
            Expr::Nested(expr) => write!(f, "({})", expr),
            Expr::Tuple(items) => {
                f.write_char('(')?;
                write_list(f, items)?;
                f.write_char(')')
            }
            Expr::Function {
                name,
                args,
                distinct,
            } => {
                write!(f, "{}(", name)?;
                if *distinct {
                    f.write_str("distinct ")?;
                }
                write_list(f, args)?;
                f.write_char(')')
            }
            Expr::IsNull { expr, negated } => {
                if *negated {
                    write!(f, "{} is not null", expr)
                } else {
                    write!(f, "{} is null", expr)
                }
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{} {} (", expr, if *negated { "not in" } else { "in" })?;
                write_list(f, list)?;
                f.write_char(')')
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => write!(
                f,
                "{} {} ({})",
                expr,
                if *negated { "not in" } else { "in" },
                subquery
            ),
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {} {} and {}",
                expr,
                if *negated { "not between" } else { "between" },
                low,
                high
            ),
            Expr::Exists(subquery) => write!(f, "exists ({})", subquery),
            Expr::Subquery(subquery) => write!(f, "({})", subquery),
            Expr::Wildcard => f.write_char('*'),
        }
    }
}

impl Display for AliasedTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.partitions.is_empty() {
            f.write_str(" partition (")?;
            write_ident_list(f, &self.partitions)?;
            f.write_char(')')?;
        }
        if let Some(alias) = &self.alias {
            f.write_str(" as ")?;
            write_ident(f, alias)?;
        }
        Ok(())
    }
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "join",
            JoinType::Cross => "cross join",
            JoinType::Straight => "straight_join",
            JoinType::Left => "left join",
            JoinType::Right => "right join",
            JoinType::Natural => "natural join",
        }
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Table(table) => write!(f, "{}", table),
            TableRef::Join {
                left,
                right,
                join_type,
                constraint,
            } => {
                write!(f, "{} {} {}", left, join_type.as_str(), right)?;
                match constraint {
                    JoinConstraint::None => Ok(()),
                    JoinConstraint::On(expr) => write!(f, " on {}", expr),
                    JoinConstraint::Using(columns) => {
                        f.write_str(" using (")?;
                        write_ident_list(f, columns)?;
                        f.write_char(')')
                    }
                }
            }
            TableRef::Nested(refs) => {
                f.write_char('(')?;
                write_list(f, refs)?;
                f.write_char(')')
            }
        }
    }
}

impl Display for OrderByItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.order {
            Some(SortOrder::Desc) => write!(f, "{} desc", self.expr),
            Some(SortOrder::Asc) | None => write!(f, "{} asc", self.expr),
        }
    }
}

impl DeleteModifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteModifier::LowPriority => "low_priority",
            DeleteModifier::Quick => "quick",
            DeleteModifier::Ignore => "ignore",
        }
    }
}

impl Display for DeleteStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("delete ")?;
        for modifier in &self.modifiers {
            write!(f, "{} ", modifier.as_str())?;
        }
        if !self.targets.is_empty() {
            write_list(f, &self.targets)?;
            f.write_char(' ')?;
        }
        f.write_str("from ")?;
        write_list(f, &self.from)?;
        if let Some(selection) = &self.selection {
            write!(f, " where {}", selection)?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" order by ")?;
            write_list(f, &self.order_by)?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Delete(delete) => write!(f, "{}", delete),
        }
    }
}
