//! DELETE parser on top of sqlparser's MySQL tokenizer
//!
//! sqlparser's own statement parser rejects the MySQL DELETE modifiers
//! (`LOW_PRIORITY`, `QUICK`, `IGNORE`) and normalizes away details the
//! planner must preserve, so only its tokenizer is used here. Statements are
//! parsed by recursive descent into the internal AST.

use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::sql::ast::*;
use crate::sql::error::{SqlError, SqlResult};

/// Words that never parse as bare identifiers or aliases
const RESERVED: &[&str] = &[
    "AND",
    "AS",
    "ASC",
    "BETWEEN",
    "BY",
    "CROSS",
    "DELETE",
    "DESC",
    "DISTINCT",
    "DIV",
    "EXISTS",
    "FALSE",
    "FROM",
    "GROUP",
    "HAVING",
    "IGNORE",
    "IN",
    "INNER",
    "INSERT",
    "INTO",
    "IS",
    "JOIN",
    "LEFT",
    "LIKE",
    "LIMIT",
    "LOW_PRIORITY",
    "MOD",
    "NATURAL",
    "NOT",
    "NULL",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "PARTITION",
    "QUICK",
    "REGEXP",
    "RIGHT",
    "RLIKE",
    "SELECT",
    "SET",
    "STRAIGHT_JOIN",
    "TRUE",
    "UNION",
    "UPDATE",
    "USING",
    "VALUES",
    "WHERE",
    "XOR",
];

/// Check whether a word is reserved (case-insensitive)
pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|kw| kw.eq_ignore_ascii_case(word))
}

/// Deepest expression or table-reference nesting accepted
const MAX_DEPTH: usize = 50;

/// SQL parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Tokenize `sql` with the MySQL dialect, dropping whitespace and comments
    pub fn new(sql: &str) -> SqlResult<Self> {
        let dialect = MySqlDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()?
            .into_iter()
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect();
        Ok(Self {
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    /// Parse a single SQL statement
    pub fn parse_one(sql: &str) -> SqlResult<Statement> {
        let mut parser = Parser::new(sql)?;
        let stmt = parser.parse_statement()?;
        parser.consume_token(&Token::SemiColon);
        parser.expect_end()?;
        Ok(stmt)
    }

    /// Parse a single DELETE statement
    pub fn parse_delete(sql: &str) -> SqlResult<DeleteStatement> {
        match Self::parse_one(sql)? {
            Statement::Delete(delete) => Ok(delete),
        }
    }

    fn parse_statement(&mut self) -> SqlResult<Statement> {
        if self.peek_keyword("DELETE") {
            return Ok(Statement::Delete(self.parse_delete_statement()?));
        }
        match self.peek() {
            Some(Token::Word(w)) => Err(SqlError::Unsupported(format!(
                "{} statements",
                w.value.to_uppercase()
            ))),
            Some(token) => Err(SqlError::Parse(format!("Unexpected token {}", token))),
            None => Err(SqlError::Parse("Empty SQL statement".to_string())),
        }
    }

    fn parse_delete_statement(&mut self) -> SqlResult<DeleteStatement> {
        self.expect_keyword("DELETE")?;

        let mut modifiers = Vec::new();
        loop {
            if self.parse_keyword("LOW_PRIORITY") {
                modifiers.push(DeleteModifier::LowPriority);
            } else if self.parse_keyword("QUICK") {
                modifiers.push(DeleteModifier::Quick);
            } else if self.parse_keyword("IGNORE") {
                modifiers.push(DeleteModifier::Ignore);
            } else {
                break;
            }
        }

        let (targets, from) = if self.parse_keyword("FROM") {
            let refs = self.parse_table_refs()?;
            if self.parse_keyword("USING") {
                let targets = refs
                    .into_iter()
                    .map(into_target)
                    .collect::<SqlResult<Vec<_>>>()?;
                (targets, self.parse_table_refs()?)
            } else {
                (Vec::new(), refs)
            }
        } else {
            let targets = self.parse_targets()?;
            self.expect_keyword("FROM")?;
            (targets, self.parse_table_refs()?)
        };

        let selection = if self.parse_keyword("WHERE") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut order_by = Vec::new();
        if self.parse_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let expr = self.parse_expr()?;
                let order = if self.parse_keyword("ASC") {
                    Some(SortOrder::Asc)
                } else if self.parse_keyword("DESC") {
                    Some(SortOrder::Desc)
                } else {
                    None
                };
                order_by.push(OrderByItem { expr, order });
                if !self.consume_token(&Token::Comma) {
                    break;
                }
            }
        }

        let limit = if self.parse_keyword("LIMIT") {
            Some(self.parse_primary()?)
        } else {
            None
        };

        Ok(DeleteStatement {
            modifiers,
            targets,
            from,
            selection,
            order_by,
            limit,
        })
    }

    /// Target list of the `DELETE t1[.*], t2[.*] FROM ...` form
    fn parse_targets(&mut self) -> SqlResult<Vec<TableName>> {
        let mut targets = Vec::new();
        loop {
            targets.push(self.parse_table_name()?);
            if self.peek() == Some(&Token::Period) && self.peek_nth(1) == Some(&Token::Mul) {
                self.pos += 2;
            }
            if !self.consume_token(&Token::Comma) {
                return Ok(targets);
            }
        }
    }

    fn parse_table_refs(&mut self) -> SqlResult<Vec<TableRef>> {
        let mut refs = vec![self.parse_table_ref()?];
        while self.consume_token(&Token::Comma) {
            refs.push(self.parse_table_ref()?);
        }
        Ok(refs)
    }

    fn parse_table_ref(&mut self) -> SqlResult<TableRef> {
        let mut left = self.parse_table_factor()?;
        while let Some(join_type) = self.parse_join_type()? {
            let right = self.parse_table_factor()?;
            let constraint = if join_type == JoinType::Natural {
                JoinConstraint::None
            } else if self.parse_keyword("ON") {
                JoinConstraint::On(self.parse_expr()?)
            } else if self.peek_keyword("USING") && self.peek_nth(1) == Some(&Token::LParen) {
                self.pos += 2;
                let columns = self.parse_identifier_list()?;
                self.expect_token(&Token::RParen)?;
                JoinConstraint::Using(columns)
            } else {
                JoinConstraint::None
            };
            left = TableRef::Join {
                left: Box::new(left),
                right: Box::new(right),
                join_type,
                constraint,
            };
        }
        Ok(left)
    }

    fn parse_join_type(&mut self) -> SqlResult<Option<JoinType>> {
        let join_type = if self.parse_keyword("JOIN") {
            JoinType::Inner
        } else if self.parse_keyword("INNER") {
            self.expect_keyword("JOIN")?;
            JoinType::Inner
        } else if self.parse_keyword("CROSS") {
            self.expect_keyword("JOIN")?;
            JoinType::Cross
        } else if self.parse_keyword("STRAIGHT_JOIN") {
            JoinType::Straight
        } else if self.parse_keyword("LEFT") {
            self.parse_keyword("OUTER");
            self.expect_keyword("JOIN")?;
            JoinType::Left
        } else if self.parse_keyword("RIGHT") {
            self.parse_keyword("OUTER");
            self.expect_keyword("JOIN")?;
            JoinType::Right
        } else if self.parse_keyword("NATURAL") {
            self.expect_keyword("JOIN")?;
            JoinType::Natural
        } else {
            return Ok(None);
        };
        Ok(Some(join_type))
    }

    fn parse_table_factor(&mut self) -> SqlResult<TableRef> {
        if self.consume_token(&Token::LParen) {
            let refs = self.nested(Self::parse_table_refs)?;
            self.expect_token(&Token::RParen)?;
            return Ok(TableRef::Nested(refs));
        }

        let name = self.parse_table_name()?;
        let mut partitions = self.parse_partition_hint()?;
        let alias = if self.parse_keyword("AS") {
            Some(self.parse_identifier()?)
        } else if self.peek_identifier() {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        if partitions.is_empty() {
            partitions = self.parse_partition_hint()?;
        }

        Ok(TableRef::Table(AliasedTable {
            name,
            partitions,
            alias,
        }))
    }

    fn parse_partition_hint(&mut self) -> SqlResult<Vec<String>> {
        if !self.parse_keyword("PARTITION") {
            return Ok(Vec::new());
        }
        self.expect_token(&Token::LParen)?;
        let names = self.parse_identifier_list()?;
        self.expect_token(&Token::RParen)?;
        Ok(names)
    }

    fn parse_table_name(&mut self) -> SqlResult<TableName> {
        let first = self.parse_identifier()?;
        if self.peek() == Some(&Token::Period) && self.peek_nth(1) != Some(&Token::Mul) {
            self.pos += 1;
            let name = self.parse_identifier()?;
            return Ok(TableName::qualified(first, name));
        }
        Ok(TableName::new(first))
    }

    // ============ Expressions ============

    /// Parse an expression
    pub fn parse_expr(&mut self) -> SqlResult<Expr> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_xor()?;
        while self.parse_keyword("OR") {
            let right = self.parse_xor()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_xor(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_and()?;
        while self.parse_keyword("XOR") {
            let right = self.parse_and()?;
            left = binary(left, BinaryOp::Xor, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_not()?;
        while self.parse_keyword("AND") {
            let right = self.parse_not()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> SqlResult<Expr> {
        if self.parse_keyword("NOT") {
            let expr = self.nested(Self::parse_not)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) | Some(Token::DoubleEq) => Some(BinaryOp::Eq),
                Some(Token::Neq) => Some(BinaryOp::NotEq),
                Some(Token::Spaceship) => Some(BinaryOp::NullSafeEq),
                Some(Token::Lt) => Some(BinaryOp::Lt),
                Some(Token::LtEq) => Some(BinaryOp::LtEq),
                Some(Token::Gt) => Some(BinaryOp::Gt),
                Some(Token::GtEq) => Some(BinaryOp::GtEq),
                _ => None,
            };
            if let Some(op) = op {
                self.pos += 1;
                let right = self.parse_additive()?;
                left = binary(left, op, right);
                continue;
            }

            if self.parse_keyword("IS") {
                let negated = self.parse_keyword("NOT");
                self.expect_keyword("NULL")?;
                left = Expr::IsNull {
                    expr: Box::new(left),
                    negated,
                };
                continue;
            }

            let negated = self.peek_keyword("NOT")
                && ["IN", "BETWEEN", "LIKE", "REGEXP", "RLIKE"]
                    .iter()
                    .any(|kw| self.peek_nth_keyword(1, kw));
            if negated {
                self.pos += 1;
            }

            if self.parse_keyword("IN") {
                left = self.parse_in(left, negated)?;
            } else if self.parse_keyword("BETWEEN") {
                let low = self.parse_additive()?;
                self.expect_keyword("AND")?;
                let high = self.parse_additive()?;
                left = Expr::Between {
                    expr: Box::new(left),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                };
            } else if self.parse_keyword("LIKE") {
                let op = if negated {
                    BinaryOp::NotLike
                } else {
                    BinaryOp::Like
                };
                let right = self.parse_additive()?;
                left = binary(left, op, right);
            } else if self.parse_keyword("REGEXP") || self.parse_keyword("RLIKE") {
                let op = if negated {
                    BinaryOp::NotRegexp
                } else {
                    BinaryOp::Regexp
                };
                let right = self.parse_additive()?;
                left = binary(left, op, right);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_in(&mut self, expr: Expr, negated: bool) -> SqlResult<Expr> {
        self.expect_token(&Token::LParen)?;
        if self.peek_keyword("SELECT") {
            let subquery = self.parse_subquery_body()?;
            return Ok(Expr::InSubquery {
                expr: Box::new(expr),
                subquery,
                negated,
            });
        }
        let mut list = vec![self.parse_expr()?];
        while self.consume_token(&Token::Comma) {
            list.push(self.parse_expr()?);
        }
        self.expect_token(&Token::RParen)?;
        Ok(Expr::InList {
            expr: Box::new(expr),
            list,
            negated,
        })
    }

    fn parse_additive(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> SqlResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Mul) => BinaryOp::Mul,
                Some(Token::Div) => BinaryOp::Div,
                Some(Token::Mod) => BinaryOp::Mod,
                _ if self.peek_keyword("MOD") => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> SqlResult<Expr> {
        if self.consume_token(&Token::Minus) {
            // Fold the sign into numeric literals so `id = -5` stays a literal
            if let Some(Token::Number(text, _)) = self.peek() {
                let literal = number_literal(&format!("-{}", text));
                self.pos += 1;
                return Ok(Expr::Literal(literal));
            }
            let expr = self.nested(Self::parse_unary)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        if self.consume_token(&Token::Plus) {
            return self.nested(Self::parse_unary);
        }
        if self.consume_token(&Token::ExclamationMark) {
            let expr = self.nested(Self::parse_unary)?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Bang,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> SqlResult<Expr> {
        let token = self
            .next()
            .ok_or_else(|| SqlError::Parse("Unexpected end of input".to_string()))?;
        match token {
            Token::Number(text, _) => Ok(Expr::Literal(number_literal(&text))),
            Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => {
                Ok(Expr::Literal(Literal::String(s)))
            }
            Token::Placeholder(p) => Ok(Expr::Placeholder(p)),
            Token::LParen => {
                if self.peek_keyword("SELECT") {
                    return Ok(Expr::Subquery(self.parse_subquery_body()?));
                }
                let first = self.parse_expr()?;
                if self.consume_token(&Token::Comma) {
                    let mut items = vec![first];
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.consume_token(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect_token(&Token::RParen)?;
                    return Ok(Expr::Tuple(items));
                }
                self.expect_token(&Token::RParen)?;
                Ok(Expr::Nested(Box::new(first)))
            }
            Token::Word(w) if w.quote_style.is_none() && is_reserved(&w.value) => {
                match w.value.to_uppercase().as_str() {
                    "NULL" => Ok(Expr::Literal(Literal::Null)),
                    "TRUE" => Ok(Expr::Literal(Literal::Boolean(true))),
                    "FALSE" => Ok(Expr::Literal(Literal::Boolean(false))),
                    "EXISTS" => {
                        self.expect_token(&Token::LParen)?;
                        if !self.peek_keyword("SELECT") {
                            return Err(SqlError::Parse("Expected SELECT after EXISTS (".into()));
                        }
                        Ok(Expr::Exists(self.parse_subquery_body()?))
                    }
                    _ => Err(SqlError::Parse(format!("Unexpected keyword {}", w.value))),
                }
            }
            Token::Word(w) => {
                if w.quote_style.is_none() && self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    return self.parse_function(w.value);
                }
                self.parse_column(w.value)
            }
            other => Err(SqlError::Parse(format!("Unexpected token {}", other))),
        }
    }

    /// Column reference whose first identifier has been consumed
    fn parse_column(&mut self, first: String) -> SqlResult<Expr> {
        let mut parts = vec![first];
        while parts.len() < 3 && self.consume_token(&Token::Period) {
            parts.push(self.parse_identifier()?);
        }
        let name = parts.pop().unwrap_or_default();
        let table = match parts.len() {
            0 => None,
            1 => Some(TableName::new(parts.remove(0))),
            _ => {
                let table = parts.remove(1);
                Some(TableName::qualified(parts.remove(0), table))
            }
        };
        Ok(Expr::Column(ColumnRef { table, name }))
    }

    /// Function call whose name and opening parenthesis have been consumed
    fn parse_function(&mut self, name: String) -> SqlResult<Expr> {
        let distinct = self.parse_keyword("DISTINCT");
        let mut args = Vec::new();
        if self.consume_token(&Token::Mul) {
            args.push(Expr::Wildcard);
        } else if self.peek() != Some(&Token::RParen) {
            args.push(self.parse_expr()?);
            while self.consume_token(&Token::Comma) {
                args.push(self.parse_expr()?);
            }
        }
        self.expect_token(&Token::RParen)?;
        Ok(Expr::Function {
            name,
            args,
            distinct,
        })
    }

    /// Capture a parenthesized SELECT as text; the opening parenthesis has
    /// been consumed and the closing one is consumed here.
    fn parse_subquery_body(&mut self) -> SqlResult<Subquery> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.next() {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) if depth == 0 => break,
                Some(Token::RParen) => depth -= 1,
                Some(_) => {}
                None => return Err(SqlError::Parse("Unterminated subquery".to_string())),
            }
        }
        let sql = tokens_to_sql(&self.tokens[start..self.pos - 1]);
        Ok(Subquery { sql })
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_DEPTH`
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> SqlResult<T>) -> SqlResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(SqlError::Parse("recursion limit exceeded".to_string()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ============ Token helpers ============

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek_nth_keyword(0, keyword)
    }

    fn peek_nth_keyword(&self, n: usize, keyword: &str) -> bool {
        matches!(
            self.peek_nth(n),
            Some(Token::Word(w)) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword)
        )
    }

    /// Whether the next token can start an alias
    fn peek_identifier(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Word(w)) if w.quote_style.is_some() || !is_reserved(&w.value)
        )
    }

    fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> SqlResult<()> {
        if self.parse_keyword(keyword) {
            return Ok(());
        }
        Err(SqlError::Parse(format!(
            "Expected {}, found {}",
            keyword,
            self.describe_next()
        )))
    }

    fn consume_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, expected: &Token) -> SqlResult<()> {
        if self.consume_token(expected) {
            return Ok(());
        }
        Err(SqlError::Parse(format!(
            "Expected {}, found {}",
            expected,
            self.describe_next()
        )))
    }

    fn expect_end(&self) -> SqlResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(SqlError::Parse(format!("Unexpected token {}", token))),
        }
    }

    fn parse_identifier(&mut self) -> SqlResult<String> {
        match self.peek() {
            Some(Token::Word(w)) if w.quote_style.is_some() || !is_reserved(&w.value) => {
                let value = w.value.clone();
                self.pos += 1;
                Ok(value)
            }
            _ => Err(SqlError::Parse(format!(
                "Expected identifier, found {}",
                self.describe_next()
            ))),
        }
    }

    fn parse_identifier_list(&mut self) -> SqlResult<Vec<String>> {
        let mut names = vec![self.parse_identifier()?];
        while self.consume_token(&Token::Comma) {
            names.push(self.parse_identifier()?);
        }
        Ok(names)
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        }
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn number_literal(text: &str) -> Literal {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Literal::Integer(text.to_string())
    } else {
        Literal::Float(text.to_string())
    }
}

/// Turn a multi-table FROM entry of the USING form into a delete target
fn into_target(table: TableRef) -> SqlResult<TableName> {
    match table {
        TableRef::Table(AliasedTable {
            name,
            partitions,
            alias: None,
        }) if partitions.is_empty() => Ok(name),
        other => Err(SqlError::Parse(format!(
            "Expected table name in DELETE target list, found {}",
            other
        ))),
    }
}

/// Re-join tokens with single spaces, lower-casing reserved words
fn tokens_to_sql(tokens: &[Token]) -> String {
    let mut sql = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        let glue = match (prev, token) {
            (None, _) => false,
            (Some(Token::LParen) | Some(Token::Period), _) => false,
            (_, Token::RParen | Token::Comma | Token::Period) => false,
            _ => true,
        };
        if glue {
            sql.push(' ');
        }
        match token {
            Token::Word(w) if w.quote_style.is_none() && is_reserved(&w.value) => {
                sql.push_str(&w.value.to_lowercase());
            }
            other => sql.push_str(&other.to_string()),
        }
        prev = Some(token);
    }
    sql
}
