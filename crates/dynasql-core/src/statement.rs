//! Statement parser.
//!
//! Turns a SQL-subset statement into a [`ParsedStatement`]. The statement
//! is tokenized once; WHERE clauses are sliced back out of the source text
//! by token span and handed to [`parse_condition`]. Parsing has no side
//! effects and never touches the store.

use std::collections::HashSet;

use dynasql_model::{AttributeValue, Item};

use crate::error::{SqlError, SqlResult};
use crate::expression::lexer::{Keyword, Lexer, Spanned, Token};
use crate::expression::{LogicalOp, ParseError, Predicate, parse_condition};
use crate::projection::Projection;

/// A parsed statement, one variant per statement kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStatement {
    /// `SELECT ... FROM table ...`
    Select(SelectStatement),
    /// `INSERT INTO table (...) VALUES (...)`
    Insert(InsertStatement),
    /// `UPDATE table SET ... WHERE ...`
    Update(UpdateStatement),
    /// `DELETE FROM table WHERE ...`
    Delete(DeleteStatement),
    /// `SELECT ... FROM a JOIN b ON x = y ...`
    Join(JoinStatement),
}

impl ParsedStatement {
    /// Short statement kind name, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::Join(_) => "JOIN",
        }
    }
}

/// Single-table SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Table name.
    pub table: String,
    /// Requested columns.
    pub projection: Projection,
    /// WHERE predicate, if any.
    pub predicate: Option<Predicate>,
    /// ORDER BY clause, if any.
    pub order_by: Option<OrderBy>,
    /// LIMIT, if any.
    pub limit: Option<usize>,
}

/// `ORDER BY attribute [ASC|DESC]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Attribute to order by.
    pub attribute: String,
    /// `true` for ascending (the default).
    pub ascending: bool,
}

/// INSERT of a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Table name.
    pub table: String,
    /// Column to value mapping.
    pub item: Item,
}

/// UPDATE with attribute-level SET assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Table name.
    pub table: String,
    /// Assignments in source order.
    pub assignments: Vec<(String, AttributeValue)>,
    /// WHERE predicate.
    pub predicate: Predicate,
}

/// DELETE of the item identified by the WHERE predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Table name.
    pub table: String,
    /// WHERE predicate.
    pub predicate: Predicate,
}

/// Two-table JOIN.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStatement {
    /// Tables and join attributes.
    pub join: JoinSpec,
    /// Requested columns (possibly table-qualified).
    pub projection: Projection,
    /// WHERE predicate, if any. Never contains OR.
    pub predicate: Option<Predicate>,
    /// LIMIT, if any.
    pub limit: Option<usize>,
}

/// Tables and attributes of `left JOIN right ON left.a = right.b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Left (FROM) table.
    pub left_table: String,
    /// Right (JOIN) table.
    pub right_table: String,
    /// Join attribute on the left table.
    pub left_attribute: String,
    /// Join attribute on the right table.
    pub right_attribute: String,
}

impl JoinSpec {
    /// Parse an `a = b` join condition. Attributes may be qualified with
    /// either table name; unqualified attributes are taken left then right.
    pub fn parse(left_table: &str, right_table: &str, condition: &str) -> SqlResult<Self> {
        let tokens =
            Lexer::new(condition).tokenize().map_err(|e| SqlError::parse(condition, e))?;
        let mut cursor = Cursor::new(condition, tokens);
        let spec = cursor.parse_join_condition(left_table, right_table)?;
        cursor.expect_end()?;
        Ok(spec)
    }
}

/// Parse a statement.
///
/// Leading keywords are case-insensitive and a single trailing `;` is
/// accepted.
///
/// # Errors
///
/// - [`SqlError::UnsupportedStatement`] for verbs and features outside the
///   subset (function calls, subqueries, GROUP BY, outer joins, OR in a JOIN
///   WHERE).
/// - [`SqlError::MalformedStatement`] for missing clauses, column/value
///   count mismatches, duplicate columns and trailing input.
/// - [`SqlError::Parse`] for invalid WHERE clauses and literals.
pub fn parse_statement(sql: &str) -> SqlResult<ParsedStatement> {
    let tokens = match Lexer::new(sql).tokenize_partial() {
        (tokens, None) => tokens,
        (read, Some(e)) => return Err(SqlError::parse(failing_clause(sql, &read), e)),
    };
    let mut cursor = Cursor::new(sql, tokens);
    cursor.strip_trailing_semicolon();

    let statement = match cursor.peek().clone() {
        Token::Keyword(Keyword::Select) => {
            cursor.advance();
            cursor.parse_select()?
        }
        Token::Keyword(Keyword::Insert) => {
            cursor.advance();
            ParsedStatement::Insert(cursor.parse_insert()?)
        }
        Token::Keyword(Keyword::Update) => {
            cursor.advance();
            ParsedStatement::Update(cursor.parse_update()?)
        }
        Token::Keyword(Keyword::Delete) => {
            cursor.advance();
            ParsedStatement::Delete(cursor.parse_delete()?)
        }
        Token::Eof => return Err(SqlError::malformed("empty statement", sql.trim())),
        other => {
            return Err(SqlError::unsupported(
                format!("unsupported statement starting with {other}"),
                cursor.near(),
            ));
        }
    };
    cursor.expect_end()?;
    Ok(statement)
}

/// The text a tokenizer error is reported against: the WHERE clause when
/// the error follows one, else the whole statement.
fn failing_clause<'a>(sql: &'a str, read: &[Spanned]) -> &'a str {
    let clause = read
        .iter()
        .rposition(|s| s.token.is_keyword(Keyword::Where))
        .map_or(sql, |i| &sql[read[i].end..]);
    clause.trim().trim_end_matches(';').trim_end()
}

/// Build a projection from a column list, rejecting duplicates. A single
/// `*` selects all attributes.
pub fn projection_from_columns<S: AsRef<str>>(columns: &[S]) -> SqlResult<Projection> {
    let names: Vec<&str> = columns.iter().map(|c| c.as_ref().trim()).collect();
    if names.is_empty() {
        return Err(SqlError::malformed("empty column list", ""));
    }
    if names.contains(&"*") {
        if names.len() > 1 {
            return Err(SqlError::malformed(
                "'*' cannot be combined with other columns",
                names.join(", "),
            ));
        }
        return Ok(Projection::All);
    }
    check_unique(names.iter().copied())?;
    Ok(Projection::Columns(
        names.into_iter().map(str::to_owned).collect(),
    ))
}

fn check_unique<'a>(names: impl IntoIterator<Item = &'a str>) -> SqlResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(SqlError::malformed("empty column name", ""));
        }
        if !seen.insert(name) {
            return Err(SqlError::malformed(
                format!("duplicate column '{name}'"),
                name,
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Token cursor over one statement.
struct Cursor<'a> {
    sql: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(sql: &'a str, tokens: Vec<Spanned>) -> Self {
        Self {
            sql,
            tokens,
            pos: 0,
        }
    }

    fn strip_trailing_semicolon(&mut self) {
        let len = self.tokens.len();
        if len >= 2 && self.tokens[len - 2].token == Token::Semicolon {
            self.tokens.remove(len - 2);
        }
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map_or(&Token::Eof, |s| &s.token)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.peek().is_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Source text from the current token to the end of the statement.
    fn near(&self) -> String {
        match self.tokens.get(self.pos) {
            Some(s) if s.token != Token::Eof => self.sql[s.start..].trim().to_owned(),
            _ => self.sql.trim().to_owned(),
        }
    }

    /// Source text covered by tokens `from..to`.
    fn text(&self, from: usize, to: usize) -> &'a str {
        if from >= to {
            return "";
        }
        &self.sql[self.tokens[from].start..self.tokens[to - 1].end]
    }

    fn expect_keyword(&mut self, kw: Keyword, message: &str) -> SqlResult<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(SqlError::malformed(message, self.near()))
        }
    }

    fn expect_end(&mut self) -> SqlResult<()> {
        match self.peek() {
            Token::Eof => Ok(()),
            Token::Keyword(Keyword::Group | Keyword::Having) => {
                Err(SqlError::unsupported("GROUP BY and HAVING are not supported", self.near()))
            }
            Token::Keyword(Keyword::Union) => {
                Err(SqlError::unsupported("UNION is not supported", self.near()))
            }
            _ => Err(SqlError::malformed("unexpected trailing input", self.near())),
        }
    }

    /// A column or attribute name. A following `(` makes it a function
    /// call, which is rejected.
    fn expect_identifier(&mut self, what: &str) -> SqlResult<String> {
        let name = self.expect_name(what)?;
        if matches!(self.peek(), Token::LParen) {
            return Err(SqlError::unsupported(
                format!("function call {name}() is not supported"),
                self.near_previous(),
            ));
        }
        Ok(name)
    }

    fn expect_name(&mut self, what: &str) -> SqlResult<String> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            Token::LParen => Err(SqlError::unsupported("subqueries are not supported", self.near())),
            Token::Eof => Err(SqlError::malformed(format!("missing {what}"), self.near())),
            other => Err(SqlError::malformed(
                format!("expected {what}, found {other}"),
                self.near(),
            )),
        }
    }

    /// Like [`Cursor::near`] but starting one token back.
    fn near_previous(&self) -> String {
        let start = self.tokens[self.pos.saturating_sub(1)].start;
        self.sql[start..].trim().to_owned()
    }

    fn expect_table(&mut self) -> SqlResult<String> {
        self.expect_name("table name")
    }

    /// Consume tokens up to the next clause boundary and parse them as a
    /// condition.
    fn parse_where_clause(&mut self) -> SqlResult<Predicate> {
        let from = self.pos;
        while !matches!(
            self.peek(),
            Token::Eof
                | Token::Semicolon
                | Token::Keyword(
                    Keyword::Order | Keyword::Limit | Keyword::Group | Keyword::Having | Keyword::Union
                )
        ) {
            self.advance();
        }
        let clause = self.text(from, self.pos);
        parse_condition(clause).map_err(|e| SqlError::parse(clause.trim(), e))
    }

    fn parse_column_list(&mut self) -> SqlResult<Projection> {
        if matches!(self.peek(), Token::Star) {
            self.advance();
            return Ok(Projection::All);
        }
        let mut columns = Vec::new();
        loop {
            columns.push(self.expect_identifier("column name")?);
            if matches!(self.peek(), Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        projection_from_columns(&columns)
    }

    fn parse_limit(&mut self) -> SqlResult<Option<usize>> {
        if !self.eat_keyword(Keyword::Limit) {
            return Ok(None);
        }
        match self.peek().clone() {
            Token::Number(n) => {
                let limit = n.parse::<usize>().map_err(|_| {
                    SqlError::malformed("LIMIT requires a non-negative integer", self.near())
                })?;
                self.advance();
                Ok(Some(limit))
            }
            _ => Err(SqlError::malformed(
                "LIMIT requires a non-negative integer",
                self.near(),
            )),
        }
    }

    /// Parse a literal value for INSERT/UPDATE.
    fn parse_value(&mut self) -> SqlResult<AttributeValue> {
        let value = match self.peek().clone() {
            Token::Str(s) => AttributeValue::S(s),
            Token::Number(n) => AttributeValue::N(n),
            Token::Keyword(Keyword::True) => AttributeValue::Bool(true),
            Token::Keyword(Keyword::False) => AttributeValue::Bool(false),
            Token::Keyword(Keyword::Null) => AttributeValue::Null(true),
            Token::Identifier(word) => {
                if matches!(self.peek_at(1), Token::LParen) {
                    return Err(SqlError::unsupported(
                        format!("function call {word}() is not supported"),
                        self.near(),
                    ));
                }
                return Err(SqlError::parse(
                    self.near(),
                    ParseError::UntypedLiteral { literal: word },
                ));
            }
            Token::LParen => {
                return Err(SqlError::unsupported("subqueries are not supported", self.near()));
            }
            Token::Eof => return Err(SqlError::malformed("missing value", self.near())),
            other => {
                return Err(SqlError::malformed(
                    format!("expected a value, found {other}"),
                    self.near(),
                ));
            }
        };
        self.advance();
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Statement kinds
// ---------------------------------------------------------------------------

impl Cursor<'_> {
    fn parse_select(&mut self) -> SqlResult<ParsedStatement> {
        let projection = self.parse_column_list()?;
        self.expect_keyword(Keyword::From, "SELECT requires FROM <table>")?;
        let table = self.expect_table()?;

        match self.peek() {
            Token::Keyword(Keyword::Join | Keyword::Inner) => {
                return self.parse_join(table, projection).map(ParsedStatement::Join);
            }
            Token::Keyword(Keyword::Left | Keyword::Right | Keyword::Outer) => {
                return Err(SqlError::unsupported(
                    "only INNER JOIN is supported",
                    self.near(),
                ));
            }
            Token::Comma => {
                return Err(SqlError::unsupported(
                    "multiple tables in FROM are not supported, use JOIN",
                    self.near(),
                ));
            }
            _ => {}
        }

        let predicate = if self.eat_keyword(Keyword::Where) {
            Some(self.parse_where_clause()?)
        } else {
            None
        };

        let order_by = if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By, "ORDER must be followed by BY")?;
            let attribute = self.expect_identifier("ORDER BY attribute")?;
            let ascending = if self.eat_keyword(Keyword::Desc) {
                false
            } else {
                self.eat_keyword(Keyword::Asc);
                true
            };
            if matches!(self.peek(), Token::Comma) {
                return Err(SqlError::unsupported(
                    "ORDER BY supports a single attribute",
                    self.near(),
                ));
            }
            Some(OrderBy {
                attribute,
                ascending,
            })
        } else {
            None
        };

        let limit = self.parse_limit()?;

        Ok(ParsedStatement::Select(SelectStatement {
            table,
            projection,
            predicate,
            order_by,
            limit,
        }))
    }

    fn parse_join(&mut self, left_table: String, projection: Projection) -> SqlResult<JoinStatement> {
        self.eat_keyword(Keyword::Inner);
        self.expect_keyword(Keyword::Join, "INNER must be followed by JOIN")?;
        let right_table = self.expect_table()?;
        self.expect_keyword(Keyword::On, "JOIN requires ON <attribute> = <attribute>")?;
        let join = self.parse_join_condition(&left_table, &right_table)?;

        let predicate = if self.eat_keyword(Keyword::Where) {
            let where_start = self.pos;
            let predicate = self.parse_where_clause()?;
            if contains_or(&predicate) {
                return Err(SqlError::unsupported(
                    "OR is not supported in a JOIN WHERE clause",
                    self.text(where_start, self.pos).trim(),
                ));
            }
            Some(predicate)
        } else {
            None
        };

        if self.peek().is_keyword(Keyword::Order) {
            return Err(SqlError::unsupported(
                "ORDER BY is not supported with JOIN",
                self.near(),
            ));
        }
        let limit = self.parse_limit()?;

        Ok(JoinStatement {
            join,
            projection,
            predicate,
            limit,
        })
    }

    fn parse_join_condition(&mut self, left_table: &str, right_table: &str) -> SqlResult<JoinSpec> {
        let from = self.pos;
        let first = self.expect_identifier("join attribute")?;
        if !matches!(self.peek(), Token::Eq) {
            return Err(SqlError::unsupported(
                "JOIN ON supports a single attribute equality",
                self.text(from, self.pos + 1),
            ));
        }
        self.advance();
        let second = match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                name
            }
            _ => {
                return Err(SqlError::unsupported(
                    "JOIN ON supports a single attribute equality",
                    self.near_previous(),
                ));
            }
        };
        if self.peek().is_keyword(Keyword::And) || self.peek().is_keyword(Keyword::Or) {
            return Err(SqlError::unsupported(
                "JOIN ON supports a single attribute equality",
                self.text(from, self.tokens.len() - 1),
            ));
        }

        let condition = self.text(from, self.pos).to_owned();
        let (first_table, first_attr) = split_qualified(&first);
        let (second_table, second_attr) = split_qualified(&second);

        for qualifier in [first_table, second_table].into_iter().flatten() {
            if qualifier != left_table && qualifier != right_table {
                return Err(SqlError::malformed(
                    format!("unknown table '{qualifier}' in JOIN condition"),
                    condition,
                ));
            }
        }

        let swapped = first_table == Some(right_table) || second_table == Some(left_table);
        let (left_attribute, right_attribute) = if swapped && left_table != right_table {
            (second_attr, first_attr)
        } else {
            (first_attr, second_attr)
        };

        Ok(JoinSpec {
            left_table: left_table.to_owned(),
            right_table: right_table.to_owned(),
            left_attribute: left_attribute.to_owned(),
            right_attribute: right_attribute.to_owned(),
        })
    }

    fn parse_insert(&mut self) -> SqlResult<InsertStatement> {
        self.expect_keyword(Keyword::Into, "INSERT requires INTO <table>")?;
        let table = self.expect_table()?;

        if !matches!(self.peek(), Token::LParen) {
            return Err(SqlError::malformed(
                "INSERT requires a column list",
                self.near(),
            ));
        }
        self.advance();
        let mut columns = Vec::new();
        loop {
            columns.push(self.expect_identifier("column name")?);
            match self.advance() {
                Token::Comma => {}
                Token::RParen => break,
                _ => return Err(SqlError::malformed("unterminated column list", self.near_previous())),
            }
        }
        check_unique(columns.iter().map(String::as_str))?;

        if !self.eat_keyword(Keyword::Values) {
            if self.peek().is_keyword(Keyword::Select) {
                return Err(SqlError::unsupported(
                    "INSERT ... SELECT is not supported",
                    self.near(),
                ));
            }
            return Err(SqlError::malformed("INSERT requires VALUES (...)", self.near()));
        }
        if !matches!(self.peek(), Token::LParen) {
            return Err(SqlError::malformed("VALUES requires a parenthesized list", self.near()));
        }
        let values_start = self.pos;
        self.advance();
        let mut values = Vec::new();
        loop {
            values.push(self.parse_value()?);
            match self.advance() {
                Token::Comma => {}
                Token::RParen => break,
                _ => return Err(SqlError::malformed("unterminated VALUES list", self.near_previous())),
            }
        }
        if matches!(self.peek(), Token::Comma) {
            return Err(SqlError::unsupported(
                "multi-row INSERT is not supported",
                self.near(),
            ));
        }

        if columns.len() != values.len() {
            return Err(SqlError::malformed(
                format!(
                    "{} columns but {} values",
                    columns.len(),
                    values.len()
                ),
                self.text(values_start, self.pos),
            ));
        }

        Ok(InsertStatement {
            table,
            item: columns.into_iter().zip(values).collect(),
        })
    }

    fn parse_update(&mut self) -> SqlResult<UpdateStatement> {
        let table = self.expect_table()?;
        self.expect_keyword(Keyword::Set, "UPDATE requires SET <column> = <value>")?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier("column name")?;
            if !matches!(self.peek(), Token::Eq) {
                return Err(SqlError::malformed(
                    format!("expected '=' after '{column}' in SET"),
                    self.near_previous(),
                ));
            }
            self.advance();
            let value = self.parse_value()?;
            assignments.push((column, value));
            if matches!(self.peek(), Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        check_unique(assignments.iter().map(|(c, _)| c.as_str()))?;

        self.expect_keyword(Keyword::Where, "UPDATE requires a WHERE clause")?;
        let predicate = self.parse_where_clause()?;
        self.reject_select_only_clauses()?;

        Ok(UpdateStatement {
            table,
            assignments,
            predicate,
        })
    }

    fn parse_delete(&mut self) -> SqlResult<DeleteStatement> {
        self.expect_keyword(Keyword::From, "DELETE requires FROM <table>")?;
        let table = self.expect_table()?;
        self.expect_keyword(Keyword::Where, "DELETE requires a WHERE clause")?;
        let predicate = self.parse_where_clause()?;
        self.reject_select_only_clauses()?;
        Ok(DeleteStatement { table, predicate })
    }

    fn reject_select_only_clauses(&self) -> SqlResult<()> {
        if self.peek().is_keyword(Keyword::Order) || self.peek().is_keyword(Keyword::Limit) {
            return Err(SqlError::unsupported(
                "ORDER BY and LIMIT only apply to SELECT",
                self.near(),
            ));
        }
        Ok(())
    }
}

/// Split `table.attr` into its qualifier and attribute.
#[must_use]
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((table, attr)) if !table.is_empty() && !attr.is_empty() => (Some(table), attr),
        _ => (None, name),
    }
}

fn contains_or(predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Compare { .. } => false,
        Predicate::Logical { op, left, right } => {
            *op == LogicalOp::Or || contains_or(left) || contains_or(right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{CompareOp, Literal};

    fn select(sql: &str) -> SelectStatement {
        match parse_statement(sql).unwrap() {
            ParsedStatement::Select(s) => s,
            other => panic!("expected SELECT, got {other:?}"),
        }
    }

    #[test]
    fn test_should_parse_select_with_where() {
        let s = select("SELECT id, name FROM users WHERE age > 30 AND city = 'Seattle'");
        assert_eq!(s.table, "users");
        assert_eq!(
            s.projection,
            Projection::Columns(vec!["id".to_owned(), "name".to_owned()])
        );
        assert_eq!(
            s.predicate.unwrap().to_string(),
            "age > 30 AND city = 'Seattle'"
        );
        assert!(s.order_by.is_none());
        assert!(s.limit.is_none());
    }

    #[test]
    fn test_should_parse_select_star_case_insensitively() {
        let s = select("select * from users;");
        assert_eq!(s.projection, Projection::All);
        assert!(s.predicate.is_none());
    }

    #[test]
    fn test_should_parse_order_by_and_limit() {
        let s = select("SELECT * FROM events WHERE user = 'u1' ORDER BY ts DESC LIMIT 5");
        assert_eq!(
            s.order_by,
            Some(OrderBy {
                attribute: "ts".to_owned(),
                ascending: false
            })
        );
        assert_eq!(s.limit, Some(5));
        assert_eq!(s.predicate.unwrap().to_string(), "user = 'u1'");
    }

    #[test]
    fn test_should_accept_multiline_statement() {
        let s = select("SELECT id\n  FROM users\n  WHERE id = 'u1'\n  LIMIT 1;");
        assert_eq!(s.limit, Some(1));
    }

    #[test]
    fn test_should_parse_insert() {
        let stmt = parse_statement(
            "INSERT INTO users (id, age, vip, note) VALUES ('u1', 30, TRUE, NULL)",
        )
        .unwrap();
        let ParsedStatement::Insert(insert) = stmt else {
            panic!("expected INSERT");
        };
        assert_eq!(insert.table, "users");
        assert_eq!(insert.item["id"], AttributeValue::S("u1".to_owned()));
        assert_eq!(insert.item["age"], AttributeValue::N("30".to_owned()));
        assert_eq!(insert.item["vip"], AttributeValue::Bool(true));
        assert_eq!(insert.item["note"], AttributeValue::Null(true));
    }

    #[test]
    fn test_should_read_table_name_before_column_list() {
        let stmt = parse_statement("INSERT INTO `t-1` (id, v) VALUES (1, 'a')").unwrap();
        let ParsedStatement::Insert(insert) = stmt else {
            panic!("expected INSERT");
        };
        assert_eq!(insert.table, "t-1");
        assert_eq!(insert.item.len(), 2);

        let err = parse_statement("SELECT COUNT(id) FROM t").unwrap_err();
        assert!(matches!(err, SqlError::UnsupportedStatement { .. }));
    }

    #[test]
    fn test_should_parse_update() {
        let stmt =
            parse_statement("UPDATE users SET age = 31, city = 'Portland' WHERE id = 'u1'").unwrap();
        let ParsedStatement::Update(update) = stmt else {
            panic!("expected UPDATE");
        };
        assert_eq!(update.assignments.len(), 2);
        assert_eq!(update.assignments[0].0, "age");
        assert_eq!(
            update.predicate,
            Predicate::compare("id", CompareOp::Eq, Literal::String("u1".to_owned()))
        );
    }

    #[test]
    fn test_should_parse_delete() {
        let stmt = parse_statement("DELETE FROM users WHERE id = 'u1'").unwrap();
        assert!(matches!(stmt, ParsedStatement::Delete(ref d) if d.table == "users"));
    }

    #[test]
    fn test_should_parse_join() {
        let stmt = parse_statement(
            "SELECT users.name, orders.total FROM orders INNER JOIN users ON users.id = orders.user_id WHERE orders.total > 10 LIMIT 3",
        )
        .unwrap();
        let ParsedStatement::Join(join) = stmt else {
            panic!("expected JOIN");
        };
        assert_eq!(
            join.join,
            JoinSpec {
                left_table: "orders".to_owned(),
                right_table: "users".to_owned(),
                left_attribute: "user_id".to_owned(),
                right_attribute: "id".to_owned(),
            }
        );
        assert_eq!(join.limit, Some(3));
        assert!(join.predicate.is_some());
    }

    #[test]
    fn test_should_parse_unqualified_join_condition() {
        let spec = JoinSpec::parse("orders", "users", "user_id = id").unwrap();
        assert_eq!(spec.left_attribute, "user_id");
        assert_eq!(spec.right_attribute, "id");
    }

    #[test]
    fn test_should_reject_or_in_join_where() {
        let err = parse_statement(
            "SELECT * FROM a JOIN b ON a.x = b.y WHERE a.k = 1 OR b.k = 2",
        )
        .unwrap_err();
        assert!(matches!(err, SqlError::UnsupportedStatement { .. }), "{err:?}");
    }

    #[test]
    fn test_should_reject_unsupported_verbs_and_features() {
        for sql in [
            "DROP TABLE users",
            "SELECT COUNT(id) FROM users",
            "SELECT * FROM users GROUP BY city",
            "SELECT * FROM (SELECT * FROM users)",
            "INSERT INTO users (id, created) VALUES ('u1', NOW())",
            "SELECT * FROM a LEFT JOIN b ON a.x = b.y",
            "SELECT * FROM a, b",
        ] {
            let err = parse_statement(sql).unwrap_err();
            assert!(
                matches!(err, SqlError::UnsupportedStatement { .. }),
                "{sql}: {err:?}"
            );
        }
    }

    #[test]
    fn test_should_reject_malformed_statements() {
        for sql in [
            "SELECT id users",
            "INSERT users (id) VALUES ('u1')",
            "INSERT INTO users (id, name) ('u1', 'x')",
            "INSERT INTO users (id, name) VALUES ('u1')",
            "INSERT INTO users (id, id) VALUES ('u1', 'u2')",
            "UPDATE users WHERE id = 'u1'",
            "UPDATE users SET age = 1",
            "DELETE FROM users",
            "SELECT id, id FROM users",
            "SELECT * FROM users extra",
            "SELECT * FROM users LIMIT 5 6",
            "SELECT * FROM users LIMIT many",
            "",
        ] {
            let err = parse_statement(sql).unwrap_err();
            assert!(
                matches!(err, SqlError::MalformedStatement { .. }),
                "{sql}: {err:?}"
            );
        }
    }

    #[test]
    fn test_should_report_where_parse_errors_with_clause() {
        let err = parse_statement("SELECT * FROM users WHERE age != 3").unwrap_err();
        match err {
            SqlError::Parse { clause, source } => {
                assert_eq!(clause, "age != 3");
                assert!(matches!(source, ParseError::UnknownOperator { .. }));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }

        let err = parse_statement("DELETE FROM users WHERE city = Seattle").unwrap_err();
        assert!(matches!(
            err,
            SqlError::Parse {
                source: ParseError::UntypedLiteral { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_should_build_projection_from_columns() {
        assert_eq!(projection_from_columns(&["*"]).unwrap(), Projection::All);
        assert!(projection_from_columns(&["a", "a"]).is_err());
        assert!(projection_from_columns(&["*", "a"]).is_err());
    }

    #[test]
    fn test_should_split_qualified_names() {
        assert_eq!(split_qualified("users.id"), (Some("users"), "id"));
        assert_eq!(split_qualified("id"), (None, "id"));
    }
}
