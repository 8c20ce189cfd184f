/// DML parser: converts token stream into AST.
/// Hand-written recursive descent parser.
use tracing::debug;

use crate::error::{DmlError, Result};
use crate::sql::ast::*;
use crate::sql::lexer::{tokenize, Spanned, Token};
use crate::types::Position;

mod expr_and_filter;

/// Default ceiling on nested function calls, `NOT`s and parenthesized groups.
pub const DEFAULT_MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting depth before the parser gives up with a syntax error.
    /// Every level costs a few stack frames, so very large values trade the
    /// error for a stack overflow.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Position just past the last character of input.
    end: Position,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>, end: Position, options: &ParseOptions) -> Self {
        Parser {
            tokens,
            pos: 0,
            end,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        if self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    /// Position of the next token, or end of input.
    fn current_pos(&self) -> Position {
        self.tokens.get(self.pos).map_or(self.end, |s| s.pos)
    }

    fn unexpected(&self, expected: &str) -> DmlError {
        match self.tokens.get(self.pos) {
            Some(s) => DmlError::syntax(s.pos, format!("Expected {}, got {}", expected, s.token)),
            None => DmlError::syntax(self.end, format!("Expected {}, got end of input", expected)),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Position> {
        match self.tokens.get(self.pos) {
            Some(s) if &s.token == expected => {
                let pos = s.pos;
                self.pos += 1;
                Ok(pos)
            }
            _ => Err(self.unexpected(&expected.to_string())),
        }
    }

    fn expect_ident(&mut self) -> Result<Ident> {
        match self.tokens.get(self.pos) {
            Some(Spanned {
                token: Token::Ident(name),
                pos,
            }) => {
                let ident = Ident {
                    name: name.clone(),
                    pos: *pos,
                };
                self.pos += 1;
                Ok(ident)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Enter one level of nesting opened at `pos`.
    fn enter(&mut self, pos: Position) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(DmlError::syntax(
                pos,
                format!("Nesting exceeds maximum depth of {}", self.max_depth),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = match self.peek() {
            Some(Token::Insert) => Statement::Insert(self.parse_insert()?),
            Some(Token::Upsert) => Statement::Upsert(self.parse_upsert()?),
            Some(Token::Update) => Statement::Update(self.parse_update()?),
            Some(Token::Delete) => Statement::Delete(self.parse_delete()?),
            Some(_) => return Err(self.unexpected("INSERT, UPDATE, DELETE or UPSERT")),
            None => return Err(DmlError::syntax(self.end, "Empty input")),
        };

        if let Some(trailing) = self.tokens.get(self.pos) {
            return Err(DmlError::syntax(
                trailing.pos,
                format!("Unexpected {} after end of statement", trailing.token),
            ));
        }

        Ok(stmt)
    }

    fn parse_insert(&mut self) -> Result<Insert> {
        let pos = self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;
        let object = self.expect_ident()?;
        let fields = self.parse_field_list()?;
        self.expect(&Token::Values)?;
        let values = self.parse_rows()?;

        Ok(Insert {
            object,
            fields,
            values,
            pos,
        })
    }

    fn parse_upsert(&mut self) -> Result<Upsert> {
        let pos = self.expect(&Token::Upsert)?;
        let object = self.expect_ident()?;
        let fields = self.parse_field_list()?;
        self.expect(&Token::Values)?;
        let values = self.parse_rows()?;
        self.expect(&Token::On)?;
        let external_id = self.expect_ident()?;

        Ok(Upsert {
            object,
            fields,
            values,
            external_id,
            pos,
        })
    }

    /// `( ident (, ident)* )`
    fn parse_field_list(&mut self) -> Result<Vec<Ident>> {
        self.expect(&Token::LParen)?;
        let mut fields = Vec::new();
        loop {
            fields.push(self.expect_ident()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("',' or ')' in column list")),
            }
        }
        Ok(fields)
    }

    /// `row (, row)*`. Row width is not checked against the column list.
    fn parse_rows(&mut self) -> Result<Vec<ValueList>> {
        let mut rows = Vec::new();
        loop {
            rows.push(self.parse_value_list()?);
            if self.peek() == Some(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(rows)
    }

    fn parse_value_list(&mut self) -> Result<ValueList> {
        let pos = self.expect(&Token::LParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_value_expr()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("',' or ')' in values list")),
            }
        }
        Ok(ValueList { values, pos })
    }
}

/// Parse a DML string into a statement.
pub fn parse_sql(sql: &str) -> Result<Statement> {
    parse_sql_with(sql, &ParseOptions::default())
}

/// Parse a DML string with explicit options.
pub fn parse_sql_with(sql: &str, options: &ParseOptions) -> Result<Statement> {
    let span = tracing::debug_span!(
        target: "dmlparse::parse",
        "parse_sql",
        tokens = tracing::field::Empty,
        operation = tracing::field::Empty,
    );
    let _guard = span.enter();

    let result = tokenize(sql).and_then(|tokens| {
        span.record("tokens", tokens.len() as u64);
        let end = Position::START.advance(sql);
        Parser::new(tokens, end, options).parse()
    });

    match &result {
        Ok(stmt) => {
            span.record("operation", stmt.operation().as_str());
        }
        Err(e) => {
            debug!(
                target: "dmlparse::parse",
                line = e.position().line,
                column = e.position().column,
                "parse failed: {}",
                e
            );
        }
    }
    result
}

fn narrowing_error(expected: Operation, got: &Statement) -> DmlError {
    DmlError::semantic(
        got.pos(),
        format!(
            "Expected {} statement, got {}",
            expected,
            got.operation()
        ),
    )
}

/// Parse a statement that must be an INSERT.
pub fn parse_insert(sql: &str) -> Result<Insert> {
    parse_insert_with(sql, &ParseOptions::default())
}

pub fn parse_insert_with(sql: &str, options: &ParseOptions) -> Result<Insert> {
    match parse_sql_with(sql, options)? {
        Statement::Insert(insert) => Ok(insert),
        other => Err(narrowing_error(Operation::Insert, &other)),
    }
}

/// Parse a statement that must be an UPDATE.
pub fn parse_update(sql: &str) -> Result<Update> {
    parse_update_with(sql, &ParseOptions::default())
}

pub fn parse_update_with(sql: &str, options: &ParseOptions) -> Result<Update> {
    match parse_sql_with(sql, options)? {
        Statement::Update(update) => Ok(update),
        other => Err(narrowing_error(Operation::Update, &other)),
    }
}

/// Parse a statement that must be a DELETE.
pub fn parse_delete(sql: &str) -> Result<Delete> {
    parse_delete_with(sql, &ParseOptions::default())
}

pub fn parse_delete_with(sql: &str, options: &ParseOptions) -> Result<Delete> {
    match parse_sql_with(sql, options)? {
        Statement::Delete(delete) => Ok(delete),
        other => Err(narrowing_error(Operation::Delete, &other)),
    }
}

/// Parse a statement that must be an UPSERT.
pub fn parse_upsert(sql: &str) -> Result<Upsert> {
    parse_upsert_with(sql, &ParseOptions::default())
}

pub fn parse_upsert_with(sql: &str, options: &ParseOptions) -> Result<Upsert> {
    match parse_sql_with(sql, options)? {
        Statement::Upsert(upsert) => Ok(upsert),
        other => Err(narrowing_error(Operation::Upsert, &other)),
    }
}

/// Parse a statement known to be well-formed.
///
/// # Panics
///
/// Panics with the parse error if `sql` is not a valid statement.
pub fn must_parse(sql: &str) -> Statement {
    match parse_sql(sql) {
        Ok(stmt) => stmt,
        Err(e) => panic!("must_parse({:?}): {}", sql, e),
    }
}
