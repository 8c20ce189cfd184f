use super::*;
use crate::sql::functions::Function;
use crate::sql::literal::{classify, literal_value};

impl Parser {
    pub(super) fn parse_update(&mut self) -> Result<Update> {
        let pos = self.expect(&Token::Update)?;
        let object = self.expect_ident()?;
        self.expect(&Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            let field = self.expect_ident()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_value_expr()?;
            assignments.push(Assignment {
                pos: field.pos,
                field,
                value,
            });

            if self.peek() == Some(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let where_clause = self.parse_optional_where()?;

        Ok(Update {
            object,
            assignments,
            where_clause,
            pos,
        })
    }

    pub(super) fn parse_delete(&mut self) -> Result<Delete> {
        let pos = self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;
        let object = self.expect_ident()?;
        let where_clause = self.parse_optional_where()?;

        Ok(Delete {
            object,
            where_clause,
            pos,
        })
    }

    fn parse_optional_where(&mut self) -> Result<Option<Filter>> {
        if self.peek() == Some(&Token::Where) {
            self.advance();
            Ok(Some(self.parse_filter()?))
        } else {
            Ok(None)
        }
    }

    // Value position: a literal or a (possibly nested) function call.

    pub(super) fn parse_value_expr(&mut self) -> Result<Expr> {
        let pos = self.current_pos();
        match self.peek() {
            Some(Token::Function(func)) => {
                let func = *func;
                Ok(Expr::Func(self.parse_func_call(func)?))
            }
            Some(Token::Ident(name)) if self.peek_at(1) == Some(&Token::LParen) => Err(
                DmlError::semantic(pos, format!("Unknown function: {}", name)),
            ),
            Some(Token::Minus) | Some(Token::Plus) => self.parse_signed_number(),
            Some(token) if classify(token).is_some() => {
                let value = literal_value(token, false).map_err(|msg| DmlError::syntax(pos, msg))?;
                self.advance();
                Ok(Expr::Const { value, pos })
            }
            _ => Err(self.unexpected("a literal or function call")),
        }
    }

    /// `-` / `+` directly followed by an unsigned numeric literal.
    fn parse_signed_number(&mut self) -> Result<Expr> {
        let pos = self.current_pos();
        let negative = matches!(self.advance(), Some(Spanned { token: Token::Minus, .. }));
        match self.peek() {
            Some(token) if is_unsigned_number(token) => {
                let value =
                    literal_value(token, negative).map_err(|msg| DmlError::syntax(pos, msg))?;
                self.advance();
                Ok(Expr::Const { value, pos })
            }
            _ => Err(self.unexpected("a number after sign")),
        }
    }

    fn parse_func_call(&mut self, func: Function) -> Result<FuncCall> {
        let pos = self.current_pos();
        self.advance(); // function name
        self.expect(&Token::LParen)?;

        if self.peek() == Some(&Token::RParen) {
            return Err(DmlError::syntax(
                pos,
                func.check_arity(0).err().unwrap_or_else(|| {
                    format!("{} requires at least one argument", func.name())
                }),
            ));
        }

        self.enter(pos)?;
        let mut args = Vec::new();
        loop {
            args.push(self.parse_value_expr()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("',' or ')' in argument list")),
            }
        }
        self.leave();

        func.check_arity(args.len())
            .map_err(|msg| DmlError::syntax(pos, msg))?;

        Ok(FuncCall { func, args, pos })
    }

    // WHERE expression parsing with precedence:
    // parse_filter -> parse_or_filter -> parse_and_filter -> parse_not_filter
    //   -> parse_predicate

    pub(super) fn parse_filter(&mut self) -> Result<Filter> {
        self.parse_or_filter()
    }

    fn parse_or_filter(&mut self) -> Result<Filter> {
        let mut left = self.parse_and_filter()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and_filter()?;
            left = Filter::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_filter(&mut self) -> Result<Filter> {
        let mut left = self.parse_not_filter()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_not_filter()?;
            left = Filter::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not_filter(&mut self) -> Result<Filter> {
        if self.peek() == Some(&Token::Not) {
            let pos = self.current_pos();
            self.advance();
            self.enter(pos)?;
            let operand = self.parse_predicate()?;
            self.leave();
            Ok(Filter::Not {
                operand: Box::new(operand),
                pos,
            })
        } else {
            self.parse_predicate()
        }
    }

    fn parse_predicate(&mut self) -> Result<Filter> {
        if self.peek() == Some(&Token::LParen) {
            let pos = self.current_pos();
            self.advance();
            self.enter(pos)?;
            let inner = self.parse_filter()?;
            self.expect(&Token::RParen)?;
            self.leave();
            return Ok(inner);
        }

        let field = match self.peek() {
            Some(Token::Ident(_)) => self.expect_ident()?,
            _ => return Err(self.unexpected("field name or '('")),
        };

        // IS [NOT] NULL
        if self.peek() == Some(&Token::Is) {
            self.advance();
            let negated = if self.peek() == Some(&Token::Not) {
                self.advance();
                true
            } else {
                false
            };
            self.expect(&Token::Null)?;
            return Ok(Filter::IsNull { field, negated });
        }

        // NOT IN / NOT LIKE
        if self.peek() == Some(&Token::Not) {
            self.advance();
            return match self.peek() {
                Some(Token::In) => {
                    self.advance();
                    self.parse_in_list(field, true)
                }
                Some(Token::Like) => {
                    self.advance();
                    self.parse_like_pattern(field, true)
                }
                _ => Err(self.unexpected("IN or LIKE after NOT")),
            };
        }

        match self.peek() {
            Some(Token::In) => {
                self.advance();
                return self.parse_in_list(field, false);
            }
            Some(Token::Like) => {
                self.advance();
                return self.parse_like_pattern(field, false);
            }
            _ => {}
        }

        let op = match self.peek() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Ge) => CmpOp::Ge,
            _ => return Err(self.unexpected("comparison operator, IS, IN or LIKE")),
        };
        self.advance();
        let value = self.parse_value_expr()?;

        Ok(Filter::Comparison { field, op, value })
    }

    fn parse_in_list(&mut self, field: Ident, negated: bool) -> Result<Filter> {
        self.expect(&Token::LParen)?;
        let mut list = Vec::new();
        loop {
            list.push(self.parse_value_expr()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("',' or ')' in IN list")),
            }
        }
        Ok(Filter::In {
            field,
            list,
            negated,
        })
    }

    fn parse_like_pattern(&mut self, field: Ident, negated: bool) -> Result<Filter> {
        match self.peek() {
            Some(Token::StringLit(pattern)) => {
                let pattern = pattern.clone();
                self.advance();
                Ok(Filter::Like {
                    field,
                    pattern,
                    negated,
                })
            }
            _ => Err(self.unexpected("string pattern after LIKE")),
        }
    }
}

fn is_unsigned_number(token: &Token) -> bool {
    match token {
        Token::Integer(text) | Token::Float(text) => {
            text.starts_with(|c: char| c.is_ascii_digit())
        }
        _ => false,
    }
}
