/// Canonical DML rendering of the AST.
///
/// Output re-parses to a structurally identical tree: keywords are upper-case,
/// function aliases print under their canonical name, strings are re-escaped
/// and parentheses are emitted wherever the tree shape differs from the
/// default OR < AND < NOT binding.
use std::fmt;

use crate::sql::ast::*;
use crate::sql::lexer::keyword;

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_quoted_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'{}'", s.replace('\'', "''"))
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.name.chars();
        let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && keyword(&self.name).is_none();
        if plain {
            return f.write_str(&self.name);
        }
        f.write_str("\"")?;
        for c in self.name.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str("\"")
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::String(s) => write_quoted_string(f, s),
            Const::Integer(n) => write!(f, "{}", n),
            Const::Float(n) => {
                // Debug keeps a fractional part ("1.0"); the lexer needs one
                // before any exponent as well ("1e-7" -> "1.0e-7").
                let text = format!("{:?}", n);
                match text.find('e') {
                    Some(idx) if !text[..idx].contains('.') => {
                        write!(f, "{}.0{}", &text[..idx], &text[idx..])
                    }
                    _ => f.write_str(&text),
                }
            }
            Const::Boolean(true) => f.write_str("TRUE"),
            Const::Boolean(false) => f.write_str("FALSE"),
            Const::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Const::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Const::Null => f.write_str("NULL"),
        }
    }
}

impl fmt::Display for FuncCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.func)?;
        write_list(f, &self.args)?;
        f.write_str(")")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const { value, .. } => write!(f, "{}", value),
            Expr::Func(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for ValueList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.values)?;
        f.write_str(")")
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.field, self.value)
    }
}

impl Filter {
    fn precedence(&self) -> u8 {
        match self {
            Filter::Or { .. } => 1,
            Filter::And { .. } => 2,
            Filter::Not { .. } => 3,
            _ => 4,
        }
    }

    fn fmt_within(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            f.write_str("(")?;
            self.fmt_within(f, 0)?;
            return f.write_str(")");
        }
        let not = |negated: bool| if negated { "NOT " } else { "" };
        match self {
            Filter::Comparison { field, op, value } => write!(f, "{} {} {}", field, op, value),
            Filter::IsNull { field, negated } => write!(f, "{} IS {}NULL", field, not(*negated)),
            Filter::In {
                field,
                list,
                negated,
            } => {
                write!(f, "{} {}IN (", field, not(*negated))?;
                write_list(f, list)?;
                f.write_str(")")
            }
            Filter::Like {
                field,
                pattern,
                negated,
            } => {
                write!(f, "{} {}LIKE ", field, not(*negated))?;
                write_quoted_string(f, pattern)
            }
            Filter::Not { operand, .. } => {
                f.write_str("NOT ")?;
                // NOT applies to a single predicate; anything else needs a group
                operand.fmt_within(f, 4)
            }
            Filter::And { .. } => self.fmt_chain(f, Connective::And),
            Filter::Or { .. } => self.fmt_chain(f, Connective::Or),
        }
    }

    // Both connectives are left-associative, so a right operand of the same
    // kind must keep its parentheses.
    fn fmt_chain(&self, f: &mut fmt::Formatter<'_>, connective: Connective) -> fmt::Result {
        let (first_min, rest_min) = match connective {
            Connective::And => (2, 3),
            Connective::Or => (1, 2),
        };
        let (first, rest) = self.spine(connective);
        first.fmt_within(f, first_min)?;
        for operand in rest {
            write!(f, " {} ", connective)?;
            operand.fmt_within(f, rest_min)?;
        }
        Ok(())
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_within(f, 0)
    }
}

fn write_where(f: &mut fmt::Formatter<'_>, where_clause: &Option<Filter>) -> fmt::Result {
    match where_clause {
        Some(filter) => write!(f, " WHERE {}", filter),
        None => Ok(()),
    }
}

impl fmt::Display for Insert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO {} (", self.object)?;
        write_list(f, &self.fields)?;
        f.write_str(") VALUES ")?;
        write_list(f, &self.values)
    }
}

impl fmt::Display for Upsert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPSERT {} (", self.object)?;
        write_list(f, &self.fields)?;
        f.write_str(") VALUES ")?;
        write_list(f, &self.values)?;
        write!(f, " ON {}", self.external_id)
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE {} SET ", self.object)?;
        write_list(f, &self.assignments)?;
        write_where(f, &self.where_clause)
    }
}

impl fmt::Display for Delete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {}", self.object)?;
        write_where(f, &self.where_clause)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Insert(s) => write!(f, "{}", s),
            Statement::Update(s) => write!(f, "{}", s),
            Statement::Delete(s) => write!(f, "{}", s),
            Statement::Upsert(s) => write!(f, "{}", s),
        }
    }
}
