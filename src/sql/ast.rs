use std::fmt;
use std::mem;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::sql::functions::Function;
use crate::types::{FieldType, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Upsert(Upsert),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Upsert,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Upsert => "UPSERT",
        }
    }
}

/// A name as written in the source: object, column or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub object: Ident,
    pub fields: Vec<Ident>,
    pub values: Vec<ValueList>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    pub object: Ident,
    pub fields: Vec<Ident>,
    pub values: Vec<ValueList>,
    /// Field used to match an existing record before creating a new one.
    pub external_id: Ident,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub object: Ident,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Filter>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub object: Ident,
    pub where_clause: Option<Filter>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: Ident,
    pub value: Expr,
    pub pos: Position,
}

/// One parenthesized row of a VALUES clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    pub values: Vec<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const { value: Const, pos: Position },
    Func(FuncCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub func: Function,
    pub args: Vec<Expr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// Boolean expression of a WHERE clause. Parenthesized groups only shape the
/// tree and leave no node of their own.
///
/// A run of one connective (`a AND b AND c`) is a left-deep spine as deep as
/// the run is long, so `Drop`, `Clone`, `PartialEq`, `Debug` and rendering
/// walk it through [`Filter::chain`] instead of recursing per node. Only
/// parenthesized groups and `NOT` add real nesting, and those are bounded by
/// `ParseOptions::max_depth`.
pub enum Filter {
    Comparison {
        field: Ident,
        op: CmpOp,
        value: Expr,
    },
    IsNull {
        field: Ident,
        negated: bool, // true = IS NOT NULL
    },
    In {
        field: Ident,
        list: Vec<Expr>,
        negated: bool,
    },
    Like {
        field: Ident,
        pattern: String,
        negated: bool,
    },
    Not {
        operand: Box<Filter>,
        pos: Position,
    },
    And {
        left: Box<Filter>,
        right: Box<Filter>,
    },
    Or {
        left: Box<Filter>,
        right: Box<Filter>,
    },
}

impl Statement {
    pub fn operation(&self) -> Operation {
        match self {
            Statement::Insert(_) => Operation::Insert,
            Statement::Update(_) => Operation::Update,
            Statement::Delete(_) => Operation::Delete,
            Statement::Upsert(_) => Operation::Upsert,
        }
    }

    /// Name of the object the statement targets.
    pub fn object(&self) -> &str {
        &self.object_ident().name
    }

    pub fn object_ident(&self) -> &Ident {
        match self {
            Statement::Insert(s) => &s.object,
            Statement::Update(s) => &s.object,
            Statement::Delete(s) => &s.object,
            Statement::Upsert(s) => &s.object,
        }
    }

    pub fn pos(&self) -> Position {
        match self {
            Statement::Insert(s) => s.pos,
            Statement::Update(s) => s.pos,
            Statement::Delete(s) => s.pos,
            Statement::Upsert(s) => s.pos,
        }
    }

    pub fn where_clause(&self) -> Option<&Filter> {
        match self {
            Statement::Update(s) => s.where_clause.as_ref(),
            Statement::Delete(s) => s.where_clause.as_ref(),
            Statement::Insert(_) | Statement::Upsert(_) => None,
        }
    }

    /// Every field name the statement mentions, in source order. Duplicates
    /// are kept.
    pub fn referenced_fields(&self) -> Vec<&Ident> {
        let mut out = Vec::new();
        match self {
            Statement::Insert(s) => out.extend(s.fields.iter()),
            Statement::Upsert(s) => {
                out.extend(s.fields.iter());
                out.push(&s.external_id);
            }
            Statement::Update(s) => out.extend(s.assignments.iter().map(|a| &a.field)),
            Statement::Delete(_) => {}
        }
        if let Some(filter) = self.where_clause() {
            filter.collect_fields(&mut out);
        }
        out
    }

    /// Reset every position to `Position::START`, so trees parsed from
    /// differently laid out text compare equal.
    pub fn clear_positions(&mut self) {
        match self {
            Statement::Insert(s) => {
                s.pos = Position::START;
                s.object.pos = Position::START;
                clear_rows(&mut s.fields, &mut s.values);
            }
            Statement::Upsert(s) => {
                s.pos = Position::START;
                s.object.pos = Position::START;
                s.external_id.pos = Position::START;
                clear_rows(&mut s.fields, &mut s.values);
            }
            Statement::Update(s) => {
                s.pos = Position::START;
                s.object.pos = Position::START;
                for a in &mut s.assignments {
                    a.pos = Position::START;
                    a.field.pos = Position::START;
                    a.value.clear_positions();
                }
                if let Some(filter) = &mut s.where_clause {
                    filter.clear_positions();
                }
            }
            Statement::Delete(s) => {
                s.pos = Position::START;
                s.object.pos = Position::START;
                if let Some(filter) = &mut s.where_clause {
                    filter.clear_positions();
                }
            }
        }
    }
}

fn clear_rows(fields: &mut [Ident], values: &mut [ValueList]) {
    for field in fields {
        field.pos = Position::START;
    }
    for row in values {
        row.pos = Position::START;
        row.values.iter_mut().for_each(Expr::clear_positions);
    }
}

/// Indices of rows whose arity differs from the column list.
fn mismatched_rows(fields: &[Ident], values: &[ValueList]) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, row)| row.values.len() != fields.len())
        .map(|(i, _)| i)
        .collect()
}

impl Insert {
    /// The parser does not check row arity; this is for the semantic pass
    /// that runs against object metadata.
    pub fn mismatched_rows(&self) -> Vec<usize> {
        mismatched_rows(&self.fields, &self.values)
    }
}

impl Upsert {
    pub fn mismatched_rows(&self) -> Vec<usize> {
        mismatched_rows(&self.fields, &self.values)
    }
}

impl Expr {
    pub fn is_const(&self) -> bool {
        matches!(self, Expr::Const { .. })
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Expr::Func(_))
    }

    pub fn as_const(&self) -> Option<&Const> {
        match self {
            Expr::Const { value, .. } => Some(value),
            Expr::Func(_) => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncCall> {
        match self {
            Expr::Func(call) => Some(call),
            Expr::Const { .. } => None,
        }
    }

    pub fn pos(&self) -> Position {
        match self {
            Expr::Const { pos, .. } => *pos,
            Expr::Func(call) => call.pos,
        }
    }

    pub fn clear_positions(&mut self) {
        match self {
            Expr::Const { pos, .. } => *pos = Position::START,
            Expr::Func(call) => {
                call.pos = Position::START;
                call.args.iter_mut().for_each(Expr::clear_positions);
            }
        }
    }
}

impl Const {
    pub fn field_type(&self) -> FieldType {
        match self {
            Const::String(_) => FieldType::String,
            Const::Integer(_) => FieldType::Integer,
            Const::Float(_) => FieldType::Float,
            Const::Boolean(_) => FieldType::Boolean,
            Const::Date(_) => FieldType::Date,
            Const::DateTime(_) => FieldType::DateTime,
            Const::Null => FieldType::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Const::Null)
    }
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
        }
    }
}

/// The two binary filter connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }

    /// `left <connective> right`
    pub fn join(self, left: Filter, right: Filter) -> Filter {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Connective::And => Filter::And { left, right },
            Connective::Or => Filter::Or { left, right },
        }
    }
}

/// A maximal run of one connective down the left spine of a filter:
/// `a AND b AND c` has `first = a` and `rest = [b, c]`.
#[derive(Debug)]
pub struct Chain<'a> {
    pub connective: Connective,
    pub first: &'a Filter,
    pub rest: Vec<&'a Filter>,
}

impl<'a> Chain<'a> {
    /// Operands in source order.
    pub fn operands(&self) -> impl Iterator<Item = &'a Filter> + '_ {
        std::iter::once(self.first).chain(self.rest.iter().copied())
    }
}

impl Filter {
    /// Position of the leftmost predicate or `NOT`.
    pub fn pos(&self) -> Position {
        let mut cur = self;
        loop {
            match cur {
                Filter::Comparison { field, .. }
                | Filter::IsNull { field, .. }
                | Filter::In { field, .. }
                | Filter::Like { field, .. } => return field.pos,
                Filter::Not { pos, .. } => return *pos,
                Filter::And { left, .. } | Filter::Or { left, .. } => cur = &**left,
            }
        }
    }

    pub fn connective(&self) -> Option<Connective> {
        match self {
            Filter::And { .. } => Some(Connective::And),
            Filter::Or { .. } => Some(Connective::Or),
            _ => None,
        }
    }

    /// The AND or OR run rooted here, flattened. `None` for any other node.
    pub fn chain(&self) -> Option<Chain<'_>> {
        let connective = self.connective()?;
        let (first, rest) = self.spine(connective);
        Some(Chain {
            connective,
            first,
            rest,
        })
    }

    /// Walk left children while they are `connective` nodes. Returns the
    /// leftmost operand and the right operands in source order.
    pub(crate) fn spine(&self, connective: Connective) -> (&Filter, Vec<&Filter>) {
        let mut rest = Vec::new();
        let mut cur = self;
        loop {
            match (cur, connective) {
                (Filter::And { left, right }, Connective::And)
                | (Filter::Or { left, right }, Connective::Or) => {
                    rest.push(&**right);
                    cur = &**left;
                }
                _ => break,
            }
        }
        rest.reverse();
        (cur, rest)
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a Ident>) {
        let mut pending = vec![self];
        while let Some(filter) = pending.pop() {
            match filter {
                Filter::Comparison { field, .. }
                | Filter::IsNull { field, .. }
                | Filter::In { field, .. }
                | Filter::Like { field, .. } => out.push(field),
                Filter::Not { operand, .. } => pending.push(&**operand),
                Filter::And { left, right } | Filter::Or { left, right } => {
                    pending.push(&**right);
                    pending.push(&**left);
                }
            }
        }
    }

    /// Reset every position in the filter to `Position::START`.
    pub fn clear_positions(&mut self) {
        let mut pending = vec![self];
        while let Some(filter) = pending.pop() {
            match filter {
                Filter::Comparison { field, value, .. } => {
                    field.pos = Position::START;
                    value.clear_positions();
                }
                Filter::IsNull { field, .. } | Filter::Like { field, .. } => {
                    field.pos = Position::START;
                }
                Filter::In { field, list, .. } => {
                    field.pos = Position::START;
                    list.iter_mut().for_each(Expr::clear_positions);
                }
                Filter::Not { operand, pos } => {
                    *pos = Position::START;
                    pending.push(&mut **operand);
                }
                Filter::And { left, right } | Filter::Or { left, right } => {
                    pending.push(&mut **left);
                    pending.push(&mut **right);
                }
            }
        }
    }

    /// Move boxed children into `out`, leaving empty leaves in their place.
    fn detach_children(&mut self, out: &mut Vec<Filter>) {
        match self {
            Filter::Not { operand, .. } => {
                out.push(mem::replace(&mut **operand, Filter::hollow()));
            }
            Filter::And { left, right } | Filter::Or { left, right } => {
                out.push(mem::replace(&mut **left, Filter::hollow()));
                out.push(mem::replace(&mut **right, Filter::hollow()));
            }
            _ => {}
        }
    }

    fn hollow() -> Filter {
        Filter::IsNull {
            field: Ident {
                name: String::new(),
                pos: Position::START,
            },
            negated: false,
        }
    }

    fn clone_chain(&self, connective: Connective) -> Filter {
        let (first, rest) = self.spine(connective);
        rest.into_iter()
            .fold(first.clone(), |acc, operand| connective.join(acc, operand.clone()))
    }

    fn chain_eq(&self, other: &Filter, connective: Connective) -> bool {
        let (first, rest) = self.spine(connective);
        let (other_first, other_rest) = other.spine(connective);
        rest.len() == other_rest.len()
            && first == other_first
            && rest.iter().zip(&other_rest).all(|(a, b)| a == b)
    }

    fn debug_chain(&self, f: &mut fmt::Formatter<'_>, connective: Connective) -> fmt::Result {
        let (first, rest) = self.spine(connective);
        let name = match connective {
            Connective::And => "And",
            Connective::Or => "Or",
        };
        let mut tuple = f.debug_tuple(name);
        tuple.field(first);
        for operand in rest {
            tuple.field(operand);
        }
        tuple.finish()
    }
}

impl Drop for Filter {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

impl Clone for Filter {
    fn clone(&self) -> Self {
        match self {
            Filter::Comparison { field, op, value } => Filter::Comparison {
                field: field.clone(),
                op: *op,
                value: value.clone(),
            },
            Filter::IsNull { field, negated } => Filter::IsNull {
                field: field.clone(),
                negated: *negated,
            },
            Filter::In {
                field,
                list,
                negated,
            } => Filter::In {
                field: field.clone(),
                list: list.clone(),
                negated: *negated,
            },
            Filter::Like {
                field,
                pattern,
                negated,
            } => Filter::Like {
                field: field.clone(),
                pattern: pattern.clone(),
                negated: *negated,
            },
            Filter::Not { operand, pos } => Filter::Not {
                operand: operand.clone(),
                pos: *pos,
            },
            Filter::And { .. } => self.clone_chain(Connective::And),
            Filter::Or { .. } => self.clone_chain(Connective::Or),
        }
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Filter::Comparison {
                    field: f1,
                    op: o1,
                    value: v1,
                },
                Filter::Comparison {
                    field: f2,
                    op: o2,
                    value: v2,
                },
            ) => f1 == f2 && o1 == o2 && v1 == v2,
            (
                Filter::IsNull {
                    field: f1,
                    negated: n1,
                },
                Filter::IsNull {
                    field: f2,
                    negated: n2,
                },
            ) => f1 == f2 && n1 == n2,
            (
                Filter::In {
                    field: f1,
                    list: l1,
                    negated: n1,
                },
                Filter::In {
                    field: f2,
                    list: l2,
                    negated: n2,
                },
            ) => f1 == f2 && l1 == l2 && n1 == n2,
            (
                Filter::Like {
                    field: f1,
                    pattern: p1,
                    negated: n1,
                },
                Filter::Like {
                    field: f2,
                    pattern: p2,
                    negated: n2,
                },
            ) => f1 == f2 && p1 == p2 && n1 == n2,
            (
                Filter::Not {
                    operand: a,
                    pos: p1,
                },
                Filter::Not {
                    operand: b,
                    pos: p2,
                },
            ) => p1 == p2 && a == b,
            (Filter::And { .. }, Filter::And { .. }) => self.chain_eq(other, Connective::And),
            (Filter::Or { .. }, Filter::Or { .. }) => self.chain_eq(other, Connective::Or),
            _ => false,
        }
    }
}

// Runs print as `And(a, b, c)` rather than nested left/right pairs.
impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Comparison { field, op, value } => f
                .debug_struct("Comparison")
                .field("field", field)
                .field("op", op)
                .field("value", value)
                .finish(),
            Filter::IsNull { field, negated } => f
                .debug_struct("IsNull")
                .field("field", field)
                .field("negated", negated)
                .finish(),
            Filter::In {
                field,
                list,
                negated,
            } => f
                .debug_struct("In")
                .field("field", field)
                .field("list", list)
                .field("negated", negated)
                .finish(),
            Filter::Like {
                field,
                pattern,
                negated,
            } => f
                .debug_struct("Like")
                .field("field", field)
                .field("pattern", pattern)
                .field("negated", negated)
                .finish(),
            Filter::Not { operand, pos } => f
                .debug_struct("Not")
                .field("operand", operand)
                .field("pos", pos)
                .finish(),
            Filter::And { .. } => self.debug_chain(f, Connective::And),
            Filter::Or { .. } => self.debug_chain(f, Connective::Or),
        }
    }
}
