//! dmlparse: front-end for data-manipulation statements
//!
//! Turns `INSERT`, `UPDATE`, `DELETE` and `UPSERT` text into a typed AST for
//! a downstream compiler that targets a dynamically defined object model:
//! - nom-based lexer with case-insensitive keywords and `--` comments
//! - recursive-descent grammar for the four statement shapes
//! - closed literal type model (`FieldType`) and scalar function set
//! - WHERE filters with OR < AND < NOT precedence
//!
//! Parsing is pure: no I/O, no shared state, safe to call from many threads.
//!
//! ```
//! use dmlparse::{parse_sql, Operation};
//!
//! let stmt = parse_sql("UPDATE account SET name = UPPER('acme') WHERE id = 7").unwrap();
//! assert_eq!(stmt.operation(), Operation::Update);
//! assert_eq!(stmt.object(), "account");
//! ```

pub mod error;
pub mod sql;
pub mod types;

pub use error::{DmlError, Result};
pub use sql::ast::{
    Assignment, Chain, CmpOp, Connective, Const, Delete, Expr, Filter, FuncCall, Ident, Insert,
    Operation, Statement, Update, Upsert, ValueList,
};
pub use sql::functions::{Arity, Function};
pub use sql::parser::{
    must_parse, parse_delete, parse_delete_with, parse_insert, parse_insert_with, parse_sql,
    parse_sql_with, parse_update, parse_update_with, parse_upsert, parse_upsert_with,
    ParseOptions, DEFAULT_MAX_DEPTH,
};
pub use types::{FieldType, Position};
