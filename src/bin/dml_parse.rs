use std::io::Read;
use std::process;

use clap::{Parser, ValueEnum};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use dmlparse::{
    parse_delete_with, parse_insert_with, parse_sql_with, parse_update_with, parse_upsert_with,
    DmlError, Expr, Filter, Ident, ParseOptions, Statement, ValueList, DEFAULT_MAX_DEPTH,
};

const EXIT_OK: i32 = 0;
const EXIT_PARSE_ERROR: i32 = 1;
const EXIT_IO_ERROR: i32 = 2;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExpectArg {
    Insert,
    Update,
    Delete,
    Upsert,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Text,
    Debug,
    Json,
}

#[derive(Parser)]
#[command(name = "dml-parse", about = "Parse a DML statement and print its syntax tree")]
struct Cli {
    /// Statement to parse (read from stdin if omitted)
    statement: Option<String>,

    /// Fail unless the statement is of this kind
    #[arg(long, value_enum)]
    expect: Option<ExpectArg>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormatArg,

    /// Maximum nesting of function calls, NOT and parenthesized groups
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn read_statement(cli_statement: Option<String>) -> String {
    if let Some(sql) = cli_statement {
        return sql;
    }
    let mut buf = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
        eprintln!("ERROR: Failed to read stdin: {}", e);
        process::exit(EXIT_IO_ERROR);
    }
    buf
}

fn parse(
    sql: &str,
    expect: Option<ExpectArg>,
    options: &ParseOptions,
) -> Result<Statement, DmlError> {
    match expect {
        None => parse_sql_with(sql, options),
        Some(ExpectArg::Insert) => parse_insert_with(sql, options).map(Statement::Insert),
        Some(ExpectArg::Update) => parse_update_with(sql, options).map(Statement::Update),
        Some(ExpectArg::Delete) => parse_delete_with(sql, options).map(Statement::Delete),
        Some(ExpectArg::Upsert) => parse_upsert_with(sql, options).map(Statement::Upsert),
    }
}

fn expr_json(expr: &Expr) -> Value {
    match expr {
        Expr::Const { value, .. } => json!({
            "const": value.to_string(),
            "type": value.field_type().as_str(),
        }),
        Expr::Func(call) => json!({
            "func": call.func.name(),
            "args": call.args.iter().map(expr_json).collect::<Vec<_>>(),
        }),
    }
}

fn rows_json(rows: &[ValueList]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| Value::Array(row.values.iter().map(expr_json).collect()))
            .collect(),
    )
}

fn filter_json(filter: &Filter) -> Value {
    match filter {
        Filter::Comparison { field, op, value } => json!({
            "cmp": op.as_str(),
            "field": field.name,
            "value": expr_json(value),
        }),
        Filter::IsNull { field, negated } => json!({
            "is_null": field.name,
            "negated": negated,
        }),
        Filter::In {
            field,
            list,
            negated,
        } => json!({
            "in": field.name,
            "list": list.iter().map(expr_json).collect::<Vec<_>>(),
            "negated": negated,
        }),
        Filter::Like {
            field,
            pattern,
            negated,
        } => json!({
            "like": field.name,
            "pattern": pattern,
            "negated": negated,
        }),
        Filter::Not { operand, .. } => json!({ "not": filter_json(operand) }),
        Filter::And { .. } => json!({ "and": operands_json(filter) }),
        Filter::Or { .. } => json!({ "or": operands_json(filter) }),
    }
}

// One flat array per run of the same connective.
fn operands_json(filter: &Filter) -> Vec<Value> {
    filter
        .chain()
        .map(|chain| chain.operands().map(filter_json).collect())
        .unwrap_or_default()
}

fn names(idents: &[Ident]) -> Vec<&str> {
    idents.iter().map(|i| i.name.as_str()).collect()
}

fn statement_json(stmt: &Statement) -> Value {
    let mut out = json!({
        "operation": stmt.operation().as_str(),
        "object": stmt.object(),
    });
    match stmt {
        Statement::Insert(s) => {
            out["fields"] = json!(names(&s.fields));
            out["values"] = rows_json(&s.values);
        }
        Statement::Upsert(s) => {
            out["fields"] = json!(names(&s.fields));
            out["values"] = rows_json(&s.values);
            out["external_id"] = json!(s.external_id.name);
        }
        Statement::Update(s) => {
            out["set"] = Value::Array(
                s.assignments
                    .iter()
                    .map(|a| json!({ "field": a.field.name, "value": expr_json(&a.value) }))
                    .collect(),
            );
        }
        Statement::Delete(_) => {}
    }
    if let Some(filter) = stmt.where_clause() {
        out["where"] = filter_json(filter);
    }
    out
}

fn error_json(err: &DmlError) -> Value {
    let pos = err.position();
    json!({
        "error": if err.is_syntax() { "syntax" } else { "semantic" },
        "message": err.message(),
        "line": pos.line,
        "column": pos.column,
        "offset": pos.offset,
    })
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let sql = read_statement(cli.statement);
    let options = ParseOptions {
        max_depth: cli.max_depth,
    };

    let code = match parse(&sql, cli.expect, &options) {
        Ok(stmt) => {
            match cli.format {
                OutputFormatArg::Text => println!("{}", stmt),
                OutputFormatArg::Debug => println!("{:#?}", stmt),
                OutputFormatArg::Json => println!("{}", statement_json(&stmt)),
            }
            EXIT_OK
        }
        Err(e) => {
            match cli.format {
                OutputFormatArg::Json => println!("{}", error_json(&e)),
                _ => eprintln!("ERROR: {}", e),
            }
            EXIT_PARSE_ERROR
        }
    };
    process::exit(code);
}
