use chrono::NaiveDate;
use dmlparse::{parse_insert, parse_sql, Const, Expr, FieldType, Operation, Statement};

fn field_names(fields: &[dmlparse::Ident]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

fn const_types(row: &[Expr]) -> Vec<FieldType> {
    row.iter()
        .map(|e| e.as_const().expect("constant").field_type())
        .collect()
}

#[test]
fn test_insert_basic() {
    let stmt = parse_sql("INSERT INTO Account (Name, Industry) VALUES ('Acme', 'Retail')").unwrap();
    assert_eq!(stmt.operation(), Operation::Insert);
    assert_eq!(stmt.object(), "Account");
    if let Statement::Insert(ins) = stmt {
        assert_eq!(field_names(&ins.fields), vec!["Name", "Industry"]);
        assert_eq!(ins.values.len(), 1);
        assert!(ins.values[0].values.iter().all(|e| e.is_const()));
    } else {
        panic!("Expected Insert");
    }
}

#[test]
fn test_insert_every_literal_type() {
    let ins = parse_insert(
        "INSERT INTO t (s, i, f, b, n, d, dt) \
         VALUES ('x', 42, 3.5, true, null, 2024-01-15, 2024-01-15T10:30:00Z)",
    )
    .unwrap();
    assert_eq!(
        const_types(&ins.values[0].values),
        vec![
            FieldType::String,
            FieldType::Integer,
            FieldType::Float,
            FieldType::Boolean,
            FieldType::Null,
            FieldType::Date,
            FieldType::DateTime,
        ]
    );
    assert_eq!(
        ins.values[0].values[5].as_const(),
        Some(&Const::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
    );
}

#[test]
fn test_insert_row_count_independent_of_column_count() {
    for (sql, fields, rows) in [
        ("INSERT INTO t (a, b) VALUES (1, 2), (3, 4)", 2, 2),
        ("INSERT INTO t (a, b) VALUES (1), (2), (3)", 2, 3),
        ("INSERT INTO t (a) VALUES (1, 2, 3)", 1, 1),
    ] {
        let ins = parse_insert(sql).unwrap();
        assert_eq!(ins.fields.len(), fields, "{}", sql);
        assert_eq!(ins.values.len(), rows, "{}", sql);
    }
}

#[test]
fn test_insert_mismatched_rows_reported() {
    let ins = parse_insert("INSERT INTO t (a, b) VALUES (1, 2), (3), (4, 5, 6)").unwrap();
    assert_eq!(ins.mismatched_rows(), vec![1, 2]);
}

#[test]
fn test_insert_lowercase_keywords() {
    let lower = parse_sql("insert into t (f) values ('x')").unwrap();
    let upper = parse_sql("INSERT INTO t (f) VALUES ('x')").unwrap();
    assert_eq!(lower.to_string(), upper.to_string());
    assert_eq!(lower.operation(), upper.operation());
}

#[test]
fn test_insert_string_escapes() {
    let ins = parse_insert("INSERT INTO t (a, b) VALUES ('it''s', 'he said ''hi''')").unwrap();
    let row = &ins.values[0].values;
    assert_eq!(row[0].as_const(), Some(&Const::String("it's".to_string())));
    assert_eq!(
        row[1].as_const(),
        Some(&Const::String("he said 'hi'".to_string()))
    );
}

#[test]
fn test_insert_quoted_column_names() {
    let ins = parse_insert(r#"INSERT INTO "order" ("values", "first name") VALUES (1, 2)"#).unwrap();
    assert_eq!(ins.object.name, "order");
    assert_eq!(field_names(&ins.fields), vec!["values", "first name"]);
}

#[test]
fn test_insert_with_functions() {
    let ins = parse_insert("INSERT INTO t (a, b) VALUES (UPPER('x'), COALESCE(NULL, 'y'))").unwrap();
    let row = &ins.values[0].values;
    assert!(row.iter().all(|e| e.is_func()));
}

#[test]
fn test_insert_missing_values_clause() {
    let err = parse_sql("INSERT INTO t (f)").unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.message(), "Expected VALUES, got end of input");
}

#[test]
fn test_insert_missing_into() {
    let err = parse_sql("INSERT t (f) VALUES (1)").unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.message(), "Expected INTO, got identifier \"t\"");
}

#[test]
fn test_insert_empty_column_list_rejected() {
    let err = parse_sql("INSERT INTO t () VALUES (1)").unwrap_err();
    assert_eq!(err.message(), "Expected identifier, got ')'");
}

#[test]
fn test_insert_empty_row_rejected() {
    let err = parse_sql("INSERT INTO t (a) VALUES ()").unwrap_err();
    assert_eq!(err.message(), "Expected a literal or function call, got ')'");
}

#[test]
fn test_insert_field_name_cannot_be_expression() {
    let err = parse_sql("INSERT INTO t (a.b) VALUES (1)").unwrap_err();
    assert_eq!(err.message(), "Expected ',' or ')' in column list, got '.'");
}

#[test]
fn test_insert_display_round_trip() {
    let sql = "INSERT INTO t (a, b) VALUES ('x', -1), (LEN('abc'), 2.0)";
    let stmt = parse_sql(sql).unwrap();
    let text = stmt.to_string();
    assert_eq!(
        text,
        "INSERT INTO t (a, b) VALUES ('x', -1), (LENGTH('abc'), 2.0)"
    );
    assert_eq!(parse_sql(&text).unwrap().to_string(), text);
}
