/// Property tests for the DML front-end.
///
/// - Keyword and function-name case never changes the tree
/// - String literals survive quoting and re-escaping
/// - Every literal token classifies to exactly one field type
/// - Canonical rendering re-parses to the same rendering
/// - Column and row counts are taken as written
use dmlparse::sql::lexer::{keyword, tokenize};
use dmlparse::sql::literal::classify;
use dmlparse::{parse_insert, parse_sql, parse_update, Const, Expr, FieldType, Function};
use proptest::prelude::*;

const MIXED_CASE_TEMPLATE: &str = "update t set a = upper ( 'x' ) , b = len ( 'y' ) \
     where c is not null and d not in ( 1 , 2 ) or e like 'z%' and f = true";

fn mix_case(sql: &str, flips: &[bool]) -> String {
    let mut i = 0;
    sql.split_whitespace()
        .map(|word| {
            if keyword(word).is_none() {
                return word.to_string();
            }
            word.chars()
                .map(|c| {
                    i += 1;
                    if flips[i % flips.len()] {
                        c.to_ascii_uppercase()
                    } else {
                        c.to_ascii_lowercase()
                    }
                })
                .collect()
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn nesting_depth(expr: &Expr) -> usize {
    match expr.as_func() {
        Some(call) => 1 + call.args.iter().map(nesting_depth).max().unwrap_or(0),
        None => 0,
    }
}

fn literal_strategy() -> impl Strategy<Value = (String, FieldType)> {
    prop_oneof![
        "[a-z' ]{0,12}".prop_map(|s| (quote(&s), FieldType::String)),
        any::<u32>().prop_map(|n| (n.to_string(), FieldType::Integer)),
        (any::<u16>(), any::<u16>()).prop_map(|(a, b)| (format!("{}.{}", a, b), FieldType::Float)),
        any::<bool>().prop_map(|b| (b.to_string(), FieldType::Boolean)),
        Just(("null".to_string(), FieldType::Null)),
        (1000u32..9999, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| (format!("{:04}-{:02}-{:02}", y, m, d), FieldType::Date)),
        (1000u32..9999, 0u32..24, 0u32..60).prop_map(|(y, h, m)| {
            (
                format!("{:04}-06-01T{:02}:{:02}:00Z", y, h, m),
                FieldType::DateTime,
            )
        }),
    ]
}

proptest! {
    #[test]
    fn prop_keyword_case_does_not_change_tree(flips in prop::collection::vec(any::<bool>(), 1..64)) {
        let mut canonical = parse_sql(MIXED_CASE_TEMPLATE).unwrap();
        let mut mixed = parse_sql(&mix_case(MIXED_CASE_TEMPLATE, &flips)).unwrap();
        prop_assert_eq!(mixed.to_string(), canonical.to_string());
        // compare shape and values only
        canonical.clear_positions();
        mixed.clear_positions();
        prop_assert_eq!(mixed, canonical);
    }

    #[test]
    fn prop_string_literal_unescapes(s in "\\PC{0,40}") {
        let ins = parse_insert(&format!("INSERT INTO t (a) VALUES ({})", quote(&s))).unwrap();
        prop_assert_eq!(ins.values[0].values[0].as_const().cloned(), Some(Const::String(s)));
    }

    #[test]
    fn prop_literal_classification_total((text, expected) in literal_strategy()) {
        let tokens = tokenize(&text).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(classify(&tokens[0].token), Some(expected));

        let ins = parse_insert(&format!("INSERT INTO t (a) VALUES ({})", text)).unwrap();
        let value = ins.values[0].values[0].as_const().unwrap();
        prop_assert_eq!(value.field_type(), expected);
        prop_assert_eq!(FieldType::ALL.iter().filter(|t| **t == expected).count(), 1);
    }

    #[test]
    fn prop_integer_round_trip(n in any::<i64>()) {
        let ins = parse_insert(&format!("INSERT INTO t (a) VALUES ({})", n)).unwrap();
        prop_assert_eq!(ins.values[0].values[0].as_const().cloned(), Some(Const::Integer(n)));
    }

    #[test]
    fn prop_float_round_trip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let text = Const::Float(x).to_string();
        let ins = parse_insert(&format!("INSERT INTO t (a) VALUES ({})", text)).unwrap();
        prop_assert_eq!(ins.values[0].values[0].as_const().cloned(), Some(Const::Float(x)));
    }

    #[test]
    fn prop_function_nesting(depth in 1usize..60) {
        let sql = format!(
            "UPDATE t SET a = {}'TEST'{}",
            "LOWER(".repeat(depth),
            ")".repeat(depth)
        );
        let upd = parse_update(&sql).unwrap();
        let value = &upd.assignments[0].value;
        prop_assert_eq!(nesting_depth(value), depth);
        prop_assert_eq!(value.as_func().map(|c| c.func), Some(Function::Lower));
    }

    #[test]
    fn prop_counts_taken_as_written(
        columns in 1usize..6,
        widths in prop::collection::vec(1usize..6, 1..6),
    ) {
        let fields: Vec<String> = (0..columns).map(|i| format!("c{}", i)).collect();
        let rows: Vec<String> = widths
            .iter()
            .map(|w| format!("({})", vec!["1"; *w].join(", ")))
            .collect();
        let sql = format!(
            "INSERT INTO t ({}) VALUES {}",
            fields.join(", "),
            rows.join(", ")
        );
        let ins = parse_insert(&sql).unwrap();
        prop_assert_eq!(ins.fields.len(), columns);
        prop_assert_eq!(ins.values.len(), widths.len());
        let mismatched = widths.iter().filter(|w| **w != columns).count();
        prop_assert_eq!(ins.mismatched_rows().len(), mismatched);
    }

    #[test]
    fn prop_rendering_is_stable(
        field in "[a-z][a-z0-9_]{0,8}",
        s in "\\PC{0,16}",
        n in any::<i64>(),
        negate in any::<bool>(),
    ) {
        let not = if negate { "NOT " } else { "" };
        let sql = format!(
            "UPDATE t SET \"{}\" = CONCAT({}, 'x') WHERE {}\"{}\" = {} OR b IN ({}, NULL)",
            field, quote(&s), not, field, n, n
        );
        let first = parse_sql(&sql).unwrap().to_string();
        let second = parse_sql(&first).unwrap().to_string();
        prop_assert_eq!(first, second);
    }
}
