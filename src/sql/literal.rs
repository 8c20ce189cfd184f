/// Literal classification: maps a literal token to its `Const` value and
/// `FieldType` from the lexical form alone.
use chrono::{DateTime, NaiveDate};

use crate::sql::ast::Const;
use crate::sql::lexer::Token;
use crate::types::FieldType;

/// Field type of a literal token, or `None` if the token is not a literal.
pub fn classify(token: &Token) -> Option<FieldType> {
    let ty = match token {
        Token::StringLit(_) => FieldType::String,
        Token::Integer(_) => FieldType::Integer,
        Token::Float(_) => FieldType::Float,
        Token::True | Token::False => FieldType::Boolean,
        Token::Null => FieldType::Null,
        Token::Date(_) => FieldType::Date,
        Token::DateTime(_) => FieldType::DateTime,
        _ => return None,
    };
    Some(ty)
}

/// Build the constant for a literal token. `negative` applies a leading
/// minus sign taken from the grammar; it is only valid on numbers.
pub fn literal_value(token: &Token, negative: bool) -> Result<Const, String> {
    if negative && !matches!(token, Token::Integer(_) | Token::Float(_)) {
        return Err(format!("Cannot negate {}", token));
    }

    match token {
        Token::StringLit(s) => Ok(Const::String(s.clone())),
        Token::Integer(digits) => {
            let text = if negative {
                format!("-{}", digits)
            } else {
                digits.clone()
            };
            text.parse::<i64>()
                .map(Const::Integer)
                .map_err(|_| format!("Integer literal out of range: {}", text))
        }
        Token::Float(text) => {
            let n: f64 = text
                .parse()
                .map_err(|_| format!("Invalid float literal: {}", text))?;
            if !n.is_finite() {
                return Err(format!("Float literal out of range: {}", text));
            }
            Ok(Const::Float(if negative { -n } else { n }))
        }
        Token::True => Ok(Const::Boolean(true)),
        Token::False => Ok(Const::Boolean(false)),
        Token::Null => Ok(Const::Null),
        Token::Date(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Const::Date)
            .map_err(|e| format!("Invalid date literal {}: {}", text, e)),
        Token::DateTime(text) => DateTime::parse_from_rfc3339(text)
            .map(Const::DateTime)
            .map_err(|e| format!("Invalid datetime literal {}: {}", text, e)),
        other => Err(format!("Expected a literal, got {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn literal_tokens() -> Vec<Token> {
        vec![
            Token::StringLit("x".to_string()),
            Token::Integer("1".to_string()),
            Token::Float("1.5".to_string()),
            Token::True,
            Token::False,
            Token::Null,
            Token::Date("2024-01-15".to_string()),
            Token::DateTime("2024-01-15T10:30:00Z".to_string()),
        ]
    }

    #[test]
    fn test_classify_each_kind() {
        let types: Vec<_> = literal_tokens().iter().map(|t| classify(t).unwrap()).collect();
        assert_eq!(
            types,
            vec![
                FieldType::String,
                FieldType::Integer,
                FieldType::Float,
                FieldType::Boolean,
                FieldType::Boolean,
                FieldType::Null,
                FieldType::Date,
                FieldType::DateTime,
            ]
        );
    }

    #[test]
    fn test_classify_agrees_with_value() {
        for token in literal_tokens() {
            let value = literal_value(&token, false).unwrap();
            assert_eq!(classify(&token), Some(value.field_type()));
        }
    }

    #[test]
    fn test_classify_non_literals() {
        assert_eq!(classify(&Token::Ident("x".to_string())), None);
        assert_eq!(classify(&Token::Insert), None);
        assert_eq!(classify(&Token::LParen), None);
    }

    #[test]
    fn test_integer_values() {
        assert_eq!(
            literal_value(&Token::Integer("42".to_string()), false),
            Ok(Const::Integer(42))
        );
        assert_eq!(
            literal_value(&Token::Integer("42".to_string()), true),
            Ok(Const::Integer(-42))
        );
        assert_eq!(
            literal_value(&Token::Integer("9223372036854775808".to_string()), true),
            Ok(Const::Integer(i64::MIN))
        );
        assert!(literal_value(&Token::Integer("9223372036854775808".to_string()), false).is_err());
    }

    #[test]
    fn test_float_values() {
        assert_eq!(
            literal_value(&Token::Float("-2.5".to_string()), false),
            Ok(Const::Float(-2.5))
        );
        assert_eq!(
            literal_value(&Token::Float("1.5e2".to_string()), true),
            Ok(Const::Float(-150.0))
        );
        let err = literal_value(&Token::Float("1.0e999".to_string()), false).unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn test_date_values() {
        match literal_value(&Token::Date("2024-02-29".to_string()), false).unwrap() {
            Const::Date(d) => {
                assert_eq!(d.year(), 2024);
                assert_eq!(d.month(), 2);
                assert_eq!(d.day(), 29);
            }
            other => panic!("Expected Date, got {:?}", other),
        }
        assert!(literal_value(&Token::Date("2023-02-29".to_string()), false).is_err());
        assert!(literal_value(&Token::Date("2024-13-01".to_string()), false).is_err());
    }

    #[test]
    fn test_datetime_values() {
        match literal_value(
            &Token::DateTime("2024-01-15T10:30:00.250+05:30".to_string()),
            false,
        )
        .unwrap()
        {
            Const::DateTime(dt) => {
                assert_eq!(dt.hour(), 10);
                assert_eq!(dt.minute(), 30);
                assert_eq!(dt.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
                assert_eq!(dt.nanosecond(), 250_000_000);
            }
            other => panic!("Expected DateTime, got {:?}", other),
        }
        assert!(literal_value(&Token::DateTime("2024-01-15T25:00:00Z".to_string()), false).is_err());
    }

    #[test]
    fn test_negate_non_number() {
        let err = literal_value(&Token::StringLit("x".to_string()), true).unwrap_err();
        assert_eq!(err, "Cannot negate string 'x'");
    }

    #[test]
    fn test_non_literal_rejected() {
        let err = literal_value(&Token::Comma, false).unwrap_err();
        assert_eq!(err, "Expected a literal, got ','");
    }
}
