/// DML lexer (tokenizer) using nom.
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while_m_n},
    character::complete::{char, digit1, multispace1, one_of, satisfy},
    combinator::{opt, recognize, value},
    multi::many0,
    sequence::{pair, tuple},
    IResult,
};

use crate::error::{DmlError, Result};
use crate::sql::functions::Function;
use crate::types::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    From,
    Where,
    Upsert,
    On,
    And,
    Or,
    Not,
    In,
    Like,
    Is,
    Null,
    True,
    False,
    Function(Function),

    // Literals, kept in lexical form (see sql::literal)
    Integer(String),
    Float(String),
    StringLit(String), // already unescaped
    Date(String),
    DateTime(String),

    // Identifiers (quoted identifiers are unquoted into this too)
    Ident(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Dot,
    Eq,
    EqEq,
    Ne, // "<>" or "!="
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            Token::Insert => "INSERT",
            Token::Into => "INTO",
            Token::Values => "VALUES",
            Token::Update => "UPDATE",
            Token::Set => "SET",
            Token::Delete => "DELETE",
            Token::From => "FROM",
            Token::Where => "WHERE",
            Token::Upsert => "UPSERT",
            Token::On => "ON",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::In => "IN",
            Token::Like => "LIKE",
            Token::Is => "IS",
            Token::Null => "NULL",
            Token::True => "TRUE",
            Token::False => "FALSE",
            Token::Function(func) => return write!(f, "function {}", func),
            Token::Integer(s) => return write!(f, "integer {}", s),
            Token::Float(s) => return write!(f, "float {}", s),
            Token::StringLit(s) => return write!(f, "string '{}'", s.replace('\'', "''")),
            Token::Date(s) => return write!(f, "date {}", s),
            Token::DateTime(s) => return write!(f, "datetime {}", s),
            Token::Ident(s) => return write!(f, "identifier \"{}\"", s),
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::Comma => "','",
            Token::Dot => "'.'",
            Token::Eq => "'='",
            Token::EqEq => "'=='",
            Token::Ne => "'<>'",
            Token::Lt => "'<'",
            Token::Gt => "'>'",
            Token::Le => "'<='",
            Token::Ge => "'>='",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
        };
        f.write_str(sym)
    }
}

/// A token together with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: Position,
}

/// Tokenize a DML string.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut remaining = input;
    let mut pos = Position::START;

    loop {
        // Skip whitespace and `--` comments
        let rest = match lex_trivia(remaining) {
            Ok((rest, _)) => rest,
            Err(_) => remaining,
        };
        pos = pos.advance(&remaining[..remaining.len() - rest.len()]);
        remaining = rest;

        if remaining.is_empty() {
            break;
        }

        match lex_token(remaining) {
            Ok((rest, token)) => {
                tokens.push(Spanned { token, pos });
                pos = pos.advance(&remaining[..remaining.len() - rest.len()]);
                remaining = rest;
            }
            Err(_) => return Err(lex_error(remaining, pos)),
        }
    }

    Ok(tokens)
}

fn lex_error(remaining: &str, pos: Position) -> DmlError {
    match remaining.chars().next() {
        Some('\'') => DmlError::syntax(pos, "Unterminated string literal"),
        Some('"') => DmlError::syntax(pos, "Unterminated quoted identifier"),
        Some(c) => DmlError::syntax(pos, format!("Unexpected character '{}'", c)),
        None => DmlError::syntax(pos, "Unexpected end of input"),
    }
}

fn lex_trivia(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            multispace1,
            // runs to the next line break, including a lone '\r'
            recognize(pair(tag("--"), take_while(|c: char| c != '\n' && c != '\r'))),
        ))),
    )(input)
}

// Order matters: the date/time shapes share a prefix with numbers, and a
// signed float must be tried before the bare '-' / '+' symbols.
fn lex_token(input: &str) -> IResult<&str, Token> {
    alt((
        lex_keyword_or_ident,
        lex_datetime,
        lex_date,
        lex_quoted_ident,
        lex_float,
        lex_integer,
        lex_string_literal,
        lex_symbol,
    ))(input)
}

fn lex_symbol(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Ne, alt((tag("<>"), tag("!=")))),
        value(Token::Le, tag("<=")),
        value(Token::Ge, tag(">=")),
        value(Token::EqEq, tag("==")),
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::Comma, char(',')),
        value(Token::Dot, char('.')),
        value(Token::Eq, char('=')),
        value(Token::Lt, char('<')),
        value(Token::Gt, char('>')),
        value(Token::Plus, char('+')),
        value(Token::Minus, char('-')),
        value(Token::Star, char('*')),
        value(Token::Slash, char('/')),
        value(Token::Percent, char('%')),
    ))(input)
}

fn lex_string_literal(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('\'')(input)?;
    let mut result = String::new();
    let mut chars = input.chars();
    let mut consumed = 0;

    loop {
        match chars.next() {
            Some('\'') => {
                consumed += 1;
                // Check for escaped quote ''
                if chars.clone().next() == Some('\'') {
                    chars.next();
                    consumed += 1;
                    result.push('\'');
                } else {
                    break;
                }
            }
            Some(c) => {
                consumed += c.len_utf8();
                result.push(c);
            }
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }

    Ok((&input[consumed..], Token::StringLit(result)))
}

fn lex_quoted_ident(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.chars();
    let mut consumed = 0;

    loop {
        match chars.next() {
            Some('"') => {
                consumed += 1;
                break;
            }
            Some('\\') => {
                consumed += 1;
                match chars.next() {
                    Some(c) => {
                        consumed += c.len_utf8();
                        result.push(c);
                    }
                    None => {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            input,
                            nom::error::ErrorKind::Escaped,
                        )));
                    }
                }
            }
            Some(c) => {
                consumed += c.len_utf8();
                result.push(c);
            }
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }

    Ok((&input[consumed..], Token::Ident(result)))
}

fn fixed_digits<'a>(n: usize) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    move |input| take_while_m_n(n, n, |c: char| c.is_ascii_digit())(input)
}

fn date_shape(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        fixed_digits(4),
        char('-'),
        fixed_digits(2),
        char('-'),
        fixed_digits(2),
    )))(input)
}

fn lex_date(input: &str) -> IResult<&str, Token> {
    let (rest, text) = date_shape(input)?;
    Ok((rest, Token::Date(text.to_string())))
}

/// `YYYY-MM-DDThh:mm:ss[.fraction](Z|±hh:mm)`
fn lex_datetime(input: &str) -> IResult<&str, Token> {
    let time = tuple((
        fixed_digits(2),
        char(':'),
        fixed_digits(2),
        char(':'),
        fixed_digits(2),
        opt(pair(char('.'), digit1)),
    ));
    let zone = alt((
        tag("Z"),
        recognize(tuple((
            one_of("+-"),
            fixed_digits(2),
            char(':'),
            fixed_digits(2),
        ))),
    ));
    let (rest, text) = recognize(tuple((date_shape, char('T'), time, zone)))(input)?;
    Ok((rest, Token::DateTime(text.to_string())))
}

fn lex_float(input: &str) -> IResult<&str, Token> {
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        char('.'),
        digit1,
        opt(exponent),
    )))(input)?;
    Ok((rest, Token::Float(text.to_string())))
}

fn lex_integer(input: &str) -> IResult<&str, Token> {
    let (rest, digits) = digit1(input)?;
    Ok((rest, Token::Integer(digits.to_string())))
}

fn lex_keyword_or_ident(input: &str) -> IResult<&str, Token> {
    let (remaining, word) = recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)?;

    let token = keyword(word).unwrap_or_else(|| Token::Ident(word.to_string()));
    Ok((remaining, token))
}

/// Classify a bare word as a keyword or function name, case-insensitively.
pub fn keyword(word: &str) -> Option<Token> {
    let token = match word.to_ascii_uppercase().as_str() {
        "INSERT" => Token::Insert,
        "INTO" => Token::Into,
        "VALUES" => Token::Values,
        "UPDATE" => Token::Update,
        "SET" => Token::Set,
        "DELETE" => Token::Delete,
        "FROM" => Token::From,
        "WHERE" => Token::Where,
        "UPSERT" => Token::Upsert,
        "ON" => Token::On,
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        "IN" => Token::In,
        "LIKE" => Token::Like,
        "IS" => Token::Is,
        "NULL" => Token::Null,
        "TRUE" => Token::True,
        "FALSE" => Token::False,
        upper => return Function::from_name(upper).map(Token::Function),
    };
    Some(token)
}
