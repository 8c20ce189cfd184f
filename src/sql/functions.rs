/// Scalar functions accepted in value position.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Upper,
    Lower,
    Trim,
    Coalesce,
    Nullif,
    Concat,
    Length,    // LENGTH / LEN
    Substring, // SUBSTRING / SUBSTR
    Abs,
    Round,
    Floor,
    Ceil, // CEIL / CEILING
}

/// Allowed argument count. `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Arity {
            min: n,
            max: Some(n),
        }
    }

    const fn between(min: usize, max: usize) -> Self {
        Arity {
            min,
            max: Some(max),
        }
    }

    const fn at_least(min: usize) -> Self {
        Arity { min, max: None }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{} to {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

impl Function {
    pub const ALL: [Function; 12] = [
        Function::Upper,
        Function::Lower,
        Function::Trim,
        Function::Coalesce,
        Function::Nullif,
        Function::Concat,
        Function::Length,
        Function::Substring,
        Function::Abs,
        Function::Round,
        Function::Floor,
        Function::Ceil,
    ];

    /// Look up a function by name, case-insensitively, including aliases.
    pub fn from_name(name: &str) -> Option<Function> {
        let f = match name.to_ascii_uppercase().as_str() {
            "UPPER" => Function::Upper,
            "LOWER" => Function::Lower,
            "TRIM" => Function::Trim,
            "COALESCE" => Function::Coalesce,
            "NULLIF" => Function::Nullif,
            "CONCAT" => Function::Concat,
            "LENGTH" | "LEN" => Function::Length,
            "SUBSTRING" | "SUBSTR" => Function::Substring,
            "ABS" => Function::Abs,
            "ROUND" => Function::Round,
            "FLOOR" => Function::Floor,
            "CEIL" | "CEILING" => Function::Ceil,
            _ => return None,
        };
        Some(f)
    }

    /// Canonical (upper-case) name.
    pub fn name(self) -> &'static str {
        match self {
            Function::Upper => "UPPER",
            Function::Lower => "LOWER",
            Function::Trim => "TRIM",
            Function::Coalesce => "COALESCE",
            Function::Nullif => "NULLIF",
            Function::Concat => "CONCAT",
            Function::Length => "LENGTH",
            Function::Substring => "SUBSTRING",
            Function::Abs => "ABS",
            Function::Round => "ROUND",
            Function::Floor => "FLOOR",
            Function::Ceil => "CEIL",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Function::Upper
            | Function::Lower
            | Function::Trim
            | Function::Length
            | Function::Abs
            | Function::Floor
            | Function::Ceil => Arity::exactly(1),
            Function::Nullif => Arity::exactly(2),
            Function::Round => Arity::between(1, 2),
            Function::Substring => Arity::between(2, 3),
            Function::Coalesce | Function::Concat => Arity::at_least(2),
        }
    }

    pub(crate) fn check_arity(self, got: usize) -> Result<(), String> {
        let arity = self.arity();
        if arity.accepts(got) {
            Ok(())
        } else {
            Err(format!(
                "{} requires {} argument(s), got {}",
                self.name(),
                arity,
                got
            ))
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Function::from_name("upper"), Some(Function::Upper));
        assert_eq!(Function::from_name("Coalesce"), Some(Function::Coalesce));
        assert_eq!(Function::from_name("NULLIF"), Some(Function::Nullif));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Function::from_name("len"), Some(Function::Length));
        assert_eq!(Function::from_name("SUBSTR"), Some(Function::Substring));
        assert_eq!(Function::from_name("ceiling"), Some(Function::Ceil));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(Function::from_name("REVERSE"), None);
        assert_eq!(Function::from_name(""), None);
    }

    #[test]
    fn test_canonical_name_round_trips() {
        for f in Function::ALL {
            assert_eq!(Function::from_name(f.name()), Some(f));
        }
    }

    #[test]
    fn test_arity_table() {
        assert!(Function::Substring.arity().accepts(2));
        assert!(Function::Substring.arity().accepts(3));
        assert!(!Function::Substring.arity().accepts(1));
        assert!(!Function::Substring.arity().accepts(4));

        assert!(Function::Round.arity().accepts(1));
        assert!(Function::Round.arity().accepts(2));
        assert!(!Function::Round.arity().accepts(3));

        assert!(!Function::Coalesce.arity().accepts(1));
        assert!(Function::Concat.arity().accepts(17));

        assert!(!Function::Upper.arity().accepts(2));
    }

    #[test]
    fn test_check_arity_message() {
        let err = Function::Substring.check_arity(1).unwrap_err();
        assert_eq!(err, "SUBSTRING requires 2 to 3 argument(s), got 1");
        let err = Function::Concat.check_arity(1).unwrap_err();
        assert_eq!(err, "CONCAT requires at least 2 argument(s), got 1");
    }
}
