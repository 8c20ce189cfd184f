use thiserror::Error;

use crate::types::Position;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmlError {
    /// The input does not match the grammar at `pos`.
    #[error("syntax error at {pos}: {message}")]
    Syntax { pos: Position, message: String },

    /// The input is well-formed but not what the caller asked for, or names
    /// something outside the closed function set.
    #[error("semantic error at {pos}: {message}")]
    Semantic { pos: Position, message: String },
}

impl DmlError {
    pub(crate) fn syntax(pos: Position, message: impl Into<String>) -> Self {
        DmlError::Syntax {
            pos,
            message: message.into(),
        }
    }

    pub(crate) fn semantic(pos: Position, message: impl Into<String>) -> Self {
        DmlError::Semantic {
            pos,
            message: message.into(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            DmlError::Syntax { pos, .. } | DmlError::Semantic { pos, .. } => *pos,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DmlError::Syntax { message, .. } | DmlError::Semantic { message, .. } => message,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, DmlError::Syntax { .. })
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, DmlError::Semantic { .. })
    }
}

pub type Result<T> = std::result::Result<T, DmlError>;
