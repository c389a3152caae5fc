//! Error types for the language pipeline.
//!
//! Every phase — lexing, parsing, evaluation — reports through [`MusicError`],
//! a position-tagged error with a kind drawn from the language's taxonomy.

use std::fmt;

/// An error raised while processing a program.
#[derive(Debug, Clone)]
pub struct MusicError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

/// The error taxonomy. Every failure aborts the program at the point of
/// detection; nothing is recovered internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Grammar violation.
    Syntax,
    /// Unbound name, assignment to a non-location, redeclared parameter.
    Semantic,
    /// Operator type mismatch, wrong arity, non-boolean guard.
    Type,
    /// MIDI pitch left [0, 127].
    Range,
    /// Division or modulo by zero.
    Arith,
}

impl ErrorKind {
    fn name(self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::Semantic => "SemanticError",
            Self::Type => "TypeError",
            Self::Range => "RangeError",
            Self::Arith => "ArithError",
        }
    }
}

impl MusicError {
    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Syntax,
        }
    }

    pub fn semantic(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Semantic,
        }
    }

    pub fn type_mismatch(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Type,
        }
    }

    pub fn range(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Range,
        }
    }

    pub fn arith(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Arith,
        }
    }

    /// Process exit status for this error: 1 syntax, 2 semantic/type,
    /// 3 runtime (arithmetic and pitch-range failures).
    pub fn exit_code(&self) -> u8 {
        match self.kind {
            ErrorKind::Syntax => 1,
            ErrorKind::Semantic | ErrorKind::Type => 2,
            ErrorKind::Arith | ErrorKind::Range => 3,
        }
    }
}

impl fmt::Display for MusicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at line {} col {}",
            self.kind.name(),
            self.message,
            self.line,
            self.col
        )
    }
}

impl std::error::Error for MusicError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = MusicError::syntax("unexpected token", 3, 14);
        assert_eq!(
            err.to_string(),
            "SyntaxError: unexpected token at line 3 col 14"
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!(
            MusicError::semantic("x", 1, 1).to_string(),
            "SemanticError: x at line 1 col 1"
        );
        assert_eq!(
            MusicError::type_mismatch("x", 1, 1).to_string(),
            "TypeError: x at line 1 col 1"
        );
        assert_eq!(
            MusicError::range("x", 1, 1).to_string(),
            "RangeError: x at line 1 col 1"
        );
        assert_eq!(
            MusicError::arith("x", 1, 1).to_string(),
            "ArithError: x at line 1 col 1"
        );
    }

    #[test]
    fn exit_codes() {
        assert_eq!(MusicError::syntax("", 1, 1).exit_code(), 1);
        assert_eq!(MusicError::semantic("", 1, 1).exit_code(), 2);
        assert_eq!(MusicError::type_mismatch("", 1, 1).exit_code(), 2);
        assert_eq!(MusicError::arith("", 1, 1).exit_code(), 3);
        assert_eq!(MusicError::range("", 1, 1).exit_code(), 3);
    }
}
