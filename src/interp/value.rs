//! Runtime value classes.
//!
//! Three classes with distinct reach: [`Value`] is what expressions produce,
//! [`Stored`] is what the store holds, [`Denot`] is what a name can mean.
//! Closures enter the store when a declaration binds them behind a fresh
//! location, so they are reached only through names.

use std::fmt;
use std::rc::Rc;

use crate::dsl::ast::{CommandSeq, Expr};
use crate::music::Music;

use super::env::Environment;
use super::ops::Builtin;

/// An expressible value — the result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Music(Music),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Int(_) => Kind::Int,
            Self::Bool(_) => Kind::Bool,
            Self::Music(_) => Kind::Music,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Music(m) => write!(f, "<music: {} events>", m.len()),
        }
    }
}

/// The dynamic kind of a value, used by operator signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Bool,
    Music,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Music => "music",
        };
        write!(f, "{name}")
    }
}

/// An opaque store address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc(pub usize);

/// A storable value: any expressible value, or a closure bound by a
/// function/procedure declaration.
#[derive(Debug, Clone)]
pub enum Stored {
    Value(Value),
    Closure(Rc<Closure>),
}

/// A denotable value: what an identifier can resolve to.
#[derive(Debug, Clone)]
pub enum Denot {
    /// Directly bound value (let bindings, parameters).
    Value(Value),
    /// Mutable variable: the name denotes an address, the store holds the
    /// current value.
    Location(Loc),
    /// Built-in operator from the initial environment.
    Builtin(&'static Builtin),
}

/// A user-defined callable: parameters, a body, and the environment captured
/// at the declaration site (which already contains the callable's own
/// binding, so recursion resolves).
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub env: Environment,
    pub body: ClosureBody,
}

#[derive(Debug, Clone)]
pub enum ClosureBody {
    /// A pure function: the body is a single expression.
    Function { body: Expr },
    /// A procedure: commands followed by a return expression.
    Procedure {
        body: CommandSeq,
        return_expr: Expr,
    },
}

impl Closure {
    pub fn kind_name(&self) -> &'static str {
        match self.body {
            ClosureBody::Function { .. } => "function",
            ClosureBody::Procedure { .. } => "procedure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Value::Int(3).kind(), Kind::Int);
        assert_eq!(Value::Bool(true).kind(), Kind::Bool);
        assert_eq!(Value::Music(Music::empty()).kind(), Kind::Music);
    }

    #[test]
    fn display_scalars() {
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn kind_names() {
        assert_eq!(Kind::Int.to_string(), "int");
        assert_eq!(Kind::Bool.to_string(), "bool");
        assert_eq!(Kind::Music.to_string(), "music");
    }
}
