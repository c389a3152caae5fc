//! Built-in operators — the initial global environment.
//!
//! Each operator carries its expected input kinds; the evaluator checks the
//! dynamic kinds of the arguments against this table before dispatching, so
//! every `apply` body runs on arguments it declared.

use std::fmt;

use crate::dsl::ast::Pos;
use crate::dsl::error::MusicError;

use super::env::Environment;
use super::value::{Denot, Kind, Value};

/// One accepted signature of a built-in operator.
pub struct Sig {
    pub params: &'static [Kind],
    pub result: Kind,
}

/// A built-in operator: name, accepted signatures, implementation.
pub struct Builtin {
    pub name: &'static str,
    pub sigs: &'static [Sig],
    apply: fn(&[Value], Pos) -> Result<Value, MusicError>,
}

impl Builtin {
    pub fn arity(&self) -> usize {
        self.sigs[0].params.len()
    }

    /// Type-check and run: arity first, then the argument kinds against
    /// each accepted signature.
    pub fn invoke(&self, args: &[Value], pos: Pos) -> Result<Value, MusicError> {
        if args.len() != self.arity() {
            return Err(MusicError::type_mismatch(
                format!(
                    "operator '{}' expects {} argument{}, got {}",
                    self.name,
                    self.arity(),
                    if self.arity() == 1 { "" } else { "s" },
                    args.len()
                ),
                pos.line,
                pos.col,
            ));
        }
        let matches_sig = self.sigs.iter().any(|sig| {
            sig.params
                .iter()
                .zip(args)
                .all(|(expected, arg)| *expected == arg.kind())
        });
        if !matches_sig {
            let expected: Vec<String> = self.sigs.iter().map(|s| kinds_list(s.params)).collect();
            let actual: Vec<String> = args.iter().map(|a| a.kind().to_string()).collect();
            return Err(MusicError::type_mismatch(
                format!(
                    "operator '{}' expects ({}), got ({})",
                    self.name,
                    expected.join(") or ("),
                    actual.join(", ")
                ),
                pos.line,
                pos.col,
            ));
        }
        (self.apply)(args, pos)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

fn kinds_list(kinds: &[Kind]) -> String {
    let names: Vec<String> = kinds.iter().map(Kind::to_string).collect();
    names.join(", ")
}

/// The initial environment: every built-in operator bound to its symbol.
pub fn initial_env() -> Environment {
    let mut env = Environment::empty();
    for builtin in BUILTINS {
        env = env.bind(builtin.name, Denot::Builtin(builtin));
    }
    env
}

const INT2_INT: &[Sig] = &[Sig {
    params: &[Kind::Int, Kind::Int],
    result: Kind::Int,
}];
const INT2_BOOL: &[Sig] = &[Sig {
    params: &[Kind::Int, Kind::Int],
    result: Kind::Bool,
}];
const EQ_SIGS: &[Sig] = &[
    Sig {
        params: &[Kind::Int, Kind::Int],
        result: Kind::Bool,
    },
    Sig {
        params: &[Kind::Bool, Kind::Bool],
        result: Kind::Bool,
    },
];
const BOOL2_BOOL: &[Sig] = &[Sig {
    params: &[Kind::Bool, Kind::Bool],
    result: Kind::Bool,
}];
const BOOL1_BOOL: &[Sig] = &[Sig {
    params: &[Kind::Bool],
    result: Kind::Bool,
}];
const MUSIC2_MUSIC: &[Sig] = &[Sig {
    params: &[Kind::Music, Kind::Music],
    result: Kind::Music,
}];
const MUSIC_INT_MUSIC: &[Sig] = &[Sig {
    params: &[Kind::Music, Kind::Int],
    result: Kind::Music,
}];
const MUSIC1_MUSIC: &[Sig] = &[Sig {
    params: &[Kind::Music],
    result: Kind::Music,
}];
const MUSIC1_BOOL: &[Sig] = &[Sig {
    params: &[Kind::Music],
    result: Kind::Bool,
}];
const MUSIC1_INT: &[Sig] = &[Sig {
    params: &[Kind::Music],
    result: Kind::Int,
}];

pub static BUILTINS: &[Builtin] = &[
    Builtin { name: "+", sigs: INT2_INT, apply: apply_add },
    Builtin { name: "-", sigs: INT2_INT, apply: apply_sub },
    Builtin { name: "*", sigs: INT2_INT, apply: apply_mul },
    Builtin { name: "/", sigs: INT2_INT, apply: apply_div },
    Builtin { name: "%", sigs: INT2_INT, apply: apply_mod },
    Builtin { name: "==", sigs: EQ_SIGS, apply: apply_eq },
    Builtin { name: "!=", sigs: EQ_SIGS, apply: apply_ne },
    Builtin { name: "<", sigs: INT2_BOOL, apply: apply_lt },
    Builtin { name: ">", sigs: INT2_BOOL, apply: apply_gt },
    Builtin { name: "and", sigs: BOOL2_BOOL, apply: apply_and },
    Builtin { name: "or", sigs: BOOL2_BOOL, apply: apply_or },
    Builtin { name: "not", sigs: BOOL1_BOOL, apply: apply_not },
    Builtin { name: "++", sigs: MUSIC2_MUSIC, apply: apply_concat },
    Builtin { name: "|", sigs: MUSIC2_MUSIC, apply: apply_union },
    Builtin { name: "!", sigs: MUSIC_INT_MUSIC, apply: apply_transpose },
    Builtin { name: "head", sigs: MUSIC1_MUSIC, apply: apply_head },
    Builtin { name: "tail", sigs: MUSIC1_MUSIC, apply: apply_tail },
    Builtin { name: "is_empty", sigs: MUSIC1_BOOL, apply: apply_is_empty },
    Builtin { name: "pitch", sigs: MUSIC1_INT, apply: apply_pitch },
    Builtin { name: "initialize", sigs: MUSIC1_MUSIC, apply: apply_initialize },
];

fn signature_mismatch(pos: Pos) -> MusicError {
    // Only reachable if an apply function disagrees with its signature.
    MusicError::type_mismatch("operator arguments did not match the checked signature", pos.line, pos.col)
}

fn apply_add(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Int(a), Value::Int(b)] => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| MusicError::arith("integer overflow in '+'", pos.line, pos.col)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_sub(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Int(a), Value::Int(b)] => a
            .checked_sub(*b)
            .map(Value::Int)
            .ok_or_else(|| MusicError::arith("integer overflow in '-'", pos.line, pos.col)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_mul(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Int(a), Value::Int(b)] => a
            .checked_mul(*b)
            .map(Value::Int)
            .ok_or_else(|| MusicError::arith("integer overflow in '*'", pos.line, pos.col)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_div(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Int(_), Value::Int(0)] => {
            Err(MusicError::arith("division by zero", pos.line, pos.col))
        }
        // Truncates toward zero.
        [Value::Int(a), Value::Int(b)] => a
            .checked_div(*b)
            .map(Value::Int)
            .ok_or_else(|| MusicError::arith("integer overflow in '/'", pos.line, pos.col)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_mod(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Int(_), Value::Int(0)] => {
            Err(MusicError::arith("modulo by zero", pos.line, pos.col))
        }
        [Value::Int(a), Value::Int(b)] => a
            .checked_rem(*b)
            .map(Value::Int)
            .ok_or_else(|| MusicError::arith("integer overflow in '%'", pos.line, pos.col)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_eq(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [a, b] => Ok(Value::Bool(a == b)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_ne(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [a, b] => Ok(Value::Bool(a != b)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_lt(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Int(a), Value::Int(b)] => Ok(Value::Bool(a < b)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_gt(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Int(a), Value::Int(b)] => Ok(Value::Bool(a > b)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_and(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Bool(a), Value::Bool(b)] => Ok(Value::Bool(*a && *b)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_or(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Bool(a), Value::Bool(b)] => Ok(Value::Bool(*a || *b)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_not(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Bool(a)] => Ok(Value::Bool(!a)),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_concat(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(a), Value::Music(b)] => Ok(Value::Music(a.concat(b))),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_union(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(a), Value::Music(b)] => Ok(Value::Music(a.union(b))),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_transpose(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(m), Value::Int(k)] => m.transposed(*k).map(Value::Music).map_err(|midi| {
            MusicError::range(
                format!("transposition moved a pitch to {midi}, outside [0, 127]"),
                pos.line,
                pos.col,
            )
        }),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_head(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(m)] => m.head().map(Value::Music).ok_or_else(|| {
            MusicError::type_mismatch("head of an empty sequence", pos.line, pos.col)
        }),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_tail(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(m)] => m.tail().map(Value::Music).ok_or_else(|| {
            MusicError::type_mismatch("tail of an empty sequence", pos.line, pos.col)
        }),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_is_empty(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(m)] => Ok(Value::Bool(m.is_empty())),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_pitch(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(m)] => m.first_pitch().map(Value::Int).ok_or_else(|| {
            MusicError::type_mismatch("pitch of an empty sequence", pos.line, pos.col)
        }),
        _ => Err(signature_mismatch(pos)),
    }
}

fn apply_initialize(args: &[Value], pos: Pos) -> Result<Value, MusicError> {
    match args {
        [Value::Music(m)] => Ok(Value::Music(m.initialized())),
        _ => Err(signature_mismatch(pos)),
    }
}
