//! The evaluator: expression evaluation and command execution.
//!
//! Evaluation is strict and left-to-right throughout. Expressions produce
//! values; commands thread the environment forward and mutate the store.
//! Errors abort at the point of detection — no operator is partially
//! applied.

use std::rc::Rc;

use crate::dsl::ast::{Command, CommandKind, CommandSeq, Expr, ExprKind, Pos};
use crate::dsl::error::MusicError;
use crate::music::{export, note, Music, NotePitch, NoteValue};
use crate::render::Renderer;

use super::env::Environment;
use super::ops;
use super::store::Store;
use super::value::{Closure, ClosureBody, Denot, Stored, Value};

pub struct Interpreter<'a> {
    renderer: &'a mut dyn Renderer,
    store: Store,
    printed: Vec<String>,
    last_music: Option<Music>,
}

impl<'a> Interpreter<'a> {
    pub fn new(renderer: &'a mut dyn Renderer) -> Self {
        Self {
            renderer,
            store: Store::new(),
            printed: Vec::new(),
            last_music: None,
        }
    }

    /// Execute a whole program against the initial operator environment.
    pub fn run(&mut self, program: &CommandSeq) -> Result<(), MusicError> {
        let env = ops::initial_env();
        self.exec_seq(program, env)?;
        Ok(())
    }

    /// Scalar lines printed so far (music goes to the renderer instead).
    pub fn printed(&self) -> &[String] {
        &self.printed
    }

    /// Consume the interpreter, yielding the last printed music value and
    /// the printed scalar lines.
    pub fn finish(self) -> (Option<Music>, Vec<String>) {
        (self.last_music, self.printed)
    }

    fn exec_seq(
        &mut self,
        seq: &CommandSeq,
        env: Environment,
    ) -> Result<Environment, MusicError> {
        let mut env = env;
        for command in seq.iter() {
            env = self.exec_command(command, env)?;
        }
        Ok(env)
    }

    fn exec_command(
        &mut self,
        command: &Command,
        env: Environment,
    ) -> Result<Environment, MusicError> {
        match &command.kind {
            CommandKind::VarDecl { name, expr } => {
                let value = self.eval_expr(expr, &env)?;
                let loc = self.store.allocate(Stored::Value(value));
                Ok(env.bind(name, Denot::Location(loc)))
            }

            CommandKind::Assign { name, expr } => {
                let loc = match env.lookup(name) {
                    Some(Denot::Location(loc)) => *loc,
                    Some(_) => {
                        return Err(MusicError::semantic(
                            format!("'{name}' is not an assignable variable"),
                            command.pos.line,
                            command.pos.col,
                        ));
                    }
                    None => {
                        return Err(MusicError::semantic(
                            format!("assignment to undeclared variable '{name}'"),
                            command.pos.line,
                            command.pos.col,
                        ));
                    }
                };
                let value = self.eval_expr(expr, &env)?;
                if !self.store.update(loc, Stored::Value(value)) {
                    return Err(MusicError::semantic(
                        format!("'{name}' refers to a dangling location"),
                        command.pos.line,
                        command.pos.col,
                    ));
                }
                Ok(env)
            }

            CommandKind::Print(expr) => {
                let value = self.eval_expr(expr, &env)?;
                match value {
                    Value::Music(music) => {
                        let json = export::to_json(&music).map_err(|e| {
                            MusicError::semantic(
                                format!("could not serialize music result: {e}"),
                                command.pos.line,
                                command.pos.col,
                            )
                        })?;
                        self.renderer.render(&json);
                        self.last_music = Some(music);
                    }
                    other => self.printed.push(other.to_string()),
                }
                Ok(env)
            }

            CommandKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let taken = if self.eval_guard(cond, &env, "if")? {
                    then_branch
                } else {
                    else_branch
                };
                // The branch is a scope: its bindings and allocations do not
                // survive it.
                let mark = self.store.mark();
                self.exec_seq(taken, env.clone())?;
                self.store.reclaim(mark, &env);
                Ok(env)
            }

            CommandKind::While { cond, body } => {
                while self.eval_guard(cond, &env, "while")? {
                    let mark = self.store.mark();
                    self.exec_seq(body, env.clone())?;
                    self.store.reclaim(mark, &env);
                }
                Ok(env)
            }

            CommandKind::FunDecl { name, params, body } => self.declare(
                env,
                name,
                params,
                ClosureBody::Function { body: body.clone() },
                command.pos,
            ),

            CommandKind::ProcDecl {
                name,
                params,
                body,
                return_expr,
            } => self.declare(
                env,
                name,
                params,
                ClosureBody::Procedure {
                    body: body.clone(),
                    return_expr: return_expr.clone(),
                },
                command.pos,
            ),
        }
    }

    /// Bind a function or procedure: the name denotes a fresh location
    /// holding the closure, and the closure captures the environment that
    /// already contains that binding, so recursive calls resolve.
    fn declare(
        &mut self,
        env: Environment,
        name: &str,
        params: &[String],
        body: ClosureBody,
        pos: Pos,
    ) -> Result<Environment, MusicError> {
        for (i, param) in params.iter().enumerate() {
            if params[..i].contains(param) {
                return Err(MusicError::semantic(
                    format!("duplicate parameter '{param}' in declaration of '{name}'"),
                    pos.line,
                    pos.col,
                ));
            }
        }
        // The cell is patched right after the closure captures the extended
        // environment.
        let loc = self.store.allocate(Stored::Value(Value::Bool(false)));
        let env = env.bind(name, Denot::Location(loc));
        let closure = Closure {
            params: params.to_vec(),
            env: env.clone(),
            body,
        };
        self.store.update(loc, Stored::Closure(Rc::new(closure)));
        Ok(env)
    }

    fn eval_guard(
        &mut self,
        cond: &Expr,
        env: &Environment,
        construct: &str,
    ) -> Result<bool, MusicError> {
        match self.eval_expr(cond, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(MusicError::type_mismatch(
                format!(
                    "condition of '{construct}' must be a boolean, got {}",
                    other.kind()
                ),
                cond.pos.line,
                cond.pos.col,
            )),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Result<Value, MusicError> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Int(*n)),

            ExprKind::Bool(b) => Ok(Value::Bool(*b)),

            ExprKind::Note {
                letter,
                accidental,
                octave,
                duration,
            } => {
                let midi = note::midi_number(*letter, *accidental, *octave).ok_or_else(|| {
                    MusicError::semantic(
                        format!(
                            "pitch {letter}{}{octave} is outside the MIDI range [0, 127]",
                            accidental.symbol()
                        ),
                        expr.pos.line,
                        expr.pos.col,
                    )
                })?;
                Ok(Value::Music(Music::single(NoteValue::new(
                    NotePitch::Midi(midi),
                    *duration,
                ))))
            }

            ExprKind::Rest { duration } => {
                Ok(Value::Music(Music::single(NoteValue::rest(*duration))))
            }

            ExprKind::Var(name) => match env.lookup(name) {
                None => Err(MusicError::semantic(
                    format!("undefined identifier '{name}'"),
                    expr.pos.line,
                    expr.pos.col,
                )),
                Some(Denot::Value(value)) => Ok(value.clone()),
                Some(Denot::Location(loc)) => match self.store.access(*loc) {
                    Some(Stored::Value(value)) => Ok(value.clone()),
                    Some(Stored::Closure(closure)) => Err(MusicError::type_mismatch(
                        format!("'{name}' is a {}, not a value", closure.kind_name()),
                        expr.pos.line,
                        expr.pos.col,
                    )),
                    None => Err(MusicError::semantic(
                        format!("'{name}' refers to a dangling location"),
                        expr.pos.line,
                        expr.pos.col,
                    )),
                },
                Some(Denot::Builtin(_)) => Err(MusicError::type_mismatch(
                    format!("'{name}' is a built-in operator, not a value"),
                    expr.pos.line,
                    expr.pos.col,
                )),
            },

            ExprKind::Apply { op, lhs, rhs } => {
                // Both operands evaluate, left to right, before dispatch:
                // 'and'/'or' do not short-circuit.
                let args = vec![self.eval_expr(lhs, env)?, self.eval_expr(rhs, env)?];
                self.dispatch(op, &args, env, expr.pos)
            }

            ExprKind::Unary { op, operand } => {
                let args = vec![self.eval_expr(operand, env)?];
                self.dispatch(op, &args, env, expr.pos)
            }

            ExprKind::Let { name, bound, body } => {
                let value = self.eval_expr(bound, env)?;
                let extended = env.bind(name, Denot::Value(value));
                self.eval_expr(body, &extended)
            }

            ExprKind::Call { name, args } => {
                let closure = self.resolve_closure(name, env, expr.pos)?;
                if args.len() != closure.params.len() {
                    return Err(MusicError::type_mismatch(
                        format!(
                            "{} '{name}' expects {} argument{}, got {}",
                            closure.kind_name(),
                            closure.params.len(),
                            if closure.params.len() == 1 { "" } else { "s" },
                            args.len()
                        ),
                        expr.pos.line,
                        expr.pos.col,
                    ));
                }

                // Arguments evaluate in the caller's environment, then bind
                // by value over the captured one.
                let mut call_env = closure.env.clone();
                for (param, arg) in closure.params.iter().zip(args) {
                    let value = self.eval_expr(arg, env)?;
                    call_env = call_env.bind(param, Denot::Value(value));
                }

                match &closure.body {
                    ClosureBody::Function { body } => {
                        // Function bodies run against an isolated store
                        // derivative: nothing they do to state survives.
                        let snapshot = self.store.clone();
                        let result = self.eval_expr(body, &call_env);
                        self.store = snapshot;
                        result
                    }
                    ClosureBody::Procedure { body, return_expr } => {
                        let after_body = self.exec_seq(body, call_env)?;
                        self.eval_expr(return_expr, &after_body)
                    }
                }
            }
        }
    }

    fn dispatch(
        &mut self,
        op: &str,
        args: &[Value],
        env: &Environment,
        pos: Pos,
    ) -> Result<Value, MusicError> {
        match env.lookup(op) {
            Some(Denot::Builtin(builtin)) => builtin.invoke(args, pos),
            _ => Err(MusicError::type_mismatch(
                format!("'{op}' is not a defined operator"),
                pos.line,
                pos.col,
            )),
        }
    }

    fn resolve_closure(
        &self,
        name: &str,
        env: &Environment,
        pos: Pos,
    ) -> Result<Rc<Closure>, MusicError> {
        match env.lookup(name) {
            None => Err(MusicError::semantic(
                format!("undefined identifier '{name}'"),
                pos.line,
                pos.col,
            )),
            Some(Denot::Location(loc)) => match self.store.access(*loc) {
                Some(Stored::Closure(closure)) => Ok(Rc::clone(closure)),
                Some(Stored::Value(_)) => Err(MusicError::type_mismatch(
                    format!("'{name}' is not a function or procedure"),
                    pos.line,
                    pos.col,
                )),
                None => Err(MusicError::semantic(
                    format!("'{name}' refers to a dangling location"),
                    pos.line,
                    pos.col,
                )),
            },
            Some(_) => Err(MusicError::type_mismatch(
                format!("'{name}' is not a function or procedure"),
                pos.line,
                pos.col,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;
    use crate::dsl::parse_program;
    use crate::render::NullRenderer;

    fn run(source: &str) -> Result<(Option<Music>, Vec<String>), MusicError> {
        let program = parse_program(source)?;
        let mut renderer = NullRenderer;
        let mut interp = Interpreter::new(&mut renderer);
        interp.run(&program)?;
        Ok(interp.finish())
    }

    fn printed(source: &str) -> Vec<String> {
        run(source).unwrap().1
    }

    fn music(source: &str) -> Music {
        run(source).unwrap().0.expect("program printed no music")
    }

    fn error_kind(source: &str) -> ErrorKind {
        run(source).unwrap_err().kind
    }

    fn midis(music: &Music) -> Vec<i64> {
        music
            .events()
            .iter()
            .flat_map(|e| e.notes.iter().map(|n| n.pitch.midi()))
            .collect()
    }

    #[test]
    fn print_integer() {
        assert_eq!(printed("print 1 + 2 * 3"), vec!["7"]);
    }

    #[test]
    fn print_boolean() {
        assert_eq!(printed("print true and false"), vec!["false"]);
    }

    #[test]
    fn var_decl_and_use() {
        assert_eq!(printed("var x = 4; print x * x"), vec!["16"]);
    }

    #[test]
    fn assignment_updates_store() {
        assert_eq!(printed("var x = 1; x <- x + 9; print x"), vec!["10"]);
    }

    #[test]
    fn redeclaration_shadows() {
        assert_eq!(printed("var x = 1; var x = 2; print x"), vec!["2"]);
    }

    #[test]
    fn let_scoping_restores_outer_binding() {
        assert_eq!(
            printed("var x = 1; print (let x = 41 in x + 1) + x"),
            vec!["43"]
        );
    }

    #[test]
    fn let_bound_name_is_not_assignable() {
        // Parameters bind by value, like let: assignment to one is rejected.
        assert_eq!(
            error_kind("procedure p(x) = { x <- 1 return 0 }; print p(5)"),
            ErrorKind::Semantic
        );
    }

    #[test]
    fn assignment_to_undeclared_is_semantic_error() {
        assert_eq!(error_kind("x <- 1"), ErrorKind::Semantic);
    }

    #[test]
    fn undefined_identifier_is_semantic_error() {
        assert_eq!(error_kind("print y"), ErrorKind::Semantic);
    }

    #[test]
    fn if_takes_exactly_one_branch() {
        assert_eq!(
            printed("var x = 0; if 1 < 2 then { x <- 10 } else { x <- 20 }; print x"),
            vec!["10"]
        );
        assert_eq!(
            printed("var x = 0; if 2 < 1 then { x <- 10 } else { x <- 20 }; print x"),
            vec!["20"]
        );
    }

    #[test]
    fn if_guard_must_be_boolean() {
        assert_eq!(
            error_kind("if 1 then { print 1 } else { print 2 }"),
            ErrorKind::Type
        );
    }

    #[test]
    fn block_bindings_do_not_escape() {
        assert_eq!(
            error_kind("if true then { var y = 1 } else { var y = 2 }; print y"),
            ErrorKind::Semantic
        );
    }

    #[test]
    fn while_loop_counts() {
        assert_eq!(
            printed("var i = 0; var acc = 0; while i < 5 do { acc <- acc + i; i <- i + 1 }; print acc"),
            vec!["10"]
        );
    }

    #[test]
    fn while_guard_must_be_boolean() {
        assert_eq!(error_kind("while 3 do { print 1 }"), ErrorKind::Type);
    }

    #[test]
    fn while_body_allocations_are_reclaimed() {
        let program = parse_program(
            "var i = 0; while i < 100 do { var tmp = i * 2; var tmp2 = tmp + 1; i <- i + 1 }",
        )
        .unwrap();
        let mut renderer = NullRenderer;
        let mut interp = Interpreter::new(&mut renderer);
        interp.run(&program).unwrap();
        // Only `i` survives; per-iteration cells were released.
        assert_eq!(interp.store.len(), 1);
    }

    #[test]
    fn function_application() {
        assert_eq!(printed("function inc(a) = a + 1; print inc(41)"), vec!["42"]);
    }

    #[test]
    fn function_of_two_parameters() {
        assert_eq!(
            printed("function mix(a, b) = a * 10 + b; print mix(4, 2)"),
            vec!["42"]
        );
    }

    #[test]
    fn zero_argument_procedure() {
        assert_eq!(
            printed("procedure five() = { var a = 5 return a }; print five()"),
            vec!["5"]
        );
    }

    #[test]
    fn arguments_evaluate_in_caller_scope() {
        assert_eq!(
            printed("var a = 3; function twice(x) = x + x; print twice(a + 1)"),
            vec!["8"]
        );
    }

    #[test]
    fn procedure_mutates_caller_state() {
        assert_eq!(
            printed("var x = 1; procedure bump() = { x <- x + 1 return x }; print bump(); print x"),
            vec!["2", "2"]
        );
    }

    #[test]
    fn function_body_state_is_isolated() {
        // The function calls a mutating procedure, but its store derivative
        // is discarded: the caller's `x` is untouched.
        assert_eq!(
            printed(
                "var x = 1; procedure bump() = { x <- x + 1 return x }; \
                 function probe(a) = bump() + a; print probe(0); print x"
            ),
            vec!["2", "1"]
        );
    }

    #[test]
    fn closures_capture_locations_not_values() {
        assert_eq!(
            printed("var x = 1; procedure get() = { var t = 0 return x }; x <- 5; print get()"),
            vec!["5"]
        );
    }

    #[test]
    fn recursive_procedure() {
        assert_eq!(
            printed(
                "procedure count(n) = { var r = 0; \
                 if n > 0 then { r <- count(n - 1) + 1 } else { r <- 0 } return r }; \
                 print count(3)"
            ),
            vec!["3"]
        );
    }

    #[test]
    fn call_arity_mismatch_is_type_error() {
        assert_eq!(
            error_kind("function inc(a) = a + 1; print inc(1, 2)"),
            ErrorKind::Type
        );
    }

    #[test]
    fn calling_a_plain_variable_is_type_error() {
        assert_eq!(error_kind("var x = 1; print x()"), ErrorKind::Type);
    }

    #[test]
    fn naming_a_procedure_as_value_is_type_error() {
        assert_eq!(
            error_kind("procedure p() = { var a = 1 return a }; print p"),
            ErrorKind::Type
        );
    }

    #[test]
    fn duplicate_parameter_is_semantic_error() {
        assert_eq!(
            error_kind("function f(a, a) = a; print f(1, 2)"),
            ErrorKind::Semantic
        );
    }

    #[test]
    fn and_or_do_not_short_circuit() {
        // The right operand is evaluated even when the left decides.
        assert_eq!(error_kind("print true or 1 / 0 == 0"), ErrorKind::Arith);
        assert_eq!(error_kind("print false and 1 / 0 == 0"), ErrorKind::Arith);
    }

    #[test]
    fn division_by_zero_reaches_caller() {
        assert_eq!(error_kind("print 1 / 0"), ErrorKind::Arith);
        assert_eq!(error_kind("print 1 % 0"), ErrorKind::Arith);
    }

    #[test]
    fn note_literal_evaluates_to_single_event() {
        let m = music("print Cn4/1");
        assert_eq!(midis(&m), vec![60]);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn concat_of_literals() {
        let m = music("print Cn4/1 ++ En4/1");
        assert_eq!(midis(&m), vec![60, 64]);
    }

    #[test]
    fn union_builds_chords() {
        let m = music("print Cn4/1 | En4/1 | Gn4/1");
        assert_eq!(m.len(), 1);
        assert_eq!(midis(&m), vec![60, 64, 67]);
    }

    #[test]
    fn transposition_operator() {
        let m = music("print (Cn4/1 ++ Dn4/1) ! 12");
        assert_eq!(midis(&m), vec![72, 74]);
    }

    #[test]
    fn transposition_out_of_range() {
        assert_eq!(error_kind("print Gn9/1 ! 12"), ErrorKind::Range);
    }

    #[test]
    fn transposing_non_music_is_type_error() {
        assert_eq!(error_kind("print 3 ! 2"), ErrorKind::Type);
    }

    #[test]
    fn head_tail_pitch_over_program_state() {
        assert_eq!(
            printed("var m = Cn4/1 ++ En4/1; print pitch head m; print pitch tail m"),
            vec!["60", "64"]
        );
    }

    #[test]
    fn is_empty_drives_a_loop() {
        assert_eq!(
            printed(
                "var m = Cn4/1 ++ En4/1 ++ Gn4/1; var n = 0; var b = is_empty m; \
                 while not b do { m <- tail m; n <- n + 1; b <- is_empty m }; print n"
            ),
            vec!["3"]
        );
    }

    #[test]
    fn last_printed_music_wins() {
        let m = music("print Cn4/1; print Dn4/1");
        assert_eq!(midis(&m), vec![62]);
    }

    #[test]
    fn scalar_prints_do_not_touch_music_result() {
        let (music, printed) = run("print 7; print Cn4/1").unwrap();
        assert_eq!(printed, vec!["7"]);
        assert_eq!(midis(&music.unwrap()), vec![60]);
    }
}
