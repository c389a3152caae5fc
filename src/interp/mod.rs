//! Program execution — environments, store, operators, evaluator.

pub mod env;
pub mod eval;
pub mod ops;
pub mod store;
pub mod value;

pub use env::Environment;
pub use eval::Interpreter;
pub use store::Store;
pub use value::{Closure, ClosureBody, Denot, Kind, Loc, Stored, Value};

use crate::dsl::{parse_program, MusicError};
use crate::music::Music;
use crate::render::{NullRenderer, Renderer};

/// The observable outcome of a successful run.
#[derive(Debug)]
pub struct Execution {
    /// The last printed music value, if the program printed any.
    pub music: Option<Music>,
    /// Scalar lines printed to the diagnostic stream, in order.
    pub printed: Vec<String>,
}

/// Parse, build the AST, and evaluate a program. Printed music values are
/// handed to `renderer` as export JSON; the last one is also returned.
pub fn execute_program_with(
    source: &str,
    renderer: &mut dyn Renderer,
) -> Result<Execution, MusicError> {
    let program = parse_program(source)?;
    let mut interp = Interpreter::new(renderer);
    interp.run(&program)?;
    let (music, printed) = interp.finish();
    Ok(Execution { music, printed })
}

/// [`execute_program_with`] without a visualization sink.
pub fn execute_program(source: &str) -> Result<Execution, MusicError> {
    execute_program_with(source, &mut NullRenderer)
}
