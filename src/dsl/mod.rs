//! Language front end — source text → tokens → typed AST.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::{ErrorKind, MusicError};

use ast::CommandSeq;
use lexer::Lexer;
use parser::Parser;

/// Parse source text into a program AST.
pub fn parse_program(source: &str) -> Result<CommandSeq, MusicError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}
