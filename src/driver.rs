//! Scan → parse → evaluate, with each phase's failure stopping the pipeline.
//!
//! Scan errors do not stop the scanner, but if any were recorded the program
//! is not parsed; the first one is returned and the rest are logged. Parse
//! and runtime errors stop their phase at the first fault.

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::token::Token;

/// Tokens for `source`, or the first scan error.
pub fn scan(source: &str) -> Result<Vec<Token>> {
    let (tokens, errors) = Scanner::new(source).into_parts();

    let mut errors = errors.into_iter();

    if let Some(first) = errors.next() {
        for other in errors {
            debug!("Additional scan error: {}", other);
        }

        return Err(first);
    }

    Ok(tokens)
}

/// Scan and parse `source` into a program.
pub fn parse(source: &str) -> Result<Vec<Stmt>> {
    let tokens: Vec<Token> = scan(source)?;

    Parser::new(&tokens).parse()
}

/// Run `source` to completion on `interpreter`.
///
/// Globals defined by earlier runs on the same interpreter stay visible.
pub fn run(source: &str, interpreter: &mut Interpreter) -> Result<()> {
    info!("Running {} bytes of source", source.len());

    let statements: Vec<Stmt> = parse(source)?;

    interpreter.interpret(&statements)?;

    Ok(())
}
