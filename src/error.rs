//! Centralised error hierarchy for the **treelox interpreter**.
//!
//! Every phase converts its failure modes into one of the variants defined
//! here: the scanner and parser produce [`LoxError::Lex`] / [`LoxError::Parse`]
//! and the evaluator produces a [`RuntimeError`], which is wrapped into
//! [`LoxError::Runtime`] at the pipeline boundary.
//!
//! The module **does not** print diagnostics itself.

use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }
}

/// Failures raised while evaluating a program.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum RuntimeError {
    /// An operand had the wrong type for its operator.
    #[error("[line {line}] Runtime error: {message}")]
    Type { message: String, line: usize },

    /// Read or assignment of a name no frame defines.
    #[error("[line {line}] Runtime error: Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    /// Call expression whose callee is not a function or class.
    #[error("[line {line}] Runtime error: {value} is not callable.")]
    NotCallable { value: String, line: usize },

    #[error("[line {line}] Runtime error: Expected {expected} arguments but got {got}.")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    /// Property access or assignment on a value that is not an instance.
    #[error("[line {line}] Runtime error: {value} is not an instance of a class.")]
    NotAnInstance { value: String, line: usize },

    #[error("[line {line}] Runtime error: Undefined property '{name}' on {instance}.")]
    UndefinedProperty {
        instance: String,
        name: String,
        line: usize,
    },

    /// Attempt to store a field under a reserved name (`this`).
    #[error("[line {line}] Runtime error: Property can't be named '{name}'.")]
    ReservedProperty { name: String, line: usize },

    /// `init` produced something other than nil.
    #[error("[line {line}] Runtime error: init of class {class} must return nil.")]
    InvalidConstructorReturn { class: String, line: usize },

    /// A `return` executed outside any function body.
    #[error("[line {line}] Runtime error: Can't return from top-level code.")]
    ReturnOutsideFunction { line: usize },

    /// The print sink refused a write.
    #[error("Runtime error: failed to write output: {message}")]
    Output { message: String },
}

impl RuntimeError {
    pub fn type_error<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::Type {
            message: msg.into(),
            line,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
