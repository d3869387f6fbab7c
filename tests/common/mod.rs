#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use treelox::driver;
use treelox::error::{LoxError, RuntimeError};
use treelox::interpreter::Interpreter;
use treelox::value::Value;

/// `Write` sink whose bytes stay readable after the interpreter takes it.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What a finished program left behind.
pub struct Outcome {
    pub output: String,
    pub last: Option<Value>,
}

pub fn capturing_interpreter() -> (Interpreter, Capture) {
    let capture = Capture::default();
    let interpreter = Interpreter::with_output(Box::new(capture.clone()));
    (interpreter, capture)
}

pub fn run(source: &str) -> Result<Outcome, LoxError> {
    let (mut interpreter, capture) = capturing_interpreter();

    driver::run(source, &mut interpreter)?;

    Ok(Outcome {
        output: capture.text(),
        last: interpreter.last_printed().cloned(),
    })
}

pub fn run_ok(source: &str) -> Outcome {
    match run(source) {
        Ok(outcome) => outcome,
        Err(e) => panic!("program failed: {}\n--- source ---\n{}", e, source),
    }
}

/// Raw value of the last `print`.
pub fn last_printed(source: &str) -> Value {
    run_ok(source)
        .last
        .unwrap_or_else(|| panic!("program printed nothing:\n{}", source))
}

pub fn runtime_error(source: &str) -> RuntimeError {
    match run(source) {
        Err(LoxError::Runtime(e)) => e,
        Err(other) => panic!("expected a runtime error, got: {}", other),
        Ok(outcome) => panic!(
            "expected a runtime error, program printed: {:?}",
            outcome.output
        ),
    }
}
