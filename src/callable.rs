//! The call protocol shared by native functions, user functions and classes.
//!
//! The interpreter checks the argument count against [`Callable::arity`]
//! before calling, so implementations can index `arguments` freely.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Flow, Interpreter};
use crate::value::{Class, Function, Instance, NativeFunction, Value, INITIALIZER, THIS};

pub trait Callable {
    /// Number of arguments the callee expects.
    fn arity(&self) -> usize;

    /// Run the callee. `line` is the call site, used for diagnostics.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError>;
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// The call frame's parent is the environment that is current when the
    /// call happens, not the one the function was declared in.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling user-defined function '{}'", self.name());

        let mut frame = Environment::with_enclosing(interpreter.environment());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            frame.define(&param.lexeme, argument);
        }

        if let Some(instance) = &self.this {
            frame.define(THIS, Value::Instance(Rc::clone(instance)));
        }

        match interpreter.execute_block(&self.declaration.body, frame.into_shared())? {
            Flow::Return { value, .. } => {
                info!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }

            Flow::Normal => Ok(Value::Nil),
        }
    }
}

/// Implemented on the shared handle because each instance keeps a reference
/// to its class.
impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |init| init.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(init) = self.find_method(INITIALIZER) {
            let returned: Value = init
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments, line)?;

            if returned != Value::Nil {
                return Err(RuntimeError::InvalidConstructorReturn {
                    class: self.name.clone(),
                    line,
                });
            }
        }

        Ok(Value::Instance(instance))
    }
}

impl Value {
    /// View this value through the call protocol, if it supports it.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::NativeFunction(native) => Some(&**native),
            Value::Function(function) => Some(&**function),
            Value::Class(class) => Some(class),
            _ => None,
        }
    }
}
