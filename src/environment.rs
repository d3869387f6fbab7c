use crate::error::RuntimeError;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame. Closures, child scopes and the interpreter
/// all hold one of these, so a frame lives as long as anything points at it.
pub type SharedEnv = Rc<RefCell<Environment>>;

/// One scope frame: its own bindings plus an optional link to the frame it
/// was created in. Lookups walk the links outward to the global frame.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnv>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: SharedEnv) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a [`SharedEnv`].
    pub fn into_shared(self) -> SharedEnv {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this frame, replacing any earlier binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }

    /// Overwrite the nearest existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_to_enclosing_frame() {
        let global: SharedEnv = Environment::new().into_shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(global.clone());

        assert_eq!(inner.get("a", 1), Ok(Value::Number(1.0)));
    }

    #[test]
    fn define_shadows_only_in_own_frame() {
        let global: SharedEnv = Environment::new().into_shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(global.clone());
        inner.define("a", Value::Number(2.0));

        assert_eq!(inner.get("a", 1), Ok(Value::Number(2.0)));
        assert_eq!(global.borrow().get("a", 1), Ok(Value::Number(1.0)));
    }

    #[test]
    fn redefine_in_same_frame_overwrites() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Bool(true));

        assert_eq!(env.get("a", 1), Ok(Value::Bool(true)));
    }

    #[test]
    fn assign_mutates_nearest_defining_frame() {
        let global: SharedEnv = Environment::new().into_shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(global.clone());
        inner.assign("a", Value::Number(5.0), 1).unwrap();

        assert_eq!(global.borrow().get("a", 1), Ok(Value::Number(5.0)));
    }

    #[test]
    fn assign_never_creates_binding() {
        let mut env = Environment::new();

        let err = env.assign("missing", Value::Nil, 7).unwrap_err();

        assert_eq!(
            err,
            RuntimeError::UndefinedVariable {
                name: "missing".into(),
                line: 7
            }
        );
        assert!(env.get("missing", 7).is_err());
    }
}
