//! Runtime values and the object model behind them.
//!
//! Primitives are stored inline. Functions, classes and instances live behind
//! `Rc` so that copying a value copies a reference: two variables holding
//! the same instance see each other's field writes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::error::RuntimeError;
use crate::token::Token;

/// Field name that can never be stored on an instance.
pub const THIS: &str = "this";

/// Name of the method run when a class is called.
pub const INITIALIZER: &str = "init";

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction>),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// `nil` and `false` are falsy, everything else (including `0` and `""`)
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

/// Primitives compare by value without conversion; objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // 2 → "2.0", 0.5 → "0.5"
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(native) => write!(f, "<native fn {}>", native.name),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

/// Host‑provided function. Stateless; never touches the syntax tree.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function or method declared in the program, optionally bound to the
/// instance that `this` refers to inside its body.
#[derive(Clone)]
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub this: Option<Rc<RefCell<Instance>>>,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>) -> Self {
        Self {
            declaration,
            this: None,
        }
    }

    /// Copy of this function with `this` fixed to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Self {
        debug!("Binding method '{}' to instance", self.name());

        Self {
            declaration: Rc::clone(&self.declaration),
            this: Some(instance),
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

// Instances may hold their own bound methods, so the derived form could
// recurse forever.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.declaration.params.len())
            .field("bound", &self.this.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes and instances
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Class {
    pub name: String,
    methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(name: String, methods: HashMap<String, Function>) -> Self {
        Self { name, methods }
    }

    /// Unbound method `name`, if the class declares one.
    pub fn find_method(&self, name: &str) -> Option<&Function> {
        self.methods.get(name)
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Field `name`, otherwise method `name` bound to `instance`.
    ///
    /// Takes the shared handle rather than `&self` because a bound method must
    /// keep the instance alive.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value, RuntimeError> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            let bound: Function = method.bind(Rc::clone(instance));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(RuntimeError::UndefinedProperty {
            instance: format!("{} instance", this.class.name),
            name: name.lexeme.clone(),
            line: name.line,
        })
    }

    pub fn set(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if name.lexeme == THIS {
            return Err(RuntimeError::ReservedProperty {
                name: name.lexeme.clone(),
                line: name.line,
            });
        }

        self.fields.insert(name.lexeme.clone(), value);

        Ok(())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, None, 1)
    }

    fn empty_instance() -> Rc<RefCell<Instance>> {
        let class = Rc::new(Class::new("ABC".into(), HashMap::new()));
        Rc::new(RefCell::new(Instance::new(class)))
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn equality_never_converts() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::from("1"));
        assert_ne!(Value::Bool(true), Value::Number(1.0));
        assert_eq!(Value::Number(3.0), Value::Number(3.0));
    }

    #[test]
    fn number_equality_is_ieee() {
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
    }

    #[test]
    fn number_rendering() {
        assert_eq!(Value::Number(2.0).to_string(), "2.0");
        assert_eq!(Value::Number(-8.0).to_string(), "-8.0");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
    }

    #[test]
    fn get_undefined_property_fails() {
        let instance = empty_instance();

        let err = Instance::get(&instance, &ident("x")).unwrap_err();

        assert!(matches!(err, RuntimeError::UndefinedProperty { .. }));
    }

    #[test]
    fn set_then_get_field() {
        let instance = empty_instance();

        instance
            .borrow_mut()
            .set(&ident("x"), Value::Number(123.0))
            .unwrap();

        assert_eq!(
            Instance::get(&instance, &ident("x")).unwrap(),
            Value::Number(123.0)
        );
    }

    #[test]
    fn this_is_reserved() {
        let instance = empty_instance();

        let err = instance
            .borrow_mut()
            .set(&ident("this"), Value::Number(123.0))
            .unwrap_err();

        assert!(matches!(err, RuntimeError::ReservedProperty { .. }));
    }

    #[test]
    fn instance_renders_with_class_name() {
        let instance = empty_instance();

        assert_eq!(Value::Instance(instance).to_string(), "ABC instance");
    }
}
