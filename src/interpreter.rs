use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::environment::{Environment, SharedEnv};
use crate::error::RuntimeError;
use crate::native;
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, Value, THIS};

/// How a statement finished. `Return` travels outward through blocks and
/// loops until a function call turns it into the call's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,

    /// Value of a `return`, with the line of its keyword.
    Return { value: Value, line: usize },
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// Tree‑walking evaluator.
///
/// Holds the frame currently in effect (the global frame between statements)
/// and the sink that `print` writes to. The last printed raw value is kept for hosts (and tests)
/// that want to observe output without parsing it back.
pub struct Interpreter {
    environment: SharedEnv,
    output: Box<dyn Write>,
    last_printed: Option<Value>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to stdout, with the natives defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to `output`, with the natives defined.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();
        native::install(&mut globals);

        Self {
            environment: globals.into_shared(),
            output,
            last_printed: None,
        }
    }

    /// The frame statements currently execute against.
    pub fn environment(&self) -> SharedEnv {
        Rc::clone(&self.environment)
    }

    /// Raw value of the most recent `print`, `None` before the first one.
    pub fn last_printed(&self) -> Option<&Value> {
        self.last_printed.as_ref()
    }

    /// Interprets a list of statements (a "program").
    ///
    /// A `return` that reaches the program level is a runtime error. Output
    /// printed before any error is flushed either way.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let result: IResult<()> = self.execute_program(statements);

        self.output.flush().map_err(output_error)?;
        result?;

        info!("Interpretation completed successfully");

        Ok(())
    }

    fn execute_program(&mut self, statements: &[Stmt]) -> IResult<()> {
        for stmt in statements {
            if let Flow::Return { value, line } = self.execute(stmt)? {
                debug!("Top-level return with {} on line {}", value, line);

                return Err(RuntimeError::ReturnOutsideFunction { line });
            }
        }

        Ok(())
    }

    /// Run `statements` with `environment` as the current frame, then put the
    /// previous frame back whether they completed, returned or failed.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: SharedEnv) -> IResult<Flow> {
        debug!("Entering block with {} statements", statements.len());

        let previous: SharedEnv = std::mem::replace(&mut self.environment, environment);
        let result: IResult<Flow> = self.execute_all(statements);
        self.environment = previous;

        debug!("Exited block");

        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            if let flow @ Flow::Return { .. } = self.execute(stmt)? {
                return Ok(flow);
            }
        }

        Ok(Flow::Normal)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(output_error)?;
                debug!("Printed value: {}", value);

                self.last_printed = Some(value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame: SharedEnv = Environment::with_enclosing(self.environment()).into_shared();
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return { .. } = self.execute(body)? {
                        return Ok(flow);
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = Function::new(Rc::clone(declaration));
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { keyword, value } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                Ok(Flow::Return {
                    value,
                    line: keyword.line,
                })
            }

            Stmt::Class { name, methods } => {
                debug!("Defining class '{}'", name.lexeme);

                let methods: HashMap<String, Function> = methods
                    .iter()
                    .map(|decl| (decl.name.lexeme.clone(), Function::new(Rc::clone(decl))))
                    .collect();

                let class = Class::new(name.lexeme.clone(), methods);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Class(Rc::new(class)));

                Ok(Flow::Normal)
            }
        }
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let decided: bool = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable(name) => self.environment.borrow().get(&name.lexeme, name.line),

            Expr::Assign { name, value } => {
                let value: Value = self.evaluate(value)?;

                self.environment
                    .borrow_mut()
                    .assign(&name.lexeme, value.clone(), name.line)?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;
                let instance = expect_instance(object, name)?;

                Instance::get(&instance, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;
                let instance = expect_instance(object, name)?;
                let value: Value = self.evaluate(value)?;

                instance.borrow_mut().set(name, value.clone())?;

                Ok(value)
            }

            Expr::This(keyword) => self.environment.borrow().get(THIS, keyword.line),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::type_error(
                    operator.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(RuntimeError::type_error(
                operator.line,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        debug!("Binary {} on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
            _ => {}
        }

        let (a, b) = match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => (*a, *b),
            _ => {
                return Err(RuntimeError::type_error(
                    operator.line,
                    "Operands must be numbers.",
                ))
            }
        };

        match operator.token_type {
            TokenType::PLUS => Ok(Value::Number(a + b)),
            TokenType::MINUS => Ok(Value::Number(a - b)),
            TokenType::STAR => Ok(Value::Number(a * b)),
            TokenType::SLASH => Ok(Value::Number(a / b)),
            TokenType::GREATER => Ok(Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
            TokenType::LESS => Ok(Value::Bool(a < b)),
            TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
            _ => Err(RuntimeError::type_error(
                operator.line,
                format!("Invalid binary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> IResult<Value> {
        let callee: Value = self.evaluate(callee)?;

        let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument)?);
        }

        let Some(callable) = callee.as_callable() else {
            return Err(RuntimeError::NotCallable {
                value: callee.to_string(),
                line: paren.line,
            });
        };

        if values.len() != callable.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: callable.arity(),
                got: values.len(),
                line: paren.line,
            });
        }

        debug!("Calling {} with {} arguments", callee, values.len());

        callable.call(self, values, paren.line)
    }
}

fn expect_instance(object: Value, name: &Token) -> IResult<Rc<RefCell<Instance>>> {
    match object {
        Value::Instance(instance) => Ok(instance),
        other => Err(RuntimeError::NotAnInstance {
            value: other.to_string(),
            line: name.line,
        }),
    }
}

fn output_error(e: io::Error) -> RuntimeError {
    RuntimeError::Output {
        message: e.to_string(),
    }
}
