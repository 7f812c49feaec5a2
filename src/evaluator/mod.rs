#[cfg(test)]
mod test;

use crate::ast::{BlockStatement, CallExpression, Expression, ForStatement, Program, Statement};
use crate::builtins::{Builtin, Console, BUILTINS};
use crate::environment::Environment;
use crate::lexer::Lexer;
use crate::object::{EvalError, FunctionObject, Object, RuntimeError, SpecialForm};
use crate::parser::Parser;
use crate::token::Spanned;
use crate::Error;
use std::rc::Rc;
use strum::IntoEnumIterator;

type Result<T> = std::result::Result<T, RuntimeError>;

/// How a statement finished. Anything but `Normal` skips the remaining
/// statements of every enclosing block until a loop or a call consumes it.
#[derive(Debug, Clone, PartialEq)]
enum Signal {
    Normal,
    Break(usize),
    Continue(usize),
    Return(usize, Object),
}

fn at(line: usize) -> impl Fn(EvalError) -> RuntimeError {
    move |error| RuntimeError::new(line, error)
}

fn illegal(line: usize, statement: &'static str, context: &'static str) -> RuntimeError {
    RuntimeError::new(line, EvalError::IllegalStatement { statement, context })
}

/// Outcome of one loop iteration's body.
enum Iteration {
    Next,
    Stop,
    Propagate(Signal),
}

impl From<Signal> for Iteration {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Normal | Signal::Continue(_) => Self::Next,
            Signal::Break(_) => Self::Stop,
            signal @ Signal::Return(..) => Self::Propagate(signal),
        }
    }
}

pub struct Evaluator {
    globals: Environment,
    console: Console,
    loading_stdlib: bool,
}

impl Evaluator {
    /// A fresh global scope holding the special forms and every native
    /// function as constants.
    pub fn new(console: Console) -> Self {
        let globals = Environment::new();

        // Special form and native names are all distinct, so none of these
        // definitions can collide in the fresh scope.
        for form in SpecialForm::iter() {
            let _ = globals.define_constant(&form.to_string(), Object::Special(form));
        }
        for (&name, &func) in BUILTINS.iter() {
            let _ = globals.define_constant(name, Object::Builtin(Builtin { name, func }));
        }

        Self {
            globals,
            console,
            loading_stdlib: false,
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Runs a library unit in the global scope. Every function it creates is
    /// marked as library code.
    pub fn load_stdlib(&mut self, source: &str) -> std::result::Result<(), Error> {
        let tokens = Lexer::new(source.to_owned()).tokenize()?;
        let program = Parser::new(tokens).parse_program()?;

        self.loading_stdlib = true;
        let result = self.execute(&program);
        self.loading_stdlib = false;

        Ok(result?)
    }

    pub fn execute(&mut self, program: &Program) -> Result<()> {
        let env = self.globals.clone();

        match self.exec_statements(&program.statements, &env)? {
            Signal::Normal => Ok(()),
            Signal::Break(line) => Err(illegal(line, "break", "inside a loop")),
            Signal::Continue(line) => Err(illegal(line, "continue", "inside a loop")),
            Signal::Return(line, _) => Err(illegal(line, "return", "in functions")),
        }
    }

    fn exec_statements(
        &mut self,
        statements: &[Spanned<Statement>],
        env: &Environment,
    ) -> Result<Signal> {
        for statement in statements.iter() {
            match self.exec_statement(statement, env)? {
                Signal::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Signal::Normal)
    }

    /// Runs a block in its own child scope.
    fn exec_block(&mut self, block: &BlockStatement, env: &Environment) -> Result<Signal> {
        self.exec_statements(&block.statements, &Environment::enclosed(env))
    }

    fn exec_statement(&mut self, statement: &Spanned<Statement>, env: &Environment) -> Result<Signal> {
        let line = statement.line;

        match &statement.node {
            Statement::Var(names) => {
                for name in names.iter() {
                    env.define(name, Object::Nil).map_err(at(line))?;
                }
            }
            Statement::Assign(assign) => {
                env.check_assignable(&assign.name).map_err(at(line))?;
                let value = self.eval_expression(&assign.value, env)?;
                env.assign(&assign.name, value).map_err(at(line))?;
            }
            Statement::Const(constant) => {
                if env.is_defined_here(&constant.name) {
                    return Err(RuntimeError::new(
                        line,
                        EvalError::AlreadyDefined {
                            name: constant.name.clone(),
                        },
                    ));
                }
                let value = self.eval_expression(&constant.value, env)?;
                env.define_constant(&constant.name, value).map_err(at(line))?;
            }
            Statement::Call(call) => {
                self.eval_call(call, line, env)?;
            }
            Statement::Block(block) => return self.exec_block(block, env),
            Statement::If(stmt) => {
                let condition = self.eval_expression(&stmt.condition, env)?;
                if condition.truth_value() {
                    return self.exec_block(&stmt.consequence, env);
                } else if let Some(alternative) = &stmt.alternative {
                    return self.exec_block(alternative, env);
                }
            }
            Statement::While(stmt) => {
                while self.eval_expression(&stmt.condition, env)?.truth_value() {
                    match Iteration::from(self.exec_block(&stmt.body, env)?) {
                        Iteration::Next => {}
                        Iteration::Stop => break,
                        Iteration::Propagate(signal) => return Ok(signal),
                    }
                }
            }
            Statement::For(stmt) => return self.exec_for(stmt, line, env),
            Statement::Return(value) => {
                if !env.within_function() {
                    return Err(illegal(line, "return", "in functions"));
                }
                let value = self.eval_expression(value, env)?;
                return Ok(Signal::Return(line, value));
            }
            Statement::Break => return Ok(Signal::Break(line)),
            Statement::Continue => return Ok(Signal::Continue(line)),
            Statement::Group(statements) => return self.exec_statements(statements, env),
        }

        Ok(Signal::Normal)
    }

    /// Lists and dict keys are iterated over a snapshot taken when the loop
    /// starts, so the body may mutate the collection.
    fn exec_for(&mut self, stmt: &ForStatement, line: usize, env: &Environment) -> Result<Signal> {
        if env.get(&stmt.variable).is_none() {
            return Err(RuntimeError::new(
                line,
                EvalError::UndeclaredLoopVariable {
                    name: stmt.variable.clone(),
                },
            ));
        }

        let iterable = self.eval_expression(&stmt.iterable, env)?;
        let items: Box<dyn Iterator<Item = Object>> = match &iterable {
            Object::List(list) => Box::new(list.borrow().clone().into_iter()),
            Object::Dict(dict) => {
                let keys: Vec<Object> = dict.borrow().keys().cloned().collect();
                Box::new(keys.into_iter())
            }
            Object::Range(range) => Box::new(range.iter().map(Object::from)),
            other => {
                return Err(RuntimeError::new(
                    line,
                    EvalError::NotIterable {
                        type_name: other.type_name(),
                    },
                ))
            }
        };

        for item in items {
            env.assign(&stmt.variable, item).map_err(at(line))?;
            match Iteration::from(self.exec_block(&stmt.body, env)?) {
                Iteration::Next => {}
                Iteration::Stop => break,
                Iteration::Propagate(signal) => return Ok(signal),
            }
        }

        Ok(Signal::Normal)
    }

    fn eval_expression(&mut self, expression: &Spanned<Expression>, env: &Environment) -> Result<Object> {
        let line = expression.line;

        Ok(match &expression.node {
            Expression::Nil => Object::Nil,
            Expression::Integer(n) => Object::Integer(*n),
            Expression::Float(n) => Object::Float(*n),
            Expression::Boolean(b) => Object::Boolean(*b),
            Expression::String(s) => Object::String(s.clone()),
            Expression::Identifier(name) => env.get(name).ok_or_else(|| {
                RuntimeError::new(line, EvalError::Undefined { name: name.clone() })
            })?,
            Expression::Call(call) => self.eval_call(call, line, env)?,
            Expression::Function(literal) => Object::Function(Rc::new(FunctionObject {
                parameters: literal.parameters.clone(),
                body: literal.body.clone(),
                env: env.clone(),
                stdlib: self.loading_stdlib,
            })),
        })
    }

    fn eval_arguments(
        &mut self,
        arguments: &[Spanned<Expression>],
        env: &Environment,
    ) -> Result<Vec<Object>> {
        arguments
            .iter()
            .map(|argument| self.eval_expression(argument, env))
            .collect()
    }

    fn eval_call(&mut self, call: &CallExpression, line: usize, env: &Environment) -> Result<Object> {
        match self.eval_expression(&call.function, env)? {
            Object::Special(form) => self.eval_special_form(form, &call.arguments, line, env),
            Object::Builtin(builtin) => {
                let arguments = self.eval_arguments(&call.arguments, env)?;
                (builtin.func)(&mut self.console, arguments).map_err(at(line))
            }
            Object::Function(function) => self.call_function(&function, &call.arguments, line, env),
            other => Err(RuntimeError::new(
                line,
                EvalError::NotAFunction {
                    type_name: other.type_name(),
                },
            )),
        }
    }

    fn eval_special_form(
        &mut self,
        form: SpecialForm,
        arguments: &[Spanned<Expression>],
        line: usize,
        env: &Environment,
    ) -> Result<Object> {
        match form {
            SpecialForm::And => {
                for argument in arguments.iter() {
                    if !self.eval_expression(argument, env)?.truth_value() {
                        return Ok(false.into());
                    }
                }
                Ok(true.into())
            }
            SpecialForm::Or => {
                for argument in arguments.iter() {
                    if self.eval_expression(argument, env)?.truth_value() {
                        return Ok(true.into());
                    }
                }
                Ok(false.into())
            }
            SpecialForm::Choice => match arguments {
                [condition, when_true, when_false] => {
                    if self.eval_expression(condition, env)?.truth_value() {
                        self.eval_expression(when_true, env)
                    } else {
                        self.eval_expression(when_false, env)
                    }
                }
                _ => Err(RuntimeError::new(line, EvalError::arity(3, arguments.len()))),
            },
        }
    }

    /// Arguments are evaluated in the caller's scope; the body runs directly
    /// in a new scope under the closure's captured one.
    fn call_function(
        &mut self,
        function: &FunctionObject,
        arguments: &[Spanned<Expression>],
        line: usize,
        env: &Environment,
    ) -> Result<Object> {
        if function.parameters.len() != arguments.len() {
            return Err(RuntimeError::new(
                line,
                EvalError::arity(function.parameters.len(), arguments.len()),
            ));
        }

        let scope = Environment::function_scope(&function.env);
        for (parameter, argument) in function.parameters.iter().zip(arguments.iter()) {
            let value = self.eval_expression(argument, env)?;
            scope.define(parameter, value).map_err(|_| {
                RuntimeError::new(
                    line,
                    EvalError::WrongArgument {
                        message: format!("parameter {} is declared more than once", parameter),
                    },
                )
            })?;
        }

        let result = match self.exec_statements(&function.body.statements, &scope) {
            Ok(Signal::Normal) => Ok(Object::Nil),
            Ok(Signal::Return(_, value)) => Ok(value),
            Ok(Signal::Break(inner)) => Err(illegal(inner, "break", "inside a loop")),
            Ok(Signal::Continue(inner)) => Err(illegal(inner, "continue", "inside a loop")),
            Err(error) => Err(error),
        };

        // Errors never point into the standard library's own source.
        result.map_err(|mut error| {
            if function.stdlib {
                error.line = line;
            }
            error
        })
    }
}
