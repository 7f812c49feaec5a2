use crate::object::{EvalError, Object, Result};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

#[derive(Default)]
struct Frame {
    store: HashMap<String, Object>,
    constants: HashSet<String>,
    outer: Option<Environment>,
    function_boundary: bool,
}

/// A lexical scope. Cloning shares the same frame, which is how closures
/// capture their defining scope.
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn enclosed(outer: &Environment) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            outer: Some(outer.clone()),
            ..Default::default()
        })))
    }

    /// The scope of one function call, a child of the closure's scope.
    pub fn function_scope(closure: &Environment) -> Self {
        let env = Self::enclosed(closure);
        env.0.borrow_mut().function_boundary = true;
        env
    }

    pub fn within_function(&self) -> bool {
        let mut env = Some(self.clone());
        while let Some(current) = env {
            let frame = current.0.borrow();
            if frame.function_boundary {
                return true;
            }
            env = frame.outer.clone();
        }
        false
    }

    /// The nearest scope in the chain that binds `name`.
    fn resolve(&self, name: &str) -> Option<Environment> {
        let mut env = self.clone();
        loop {
            if env.0.borrow().store.contains_key(name) {
                return Some(env);
            }
            let outer = env.0.borrow().outer.clone()?;
            env = outer;
        }
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        let env = self.resolve(name)?;
        let value = env.0.borrow().store.get(name).cloned();
        value
    }

    pub fn is_defined_here(&self, name: &str) -> bool {
        self.0.borrow().store.contains_key(name)
    }

    pub fn define(&self, name: &str, value: Object) -> Result<()> {
        self.bind(name, value, false)
    }

    pub fn define_constant(&self, name: &str, value: Object) -> Result<()> {
        self.bind(name, value, true)
    }

    fn bind(&self, name: &str, value: Object, constant: bool) -> Result<()> {
        let mut frame = self.0.borrow_mut();
        if frame.store.contains_key(name) {
            return Err(EvalError::AlreadyDefined {
                name: name.to_owned(),
            });
        }

        if constant {
            frame.constants.insert(name.to_owned());
        }
        frame.store.insert(name.to_owned(), value);
        Ok(())
    }

    /// The scope a write to `name` lands in. A constant binding is never
    /// written, even when an outer scope holds a variable of the same name.
    fn writable(&self, name: &str) -> Result<Environment> {
        let env = self
            .resolve(name)
            .ok_or_else(|| EvalError::AssignUndefined {
                name: name.to_owned(),
            })?;

        if env.0.borrow().constants.contains(name) {
            return Err(EvalError::AssignConstant {
                name: name.to_owned(),
            });
        }
        Ok(env)
    }

    pub fn check_assignable(&self, name: &str) -> Result<()> {
        self.writable(name).map(|_| ())
    }

    pub fn assign(&self, name: &str, value: Object) -> Result<()> {
        let env = self.writable(name)?;
        env.0.borrow_mut().store.insert(name.to_owned(), value);
        Ok(())
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let frame = self.0.borrow();
        let mut names: Vec<&String> = frame.store.keys().collect();
        names.sort();

        f.debug_struct("Environment")
            .field("names", &names)
            .field("function_boundary", &frame.function_boundary)
            .field("outer", &frame.outer.is_some())
            .finish()
    }
}
