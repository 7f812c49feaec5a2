use crate::ast::BlockStatement;
use crate::builtins::Builtin;
use crate::environment::Environment;
use std::cell::RefCell;
use std::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;
use strum_macros::{Display, EnumIter};

mod eval_error;
pub use eval_error::{EvalError, RuntimeError};

mod dict;
pub use dict::Dict;

pub type Result<T> = std::result::Result<T, EvalError>;

/// A runtime value.
///
/// `List` and `Dict` are shared by reference: cloning the `Object` aliases
/// the same backing collection. Every other variant is a plain value.
/// Numbers and booleans live inline, so there is nothing to intern;
/// string constants share the `Rc<str>` held by the syntax tree.
#[derive(Debug, Clone)]
pub enum Object {
    Nil,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(Rc<str>),
    List(Rc<RefCell<Vec<Object>>>),
    Dict(Rc<RefCell<Dict>>),
    Range(RangeValue),
    Function(Rc<FunctionObject>),
    Builtin(Builtin),
    Special(SpecialForm),
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{:?}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "{}", s),
            Self::List(list) => {
                let elements: Vec<String> = list.borrow().iter().map(Object::to_string).collect();

                write!(f, "[{}]", elements.join(", "))
            }
            Self::Dict(dict) => write!(f, "{}", dict.borrow()),
            Self::Range(range) => write!(f, "{}", range),
            Self::Function(_) | Self::Builtin(_) | Self::Special(_) => write!(f, "<func>"),
        }
    }
}

/// Structural equality. Numbers of different kinds are never equal, lists
/// compare element-wise, dicts compare as maps, and functions compare by
/// identity.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Dict(a), Self::Dict(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Range(a), Self::Range(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Special(a), Self::Special(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::Nil
    }
}

impl From<i64> for Object {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Object {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<Vec<Object>> for Object {
    fn from(a: Vec<Object>) -> Self {
        Self::list(a)
    }
}

impl From<Dict> for Object {
    fn from(d: Dict) -> Self {
        Self::Dict(Rc::new(RefCell::new(d)))
    }
}

impl From<RangeValue> for Object {
    fn from(r: RangeValue) -> Self {
        Self::Range(r)
    }
}

impl Object {
    /// A fresh list, not aliased with anything else.
    pub fn list(elements: Vec<Object>) -> Self {
        Self::List(Rc::new(RefCell::new(elements)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Integer(_) => "Int",
            Self::Float(_) => "Float",
            Self::Boolean(_) => "Bool",
            Self::String(_) => "String",
            Self::List(_) => "List",
            Self::Dict(_) => "Dict",
            Self::Range(_) => "Range",
            Self::Function(_) | Self::Builtin(_) | Self::Special(_) => "Func",
        }
    }

    pub fn truth_value(&self) -> bool {
        !matches!(self, Self::Nil | Self::Boolean(false))
    }

    /// Reference identity for lists and dicts, structural equality for
    /// everything else.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Dict(a), Self::Dict(b)) => Rc::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }
}

/// An inclusive arithmetic sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        Self { start, end, step }
    }

    pub fn iter(&self) -> RangeIter {
        RangeIter {
            next: Some(self.start),
            range: *self,
        }
    }

    /// True when `n` is one of the values the range iterates over.
    pub fn contains(&self, n: i64) -> bool {
        let in_bounds = if self.step > 0 {
            self.start <= n && n <= self.end
        } else if self.step < 0 {
            self.end <= n && n <= self.start
        } else {
            false
        };

        in_bounds && (i128::from(n) - i128::from(self.start)) % i128::from(self.step) == 0
    }
}

impl Display for RangeValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "<range {} {} {}>", self.start, self.end, self.step)
    }
}

pub struct RangeIter {
    next: Option<i64>,
    range: RangeValue,
}

impl Iterator for RangeIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.next?;
        let RangeValue { end, step, .. } = self.range;

        let within = (step > 0 && current <= end) || (step < 0 && current >= end);
        if !within {
            self.next = None;
            return None;
        }

        self.next = current.checked_add(step);
        Some(current)
    }
}

/// A closure: the function literal plus the scope it was created in.
pub struct FunctionObject {
    pub parameters: Rc<[String]>,
    pub body: Rc<BlockStatement>,
    pub env: Environment,
    /// Created while loading the standard library.
    pub stdlib: bool,
}

impl Debug for FunctionObject {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("FunctionObject")
            .field("parameters", &self.parameters)
            .field("stdlib", &self.stdlib)
            .finish()
    }
}

/// Call forms that receive their arguments unevaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum SpecialForm {
    #[strum(to_string = "and")]
    And,
    #[strum(to_string = "or")]
    Or,
    #[strum(to_string = "choice")]
    Choice,
}
