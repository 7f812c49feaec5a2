use super::statement::BlockStatement;
use crate::token::{escape, Spanned};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Nil,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(Rc<str>),
    Identifier(String),
    Call(CallExpression),
    Function(FunctionLiteral),
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{:?}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "\"{}\"", escape(s)),
            Self::Identifier(name) => write!(f, "{}", name),
            Self::Call(call) => write!(f, "{}", call),
            Self::Function(func) => write!(f, "{}", func),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub function: Box<Spanned<Expression>>,
    pub arguments: Vec<Spanned<Expression>>,
}

impl Display for CallExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({}", self.function)?;
        for argument in self.arguments.iter() {
            write!(f, " {}", argument)?;
        }
        write!(f, ")")
    }
}

/// Parameters and body are shared with every closure created from this
/// literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub parameters: Rc<[String]>,
    pub body: Rc<BlockStatement>,
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "func [{}] {} end", self.parameters.join(" "), self.body)
    }
}
