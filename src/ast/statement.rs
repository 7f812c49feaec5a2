use super::{CallExpression, Expression};
use crate::token::Spanned;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Var(Vec<String>),
    Assign(AssignStatement),
    Const(AssignStatement),
    Call(CallExpression),
    Block(BlockStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Return(Spanned<Expression>),
    Break,
    Continue,
    /// Runs in the enclosing scope, without a block of its own.
    Group(Vec<Spanned<Statement>>),
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Var(names) => write!(f, "var [{}]", names.join(" ")),
            Self::Assign(stmt) => write!(f, "as {}", stmt),
            Self::Const(stmt) => write!(f, "const {}", stmt),
            Self::Call(call) => write!(f, "{}", call),
            Self::Block(block) => write!(f, "do {} end", block),
            Self::If(stmt) => write!(f, "{}", stmt),
            Self::While(stmt) => write!(f, "while {} {} end", stmt.condition, stmt.body),
            Self::For(stmt) => write!(
                f,
                "for {} {} {} end",
                stmt.variable, stmt.iterable, stmt.body
            ),
            Self::Return(value) => write!(f, "return {}", value),
            Self::Break => write!(f, "break"),
            Self::Continue => write!(f, "continue"),
            Self::Group(statements) => {
                let rendered: Vec<String> = statements.iter().map(|s| s.to_string()).collect();
                write!(f, "{}", rendered.join(" "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStatement {
    pub name: String,
    pub value: Spanned<Expression>,
}

impl Display for AssignStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Spanned<Statement>>,
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let rendered: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

impl From<Vec<Spanned<Statement>>> for BlockStatement {
    fn from(statements: Vec<Spanned<Statement>>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Spanned<Expression>,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

impl Display for IfStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "if {} {}", self.condition, self.consequence)?;
        if let Some(alt) = &self.alternative {
            write!(f, " else {}", alt)?;
        }
        write!(f, " end")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Spanned<Expression>,
    pub body: BlockStatement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub variable: String,
    pub iterable: Spanned<Expression>,
    pub body: BlockStatement,
}
