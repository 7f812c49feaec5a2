mod expression;
mod statement;
pub use expression::*;
pub use statement::*;

use crate::token::Spanned;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Spanned<Statement>>,
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        for stmt in self.statements.iter() {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
