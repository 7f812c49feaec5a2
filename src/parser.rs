use crate::ast::{
    AssignStatement, BlockStatement, CallExpression, Expression, ForStatement, FunctionLiteral,
    IfStatement, Program, Statement, WhileStatement,
};
use crate::token::{Keyword, Spanned, Symbol, Token, TokenType};
use custom_error::custom_error;
use std::iter::Peekable;
use std::rc::Rc;
use std::vec;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub ParseError{line: usize, expected: String, found: String} =
        "Parsing error at line {line}: expected {expected}, got {found}"
}

type Result<T> = std::result::Result<T, ParseError>;

/// Which token closes a statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    End,
    RParen,
}

impl Terminator {
    fn matches(self, token: &Token) -> bool {
        match self {
            Self::End => *token == Token::Keyword(Keyword::End),
            Self::RParen => *token == Token::Symbol(Symbol::RParen),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::End => "`end`",
            Self::RParen => "`)`",
        }
    }
}

pub struct Parser {
    tokens: Peekable<vec::IntoIter<Spanned<Token>>>,
    line: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned<Token>>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
            line: 1,
        }
    }

    pub fn parse_program(mut self) -> Result<Program> {
        let mut program = Program::default();

        while self.tokens.peek().is_some() {
            program.statements.push(self.parse_statement()?);
        }

        Ok(program)
    }

    fn next_token(&mut self, expected: &str) -> Result<Spanned<Token>> {
        match self.tokens.next() {
            Some(token) => {
                self.line = token.line;
                Ok(token)
            }
            None => Err(self.eof_error(expected)),
        }
    }

    fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|token| &token.node)
    }

    fn peek_is(&mut self, token: &Token) -> bool {
        self.peek_token() == Some(token)
    }

    fn eof_error(&self, expected: &str) -> ParseError {
        ParseError {
            line: self.line,
            expected: expected.to_owned(),
            found: "end of input".to_owned(),
        }
    }

    fn unexpected(line: usize, expected: &str, found: &Token) -> ParseError {
        ParseError {
            line,
            expected: expected.to_owned(),
            found: format!("`{}`", found),
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> Result<()> {
        let expected = format!("`{}`", symbol);
        let token = self.next_token(&expected)?;
        if token.node == Token::Symbol(symbol) {
            Ok(())
        } else {
            Err(Self::unexpected(token.line, &expected, &token.node))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        let expected = format!("`{}`", keyword);
        let token = self.next_token(&expected)?;
        if token.node == Token::Keyword(keyword) {
            Ok(())
        } else {
            Err(Self::unexpected(token.line, &expected, &token.node))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let token = self.next_token("identifier")?;
        match token.node {
            Token::Identifier(name) => Ok(name),
            other => Err(Self::unexpected(token.line, "identifier", &other)),
        }
    }

    fn parse_statement(&mut self) -> Result<Spanned<Statement>> {
        let Spanned { node: token, line } = self.next_token("statement")?;

        let statement = match token {
            Token::Keyword(keyword) => self.parse_keyword_statement(keyword, line)?,
            Token::Symbol(Symbol::LParen) => self.parse_parenthesized_statement()?,
            other => return Err(Self::unexpected(line, "statement", &other)),
        };

        Ok(Spanned::new(statement, line))
    }

    fn parse_keyword_statement(&mut self, keyword: Keyword, line: usize) -> Result<Statement> {
        Ok(match keyword {
            Keyword::Var => Statement::Var(self.parse_names()?),
            Keyword::Varas => {
                let assignment = self.parse_assignment()?;
                Statement::Group(vec![
                    Spanned::new(Statement::Var(vec![assignment.name.clone()]), line),
                    Spanned::new(Statement::Assign(assignment), line),
                ])
            }
            Keyword::Const => Statement::Const(self.parse_assignment()?),
            Keyword::As => Statement::Assign(self.parse_assignment()?),
            Keyword::Return => Statement::Return(self.parse_expression()?),
            Keyword::Exit => Statement::Return(Spanned::new(Expression::Nil, line)),
            Keyword::Break => Statement::Break,
            Keyword::Continue => Statement::Continue,
            Keyword::Do => Statement::Block(self.parse_block(Terminator::End)?),
            Keyword::If => self.parse_if()?,
            Keyword::While => {
                let condition = self.parse_expression()?;
                let body = self.parse_block(Terminator::End)?;
                Statement::While(WhileStatement { condition, body })
            }
            Keyword::For => self.parse_for(line)?,
            Keyword::Function => {
                let name = self.expect_identifier()?;
                let func = self.parse_function_literal(Terminator::End)?;
                Statement::Const(AssignStatement {
                    name,
                    value: Spanned::new(Expression::Function(func), line),
                })
            }
            other => return Err(Self::unexpected(line, "statement", &Token::Keyword(other))),
        })
    }

    /// After `(` in statement position: either a call, or a keyword
    /// statement wrapped in parentheses such as `(return x)`.
    fn parse_parenthesized_statement(&mut self) -> Result<Statement> {
        let keyword = match self.peek_token() {
            Some(Token::Keyword(keyword)) if keyword.starts_statement() => Some(*keyword),
            _ => None,
        };

        match keyword {
            Some(keyword) => {
                let token = self.next_token("statement")?;
                let statement = self.parse_keyword_statement(keyword, token.line)?;
                self.expect_symbol(Symbol::RParen)?;
                Ok(statement)
            }
            None => Ok(Statement::Call(self.parse_call()?)),
        }
    }

    fn parse_assignment(&mut self) -> Result<AssignStatement> {
        let name = self.expect_identifier()?;
        let value = self.parse_expression()?;
        Ok(AssignStatement { name, value })
    }

    /// `var x`, `var x y z` or `var [x y z]`.
    fn parse_names(&mut self) -> Result<Vec<String>> {
        if self.peek_is(&Token::Symbol(Symbol::LBracket)) {
            return self.parse_parameters();
        }

        let mut names = vec![self.expect_identifier()?];
        while self.peek_token().map_or(false, |token| token.is(TokenType::Identifier)) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    fn parse_parameters(&mut self) -> Result<Vec<String>> {
        self.expect_symbol(Symbol::LBracket)?;

        let mut names = vec![];
        loop {
            let token = self.next_token("identifier or `]`")?;
            match token.node {
                Token::Identifier(name) => names.push(name),
                Token::Symbol(Symbol::RBracket) => break,
                other => return Err(Self::unexpected(token.line, "identifier or `]`", &other)),
            }
        }
        Ok(names)
    }

    /// Statements up to, but not including, anything `is_terminator` accepts.
    fn parse_statements_until<F>(&mut self, expected: &str, is_terminator: F) -> Result<BlockStatement>
    where
        F: Fn(&Token) -> bool,
    {
        let mut block = BlockStatement::default();
        loop {
            match self.peek_token() {
                None => return Err(self.eof_error(expected)),
                Some(token) if is_terminator(token) => return Ok(block),
                Some(_) => block.statements.push(self.parse_statement()?),
            }
        }
    }

    fn parse_block(&mut self, terminator: Terminator) -> Result<BlockStatement> {
        let block =
            self.parse_statements_until(terminator.describe(), |token| terminator.matches(token))?;
        self.next_token(terminator.describe())?;
        Ok(block)
    }

    /// Everything after `if`, up to and including the `end` that closes the
    /// whole chain. `elif` nests a fresh `if` inside the else branch.
    fn parse_if(&mut self) -> Result<Statement> {
        let condition = self.parse_expression()?;
        let consequence = self.parse_statements_until("`end`, `else` or `elif`", |token| {
            matches!(
                token,
                Token::Keyword(Keyword::End) | Token::Keyword(Keyword::Else) | Token::Keyword(Keyword::Elif)
            )
        })?;

        let token = self.next_token("`end`, `else` or `elif`")?;
        let alternative = match token.node {
            Token::Keyword(Keyword::End) => None,
            Token::Keyword(Keyword::Else) => Some(self.parse_block(Terminator::End)?),
            Token::Keyword(Keyword::Elif) => {
                let nested = self.parse_if()?;
                Some(BlockStatement::from(vec![Spanned::new(nested, token.line)]))
            }
            other => return Err(Self::unexpected(token.line, "`end`", &other)),
        };

        Ok(Statement::If(IfStatement {
            condition,
            consequence,
            alternative,
        }))
    }

    /// `for [var] name iterable ... end`; the `var` form defines the loop
    /// variable in the enclosing scope first.
    fn parse_for(&mut self, line: usize) -> Result<Statement> {
        let define = self.peek_is(&Token::Keyword(Keyword::Var));
        if define {
            self.expect_keyword(Keyword::Var)?;
        }

        let variable = self.expect_identifier()?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block(Terminator::End)?;

        let for_loop = Statement::For(ForStatement {
            variable: variable.clone(),
            iterable,
            body,
        });

        Ok(if define {
            Statement::Group(vec![
                Spanned::new(Statement::Var(vec![variable]), line),
                Spanned::new(for_loop, line),
            ])
        } else {
            for_loop
        })
    }

    fn parse_function_literal(&mut self, terminator: Terminator) -> Result<FunctionLiteral> {
        let parameters = self.parse_parameters()?;
        let body = self.parse_block(terminator)?;
        Ok(FunctionLiteral {
            parameters: Rc::from(parameters),
            body: Rc::new(body),
        })
    }

    /// After `(` in expression position, when `func` follows. `(func [p] ... )`
    /// is the literal itself; `(func [p] ... end args...)` calls it.
    fn parse_parenthesized_func(&mut self) -> Result<Expression> {
        let func = self.next_token("`func`")?;
        let parameters = self.parse_parameters()?;
        let body = self.parse_statements_until("`end` or `)`", |token| {
            Terminator::End.matches(token) || Terminator::RParen.matches(token)
        })?;
        let literal = Expression::Function(FunctionLiteral {
            parameters: Rc::from(parameters),
            body: Rc::new(body),
        });

        let terminator = self.next_token("`end` or `)`")?;
        if terminator.node == Token::Symbol(Symbol::RParen) {
            return Ok(literal);
        }
        let call = self.parse_arguments(Spanned::new(literal, func.line))?;
        Ok(Expression::Call(call))
    }

    /// `\[params] expr`, sugar for a function returning `expr`.
    fn parse_lambda(&mut self, line: usize) -> Result<FunctionLiteral> {
        let parameters = self.parse_parameters()?;
        let value = self.parse_expression()?;
        let body = BlockStatement::from(vec![Spanned::new(Statement::Return(value), line)]);
        Ok(FunctionLiteral {
            parameters: Rc::from(parameters),
            body: Rc::new(body),
        })
    }

    /// Everything after the opening `(` of a call.
    fn parse_call(&mut self) -> Result<CallExpression> {
        let function = self.parse_expression()?;
        self.parse_arguments(function)
    }

    /// Arguments up to and including the `)` that closes a call.
    fn parse_arguments(&mut self, function: Spanned<Expression>) -> Result<CallExpression> {
        let mut arguments = vec![];
        loop {
            match self.peek_token() {
                None => return Err(self.eof_error("`)`")),
                Some(Token::Symbol(Symbol::RParen)) => {
                    self.next_token("`)`")?;
                    break;
                }
                Some(_) => arguments.push(self.parse_expression()?),
            }
        }

        Ok(CallExpression {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_expression(&mut self) -> Result<Spanned<Expression>> {
        let Spanned { node: token, line } = self.next_token("expression")?;

        let expression = match token {
            Token::Keyword(Keyword::Nil) => Expression::Nil,
            Token::Keyword(Keyword::True) => Expression::Boolean(true),
            Token::Keyword(Keyword::False) => Expression::Boolean(false),
            Token::Keyword(Keyword::Func) => {
                Expression::Function(self.parse_function_literal(Terminator::End)?)
            }
            Token::Identifier(name) => Expression::Identifier(name),
            Token::Int(n) => Expression::Integer(n),
            Token::Float(n) => Expression::Float(n),
            Token::String(s) => Expression::String(Rc::from(s)),
            Token::Symbol(Symbol::LParen) => {
                if self.peek_is(&Token::Keyword(Keyword::Func)) {
                    self.parse_parenthesized_func()?
                } else {
                    Expression::Call(self.parse_call()?)
                }
            }
            Token::Symbol(Symbol::Backslash) => Expression::Function(self.parse_lambda(line)?),
            other => return Err(Self::unexpected(line, "expression", &other)),
        };

        Ok(Spanned::new(expression, line))
    }
}
