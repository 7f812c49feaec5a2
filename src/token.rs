use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumString};

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(derive(Hash, Display))]
#[strum_discriminants(name(TokenType))]
pub enum Token {
    Identifier(String),
    Int(i64),
    Float(f64),
    String(String),
    Symbol(Symbol),
    Keyword(Keyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum Symbol {
    #[strum(to_string = "(")]
    LParen,
    #[strum(to_string = ")")]
    RParen,
    #[strum(to_string = "[")]
    LBracket,
    #[strum(to_string = "]")]
    RBracket,
    #[strum(to_string = "\\")]
    Backslash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Keyword {
    #[strum(to_string = "var")]
    Var,
    #[strum(to_string = "varas")]
    Varas,
    #[strum(to_string = "const")]
    Const,
    #[strum(to_string = "as")]
    As,
    #[strum(to_string = "return")]
    Return,
    #[strum(to_string = "exit")]
    Exit,
    #[strum(to_string = "break")]
    Break,
    #[strum(to_string = "continue")]
    Continue,
    #[strum(to_string = "do")]
    Do,
    #[strum(to_string = "end")]
    End,
    #[strum(to_string = "if")]
    If,
    #[strum(to_string = "else")]
    Else,
    #[strum(to_string = "elif")]
    Elif,
    #[strum(to_string = "while")]
    While,
    #[strum(to_string = "for")]
    For,
    #[strum(to_string = "func")]
    Func,
    #[strum(to_string = "function")]
    Function,
    #[strum(to_string = "nil")]
    Nil,
    #[strum(to_string = "true")]
    True,
    #[strum(to_string = "false")]
    False,
}

impl Keyword {
    /// Keywords that may open a statement, and therefore a parenthesised
    /// statement such as `(return x)`.
    pub fn starts_statement(self) -> bool {
        !matches!(
            self,
            Self::Func | Self::Nil | Self::True | Self::False | Self::End | Self::Else | Self::Elif
        )
    }
}

impl From<String> for Token {
    fn from(text: String) -> Self {
        match Keyword::from_str(&text) {
            Ok(keyword) => Self::Keyword(keyword),
            Err(_) => Self::Identifier(text),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "{}", name),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{:?}", n),
            Self::String(s) => write!(f, "\"{}\"", escape(s)),
            Self::Symbol(symbol) => write!(f, "{}", symbol),
            Self::Keyword(keyword) => write!(f, "{}", keyword),
        }
    }
}

impl Token {
    pub fn is(&self, token_type: TokenType) -> bool {
        TokenType::from(self) == token_type
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// A value tagged with the 1-based source line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub line: usize,
}

impl<T> Spanned<T> {
    pub fn new(node: T, line: usize) -> Self {
        Self { node, line }
    }
}

impl<T: Display> Display for Spanned<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.node)
    }
}
