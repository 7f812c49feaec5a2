use crate::token::{Spanned, Symbol, Token};
use custom_error::custom_error;
use std::mem;
use std::str::FromStr;
use strum::IntoEnumIterator;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub LexError

    UnexpectedCharacter{line: usize, ch: char} = "Lexing error at line {line}: unexpected character '{ch}'",
    IllegalEscape{line: usize, ch: char} = "Lexing error at line {line}: illegal escape sequence '\\{ch}'",
    IllegalNumber{line: usize, literal: String} = "Lexing error at line {line}: illegal number literal '{literal}'",
    UnknownSymbol{line: usize, symbol: String} = "Lexing error at line {line}: unknown symbol '{symbol}'",
    UnterminatedString{line: usize} = "Lexing error at line {line}: unterminated string literal",
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { line, .. }
            | Self::IllegalEscape { line, .. }
            | Self::IllegalNumber { line, .. }
            | Self::UnknownSymbol { line, .. }
            | Self::UnterminatedString { line } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Whitespace,
    Identifier,
    IdentifierOrNumber,
    String,
    StringEscape,
    Number,
    Symbol,
    Comment,
}

const OPERATOR_CHARS: &str = "-+*/%><&|'!?$=~";

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || OPERATOR_CHARS.contains(c)
}

fn is_identifier_middle(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '+' || c == '-'
}

fn is_number_middle(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_symbol_char(c: char) -> bool {
    Symbol::iter().any(|symbol| symbol.to_string().contains(c))
}

/// True while some symbol still starts with `text`.
fn is_symbol_prefix(text: &str) -> bool {
    Symbol::iter().any(|symbol| symbol.to_string().starts_with(text))
}

fn escape_sequence(c: char) -> Option<char> {
    match c {
        '\\' => Some('\\'),
        '"' => Some('"'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    }
}

pub struct Lexer {
    input: String,
    state: State,
    current: String,
    line: usize,
    token_line: usize,
    tokens: Vec<Spanned<Token>>,
}

impl Lexer {
    pub fn new(input: String) -> Self {
        Self {
            input,
            state: State::Whitespace,
            current: String::new(),
            line: 1,
            token_line: 1,
            tokens: vec![],
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned<Token>>, LexError> {
        let input = mem::take(&mut self.input);

        // The trailing space flushes whatever token is still pending.
        for ch in input.chars().chain(std::iter::once(' ')) {
            self.step(ch)?;
            if ch == '\n' {
                self.line += 1;
            }
        }

        match self.state {
            State::String | State::StringEscape => Err(LexError::UnterminatedString {
                line: self.token_line,
            }),
            _ => Ok(self.tokens),
        }
    }

    fn step(&mut self, ch: char) -> Result<(), LexError> {
        match self.state {
            State::Whitespace => self.begin(ch)?,
            State::Identifier => {
                if is_identifier_middle(ch) {
                    self.current.push(ch);
                } else {
                    self.end_word();
                    self.begin(ch)?;
                }
            }
            State::IdentifierOrNumber => {
                if is_number_middle(ch) {
                    self.current.push(ch);
                    self.state = State::Number;
                } else if is_identifier_middle(ch) {
                    self.current.push(ch);
                    self.state = State::Identifier;
                } else {
                    self.end_word();
                    self.begin(ch)?;
                }
            }
            State::String => match ch {
                '\\' => self.state = State::StringEscape,
                '"' => {
                    let text = mem::take(&mut self.current);
                    self.emit(Token::String(text));
                    self.state = State::Whitespace;
                }
                c => self.current.push(c),
            },
            State::StringEscape => {
                let escaped = escape_sequence(ch).ok_or(LexError::IllegalEscape {
                    line: self.line,
                    ch,
                })?;
                self.current.push(escaped);
                self.state = State::String;
            }
            State::Number => {
                if is_number_middle(ch) {
                    self.current.push(ch);
                } else {
                    self.end_number()?;
                    self.begin(ch)?;
                }
            }
            State::Symbol => {
                let mut extended = self.current.clone();
                extended.push(ch);
                if is_symbol_prefix(&extended) {
                    self.current = extended;
                } else {
                    self.end_symbol()?;
                    self.begin(ch)?;
                }
            }
            State::Comment => {
                if ch == '\n' {
                    self.state = State::Whitespace;
                }
            }
        }
        Ok(())
    }

    fn begin(&mut self, ch: char) -> Result<(), LexError> {
        self.token_line = self.line;
        self.current.clear();

        self.state = if is_identifier_start(ch) {
            self.current.push(ch);
            if is_number_start(ch) {
                State::IdentifierOrNumber
            } else {
                State::Identifier
            }
        } else if is_number_start(ch) {
            self.current.push(ch);
            State::Number
        } else if ch.is_whitespace() {
            State::Whitespace
        } else if ch == '"' {
            State::String
        } else if ch == '#' {
            State::Comment
        } else if is_symbol_char(ch) {
            self.current.push(ch);
            State::Symbol
        } else {
            return Err(LexError::UnexpectedCharacter {
                line: self.line,
                ch,
            });
        };
        Ok(())
    }

    fn emit(&mut self, token: Token) {
        self.tokens.push(Spanned::new(token, self.token_line));
    }

    fn end_word(&mut self) {
        let word = mem::take(&mut self.current);
        self.emit(Token::from(word));
    }

    fn end_number(&mut self) -> Result<(), LexError> {
        let literal = mem::take(&mut self.current);
        let token = if let Ok(n) = literal.parse::<i64>() {
            Token::Int(n)
        } else if let Ok(n) = literal.parse::<f64>() {
            Token::Float(n)
        } else {
            return Err(LexError::IllegalNumber {
                line: self.token_line,
                literal,
            });
        };
        self.emit(token);
        Ok(())
    }

    fn end_symbol(&mut self) -> Result<(), LexError> {
        let text = mem::take(&mut self.current);
        match Symbol::from_str(&text) {
            Ok(symbol) => {
                self.emit(Token::Symbol(symbol));
                Ok(())
            }
            Err(_) => Err(LexError::UnknownSymbol {
                line: self.token_line,
                symbol: text,
            }),
        }
    }
}
