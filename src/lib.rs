pub mod ast;
mod builtins;
mod environment;
mod evaluator;
mod lexer;
pub mod object;
mod parser;
pub mod token;

pub use builtins::{Console, OutputBuffer};
pub use environment::Environment;
pub use evaluator::Evaluator;
pub use lexer::{LexError, Lexer};
pub use object::{EvalError, Object, RuntimeError};
pub use parser::{ParseError, Parser};

use custom_error::custom_error;

/// Source of the standard library bundled with the interpreter.
pub const PRELUDE: &str = include_str!("prelude.vox");

custom_error! {
    #[derive(PartialEq)]
    pub Error

    Lex{source: LexError} = "{source}",
    Parse{source: ParseError} = "{source}",
    Runtime{source: RuntimeError} = "{source}",
    StandardLibrary{error: Box<Error>} = "Standard library failed to load: {error}",
}

/// Runs a program against the process's stdin and stdout.
pub fn run(source: &str, stdlib: &str) -> Result<(), Error> {
    run_with_console(source, stdlib, Console::stdio())
}

pub fn run_with_console(source: &str, stdlib: &str, console: Console) -> Result<(), Error> {
    let tokens = Lexer::new(source.to_owned()).tokenize()?;
    let program = Parser::new(tokens).parse_program()?;

    let mut evaluator = Evaluator::new(console);
    evaluator
        .load_stdlib(stdlib)
        .map_err(|error| Error::StandardLibrary {
            error: Box::new(error),
        })?;
    evaluator.execute(&program)?;

    Ok(())
}
