use super::Object;
use custom_error::custom_error;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub EvalError

    AlreadyDefined{name: String} = "cannot define variable {name} because it already exists",
    Undefined{name: String} = "cannot access variable {name} because it does not exist",
    AssignUndefined{name: String} = "cannot assign to variable {name} because it does not exist",
    AssignConstant{name: String} = "cannot assign to constant {name}",
    NotAFunction{type_name: &'static str} = "a value of type {type_name} is not a function",
    IllegalStatement{statement: &'static str, context: &'static str} = "\"{statement}\" is only allowed {context}",
    InvalidType{expected: String, actual: &'static str} = "expected type {expected}, got type {actual}",
    WrongNumberOfArguments{expected: usize, actual: usize} = "expected {expected} arguments, got {actual}",
    WrongArgument{message: String} = "{message}",
    ListOutOfBound{index: i64, size: usize} = "index out of bounds (index: {index}, list size: {size})",
    UndeclaredLoopVariable{name: String} = "for loop variable {name} has to be defined beforehand",
    NotIterable{type_name: &'static str} = "can only iterate over values of type List, Dict or Range, found {type_name}",
    UserPanic{message: String} = "[panic] {message}",
}

impl EvalError {
    /// `expected` lists the accepted type names, e.g. `&["Int", "Float"]`.
    pub fn invalid_type(expected: &[&str], actual: &Object) -> Self {
        let expected = match expected {
            [] => String::new(),
            [only] => (*only).to_owned(),
            [init @ .., last] => format!("{} or {}", init.join(", "), last),
        };

        Self::InvalidType {
            expected,
            actual: actual.type_name(),
        }
    }

    pub fn arity(expected: usize, actual: usize) -> Self {
        Self::WrongNumberOfArguments { expected, actual }
    }

    /// The broad family an error belongs to.
    pub fn category(&self) -> &'static str {
        match self {
            Self::AlreadyDefined { .. }
            | Self::Undefined { .. }
            | Self::AssignUndefined { .. }
            | Self::AssignConstant { .. } => "Variable",
            Self::NotAFunction { .. } => "Function",
            Self::IllegalStatement { .. } => "IllegalStatement",
            Self::InvalidType { .. } => "InvalidType",
            Self::WrongNumberOfArguments { .. } => "WrongNumberOfArguments",
            Self::WrongArgument { .. } => "WrongArgument",
            Self::ListOutOfBound { .. } => "ListOutOfBound",
            Self::UndeclaredLoopVariable { .. } | Self::NotIterable { .. } => "ForLoop",
            Self::UserPanic { .. } => "UserPanic",
        }
    }
}

custom_error! {
    #[derive(Clone, PartialEq)]
    pub RuntimeError{line: usize, error: EvalError} = "Runtime error at line {line}: {error}"
}

impl RuntimeError {
    pub fn new(line: usize, error: EvalError) -> Self {
        Self { line, error }
    }
}
