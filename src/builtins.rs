use crate::object::*;
use lazy_static::lazy_static;
use rand::Rng;
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt::{self, Debug, Formatter};
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

pub type BuiltinFunction = fn(&mut Console, Vec<Object>) -> Result<Object>;

/// A host-implemented function. Its arguments arrive already evaluated.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Where `print` writes and `read` reads.
pub struct Console {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Console {
    pub fn new<R, W>(input: R, output: W) -> Self
    where
        R: BufRead + 'static,
        W: Write + 'static,
    {
        Self {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }

    /// Write failures are not language errors; the program keeps running.
    fn write_line(&mut self, text: &str) {
        let _ = writeln!(self.output, "{}", text);
        let _ = self.output.flush();
    }

    /// One line without its terminator, or `None` at end of input. Input
    /// that cannot be read or decoded counts as end of input.
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let trimmed = line.trim_end_matches(|c| c == '\n' || c == '\r');
                Some(trimmed.to_owned())
            }
        }
    }
}

/// An in-memory sink whose clones share one buffer, so the text written
/// through a `Console` can be read back afterwards.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(n) => n,
        }
    }
}

impl From<Number> for Object {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(n) => Object::Integer(n),
            Number::Float(n) => Object::Float(n),
        }
    }
}

fn number(obj: &Object) -> Result<Number> {
    match obj {
        Object::Integer(n) => Ok(Number::Int(*n)),
        Object::Float(n) => Ok(Number::Float(*n)),
        other => Err(EvalError::invalid_type(&["Int", "Float"], other)),
    }
}

fn integer(obj: &Object) -> Result<i64> {
    match obj {
        Object::Integer(n) => Ok(*n),
        other => Err(EvalError::invalid_type(&["Int"], other)),
    }
}

fn float(obj: &Object) -> Result<f64> {
    match obj {
        Object::Float(n) => Ok(*n),
        other => Err(EvalError::invalid_type(&["Float"], other)),
    }
}

fn arguments<const N: usize>(args: Vec<Object>) -> Result<[Object; N]> {
    let actual = args.len();
    <[Object; N]>::try_from(args).map_err(|_| EvalError::arity(N, actual))
}

/// Variadic functions take either the values themselves or one list of them.
fn variadic(args: Vec<Object>) -> Result<Vec<Object>> {
    match args.len() {
        0 => Err(EvalError::arity(1, 0)),
        1 => match &args[0] {
            Object::List(list) => Ok(list.borrow().clone()),
            other => Err(EvalError::invalid_type(&["List"], other)),
        },
        _ => Ok(args),
    }
}

fn division_by_zero() -> EvalError {
    EvalError::WrongArgument {
        message: "division by zero".to_owned(),
    }
}

fn list_index(key: &Object, size: usize) -> Result<usize> {
    let index = integer(key)?;
    if index >= 0 && (index as usize) < size {
        Ok(index as usize)
    } else {
        Err(EvalError::ListOutOfBound { index, size })
    }
}

/// Follows `keys` through nested lists and dicts. A missing dict key ends
/// the walk with nil.
fn nested_element(collection: &Object, keys: &[Object]) -> Result<Object> {
    let mut current = collection.clone();
    for key in keys {
        let next = match &current {
            Object::List(list) => {
                let list = list.borrow();
                let index = list_index(key, list.len())?;
                list[index].clone()
            }
            Object::Dict(dict) => {
                let found = dict.borrow().get(key).cloned();
                match found {
                    Some(value) => value,
                    None => return Ok(Object::Nil),
                }
            }
            other => return Err(EvalError::invalid_type(&["List", "Dict"], other)),
        };
        current = next;
    }
    Ok(current)
}

fn add(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let mut sum = Number::Int(0);
    for arg in variadic(args)?.iter() {
        sum = match (sum, number(arg)?) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.wrapping_add(b)),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        };
    }
    Ok(sum.into())
}

fn mul(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let mut product = Number::Int(1);
    for arg in variadic(args)?.iter() {
        product = match (product, number(arg)?) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.wrapping_mul(b)),
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        };
    }
    Ok(product.into())
}

fn sub(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [first, second] = arguments::<2>(args)?;
    Ok(match (number(&first)?, number(&second)?) {
        (Number::Int(a), Number::Int(b)) => Object::Integer(a.wrapping_sub(b)),
        (a, b) => Object::Float(a.as_f64() - b.as_f64()),
    })
}

fn div(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [first, second] = arguments::<2>(args)?;
    let (a, b) = (number(&first)?, number(&second)?);
    Ok(Object::Float(a.as_f64() / b.as_f64()))
}

fn intdiv(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [first, second] = arguments::<2>(args)?;
    let (a, b) = (integer(&first)?, integer(&second)?);
    if b == 0 {
        return Err(division_by_zero());
    }
    Ok(Object::Integer(a.wrapping_div(b)))
}

fn modulo(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [first, second] = arguments::<2>(args)?;
    Ok(match (number(&first)?, number(&second)?) {
        (Number::Int(_), Number::Int(0)) => return Err(division_by_zero()),
        (Number::Int(a), Number::Int(b)) => Object::Integer(a.wrapping_rem(b)),
        (a, b) => Object::Float(a.as_f64() % b.as_f64()),
    })
}

fn pow(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [base, exponent] = arguments::<2>(args)?;
    Ok(Object::Float(float(&base)?.powf(float(&exponent)?)))
}

fn eq(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [first, second] = arguments::<2>(args)?;
    Ok((first == second).into())
}

fn id(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [first, second] = arguments::<2>(args)?;
    Ok(first.same(&second).into())
}

fn lt(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [first, second] = arguments::<2>(args)?;
    let less = match (&first, &second) {
        (Object::String(a), Object::String(b)) => a < b,
        (Object::String(_), other) => return Err(EvalError::invalid_type(&["String"], other)),
        (Object::Integer(_), _) | (Object::Float(_), _) => less(number(&first)?, number(&second)?),
        (other, _) => return Err(EvalError::invalid_type(&["Int", "Float", "String"], other)),
    };
    Ok(less.into())
}

fn less(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => a < b,
        (a, b) => a.as_f64() < b.as_f64(),
    }
}

/// The float result wins whenever any argument is a float.
fn extremum(args: Vec<Object>, replaces: fn(Number, Number) -> bool) -> Result<Object> {
    let mut best: Option<Number> = None;
    let mut saw_float = false;
    for arg in variadic(args)?.iter() {
        let n = number(arg)?;
        saw_float |= matches!(n, Number::Float(_));
        best = match best {
            Some(current) if !replaces(n, current) => Some(current),
            _ => Some(n),
        };
    }

    Ok(match best {
        Some(n) if saw_float => Object::Float(n.as_f64()),
        Some(n) => n.into(),
        None => Object::Nil,
    })
}

fn min(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    extremum(args, |candidate, current| less(candidate, current))
}

fn max(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    extremum(args, |candidate, current| less(current, candidate))
}

fn print(console: &mut Console, args: Vec<Object>) -> Result<Object> {
    let text: String = args.iter().map(Object::to_string).collect();
    console.write_line(&text);
    Ok(Object::Nil)
}

fn read(console: &mut Console, args: Vec<Object>) -> Result<Object> {
    arguments::<0>(args)?;
    Ok(console.read_line().map(Object::from).unwrap_or_default())
}

fn panic(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [message] = arguments::<1>(args)?;
    match message {
        Object::String(message) => Err(EvalError::UserPanic {
            message: message.to_string(),
        }),
        other => Err(EvalError::invalid_type(&["String"], &other)),
    }
}

fn random(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    arguments::<0>(args)?;
    Ok(Object::Float(rand::thread_rng().gen::<f64>()))
}

fn char_list(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [string] = arguments::<1>(args)?;
    match string {
        Object::String(s) => Ok(Object::list(
            s.chars().map(|c| Object::from(c.to_string())).collect(),
        )),
        other => Err(EvalError::invalid_type(&["String"], &other)),
    }
}

fn concat(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let text: String = variadic(args)?.iter().map(Object::to_string).collect();
    Ok(text.into())
}

fn to_int(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [arg] = arguments::<1>(args)?;
    match arg {
        Object::Integer(_) => Ok(arg),
        Object::Float(n) => Ok(Object::Integer(n as i64)),
        Object::String(s) => Ok(s.parse::<i64>().map(Object::from).unwrap_or_default()),
        other => Err(EvalError::invalid_type(&["Int", "Float", "String"], &other)),
    }
}

fn to_float(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [arg] = arguments::<1>(args)?;
    match arg {
        Object::Integer(n) => Ok(Object::Float(n as f64)),
        Object::Float(_) => Ok(arg),
        Object::String(s) => Ok(s.parse::<f64>().map(Object::from).unwrap_or_default()),
        other => Err(EvalError::invalid_type(&["Int", "Float", "String"], &other)),
    }
}

fn get(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    match args.as_slice() {
        [collection, keys @ ..] if !keys.is_empty() => nested_element(collection, keys),
        _ => Err(EvalError::arity(2, args.len())),
    }
}

fn set(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let (collection, key, value) = match args.as_slice() {
        [collection, path @ .., key, value] => (nested_element(collection, path)?, key, value),
        _ => return Err(EvalError::arity(3, args.len())),
    };

    match &collection {
        Object::List(list) => {
            let size = list.borrow().len();
            let index = list_index(key, size)?;
            list.borrow_mut()[index] = value.clone();
        }
        Object::Dict(dict) => {
            // Comparing keys may borrow this dict again, so look up first.
            let position = dict.borrow().position(key);
            dict.borrow_mut().insert_at(position, key.clone(), value.clone());
        }
        other => return Err(EvalError::invalid_type(&["List", "Dict"], other)),
    }
    Ok(Object::Nil)
}

fn size(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [collection] = arguments::<1>(args)?;
    let size = match &collection {
        Object::List(list) => list.borrow().len(),
        Object::Dict(dict) => dict.borrow().len(),
        Object::String(s) => s.chars().count(),
        other => return Err(EvalError::invalid_type(&["List", "Dict", "String"], other)),
    };
    Ok(Object::Integer(size as i64))
}

fn contains(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [collection, key] = arguments::<2>(args)?;
    let found = match &collection {
        Object::List(list) => list.borrow().contains(&key),
        Object::Dict(dict) => dict.borrow().contains_key(&key),
        Object::Range(range) => match number(&key)? {
            Number::Int(n) => range.contains(n),
            Number::Float(n) => {
                let (low, high) = if range.start <= range.end {
                    (range.start, range.end)
                } else {
                    (range.end, range.start)
                };
                low as f64 <= n && n <= high as f64
            }
        },
        other => return Err(EvalError::invalid_type(&["List", "Dict", "Range"], other)),
    };
    Ok(found.into())
}

fn remove(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [collection, key] = arguments::<2>(args)?;
    let removed = match &collection {
        Object::List(list) => {
            let position = list.borrow().iter().position(|element| *element == key);
            match position {
                Some(i) => {
                    list.borrow_mut().remove(i);
                    true
                }
                None => false,
            }
        }
        Object::Dict(dict) => {
            let position = dict.borrow().position(&key);
            match position {
                Some(i) => {
                    dict.borrow_mut().remove_at(i);
                    true
                }
                None => false,
            }
        }
        other => return Err(EvalError::invalid_type(&["List", "Dict"], other)),
    };
    Ok(removed.into())
}

fn list(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    Ok(Object::list(args))
}

fn push(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [list, value] = arguments::<2>(args)?;
    match &list {
        Object::List(list) => {
            list.borrow_mut().push(value);
            Ok(Object::Nil)
        }
        other => Err(EvalError::invalid_type(&["List"], other)),
    }
}

fn pop(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [list] = arguments::<1>(args)?;
    match &list {
        Object::List(list) => Ok(list.borrow_mut().pop().unwrap_or_default()),
        other => Err(EvalError::invalid_type(&["List"], other)),
    }
}

fn dict(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    if args.len() % 2 != 0 {
        return Err(EvalError::WrongArgument {
            message: "function \"dict\" requires an even number of arguments".to_owned(),
        });
    }

    let mut dict = Dict::new();
    let mut args = args.into_iter();
    while let (Some(key), Some(value)) = (args.next(), args.next()) {
        dict.insert(key, value);
    }
    Ok(dict.into())
}

fn range(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let (start, end, step) = match args.as_slice() {
        [start, end] => (start, end, None),
        [start, end, step] => (start, end, Some(step)),
        _ if args.len() > 3 => return Err(EvalError::arity(3, args.len())),
        _ => return Err(EvalError::arity(2, args.len())),
    };

    let step = match step {
        Some(step) => integer(step)?,
        None => 1,
    };
    Ok(RangeValue::new(integer(start)?, integer(end)?, step).into())
}

fn range_props(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [range] = arguments::<1>(args)?;
    match &range {
        Object::Range(r) => Ok(Object::list(vec![
            r.start.into(),
            r.end.into(),
            r.step.into(),
        ])),
        other => Err(EvalError::invalid_type(&["Range"], other)),
    }
}

fn type_of(_: &mut Console, args: Vec<Object>) -> Result<Object> {
    let [value] = arguments::<1>(args)?;
    Ok(value.type_name().into())
}

lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, BuiltinFunction> = {
        let mut natives: HashMap<&'static str, BuiltinFunction> = HashMap::new();
        natives.insert("add", add);
        natives.insert("mul", mul);
        natives.insert("sub", sub);
        natives.insert("div", div);
        natives.insert("intdiv", intdiv);
        natives.insert("mod", modulo);
        natives.insert("pow", pow);
        natives.insert("eq", eq);
        natives.insert("id", id);
        natives.insert("lt", lt);
        natives.insert("min", min);
        natives.insert("max", max);
        natives.insert("print", print);
        natives.insert("read", read);
        natives.insert("panic", panic);
        natives.insert("random", random);
        natives.insert("charList", char_list);
        natives.insert("concat", concat);
        natives.insert("int", to_int);
        natives.insert("float", to_float);
        natives.insert("get", get);
        natives.insert("set", set);
        natives.insert("size", size);
        natives.insert("in", contains);
        natives.insert("remove", remove);
        natives.insert("list", list);
        natives.insert("push", push);
        natives.insert("pop", pop);
        natives.insert("dict", dict);
        natives.insert("range", range);
        natives.insert("rangeProps", range_props);
        natives.insert("type", type_of);
        natives
    };
}
