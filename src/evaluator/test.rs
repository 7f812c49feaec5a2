use super::*;
use crate::builtins::OutputBuffer;
use crate::PRELUDE;
use std::io::Cursor;

fn evaluator_with_input(input: &str, output: &OutputBuffer) -> Evaluator {
    let console = Console::new(Cursor::new(input.as_bytes().to_vec()), output.clone());
    Evaluator::new(console)
}

fn parse(input: &str) -> Program {
    let tokens = Lexer::new(input.to_owned())
        .tokenize()
        .expect("Lex errors found");
    Parser::new(tokens)
        .parse_program()
        .expect("Parse errors found")
}

fn run(input: &str) -> (Evaluator, Result<()>, String) {
    let output = OutputBuffer::new();
    let mut evaluator = evaluator_with_input("", &output);
    evaluator
        .load_stdlib(PRELUDE)
        .expect("standard library failed to load");

    let result = evaluator.execute(&parse(input));
    (evaluator, result, output.contents())
}

fn run_output_tests(cases: Vec<(&str, &str)>) {
    for (input, expected) in cases.into_iter() {
        let (_, result, output) = run(input);
        assert_eq!(result, Ok(()), "{}", input);
        assert_eq!(output, expected, "{}", input);
    }
}

fn run_error_tests(cases: Vec<(&str, usize, EvalError)>) {
    for (input, line, error) in cases.into_iter() {
        let (_, result, _) = run(input);
        assert_eq!(result, Err(RuntimeError::new(line, error)), "{}", input);
    }
}

#[test]
fn test_while_loop() {
    run_output_tests(vec![(
        "varas x 1\nwhile (lt x 5) (print x) (as x (add x 1)) end",
        "1\n2\n3\n4\n",
    )]);
}

#[test]
fn test_functions_and_closures() {
    let cases = vec![
        ("const f (func [n] (return (add n 1)))\n(print (f 5))", "6\n"),
        (
            "varas counter 0
function bump []
    as counter (add counter 1)
end
(bump) (bump)
(print counter)",
            "2\n",
        ),
        (
            "function makeCounter []
    varas n 0
    return func []
        as n (inc n)
        return n
    end
end
const c (makeCounter)
const d (makeCounter)
(c) (c)
(print (c) \" \" (d))",
            "3 1\n",
        ),
        (
            "function fib [n]
    return (choice (lt n 2) n (add (fib (sub n 1)) (fib (sub n 2))))
end
(print (fib 15))",
            "610\n",
        ),
        (
            "function early []
    (print \"a\")
    exit
    (print \"b\")
end
(print (early))",
            "a\nnil\n",
        ),
        ("(print ((func [a b] (return (sub a b))) 5 3))", "2\n"),
        ("(print (\\[x] (mul x 2) 21))", "42\n"),
        ("(print (func [x] (return (add x 1)) end 5))", "6\n"),
        ("(func [x] (print x) end 5)", "5\n"),
    ];

    run_output_tests(cases);
}

#[test]
fn test_control_flow_propagation() {
    let cases = vec![
        (
            "function find [xs target]
    for var x xs
        if (eq x target)
            do
                return \"found\"
                (print \"unreachable\")
            end
            (print \"unreachable\")
        end
        (print x)
    end
    return \"missing\"
end
(print (find (list 1 2 3) 2))
(print (find (list 1) 5))",
            "1\nfound\n1\nmissing\n",
        ),
        (
            "for var i (range 1 3)
    varas j 0
    while true
        as j (inc j)
        if (gt j i)
            break
        end
        (print (concat i \":\" j))
    end
end",
            "1:1\n2:1\n2:2\n3:1\n3:2\n3:3\n",
        ),
        (
            "for var n (range 1 6)
    if (eq (mod n 2) 0)
        continue
    end
    (print n)
end",
            "1\n3\n5\n",
        ),
        (
            "varas n 0
while true
    as n (inc n)
    if (lt n 3) (continue) end
    (break)
end
(print n)",
            "3\n",
        ),
        (
            "function classify [n]
    if (lt n 0)
        return \"negative\"
    elif (eq n 0)
        return \"zero\"
    elif (lt n 10)
        return \"small\"
    else
        return \"large\"
    end
end
(print (classify -5) \" \" (classify 0) \" \" (classify 3) \" \" (classify 42))",
            "negative zero small large\n",
        ),
        (
            "for var i (range 5 1 -2)
    (print i)
end
for i (range 1 5 -1)
    (print \"never\")
end",
            "5\n3\n1\n",
        ),
    ];

    run_output_tests(cases);
}

#[test]
fn test_scopes() {
    let cases = vec![
        (
            "varas x \"outer\"
do
    varas x \"inner\"
    (print x)
end
(print x)",
            "inner\nouter\n",
        ),
        (
            "varas x 1
if true
    as x 2
end
(print x)",
            "2\n",
        ),
        (
            "varas total 0
for var i (list 1 2 3)
    varas doubled (mul i 2)
    as total (add total doubled)
end
(print total \" \" i)",
            "12 3\n",
        ),
    ];

    run_output_tests(cases);
}

#[test]
fn test_collections() {
    let cases = vec![
        (
            "varas a (list 1 2)
varas b a
(push b 3)
(print a \" \" (id a b) \" \" (id a (list 1 2 3)) \" \" (eq a (list 1 2 3)))",
            "[1, 2, 3] true false true\n",
        ),
        (
            "varas d (dict \"a\" 1 \"b\" 2)
(set d \"c\" 3)
for var k d
    (print k \"=\" (get d k))
end
(print (get d \"z\"))
(print (keys d) (values d))",
            "a=1\nb=2\nc=3\nnil\n[a, b, c][1, 2, 3]\n",
        ),
        (
            "varas xs (list 1 2)
for var x xs
    (push xs x)
end
(print xs)",
            "[1, 2, 1, 2]\n",
        ),
        (
            "varas grid (list (list 1 2) (list 3 4))
(set grid 1 0 30)
(print grid \" \" (get grid 1 0))",
            "[[1, 2], [30, 4]] 30\n",
        ),
        ("(print (id 1 1) (id (list) (list)) (id \"s\" \"s\"))", "truefalsetrue\n"),
    ];

    run_output_tests(cases);
}

#[test]
fn test_special_forms() {
    run_output_tests(vec![
        (
            "(print (and 1 true) (and 1 nil (panic \"no\")) (or nil false) (or nil 2 (panic \"no\")))",
            "truefalsefalsetrue\n",
        ),
        (
            "(print (choice true \"yes\" (panic \"no\")) (choice nil (panic \"no\") \"no\"))",
            "yesno\n",
        ),
        ("(print (and) (or))", "truefalse\n"),
    ]);
}

#[test]
fn test_standard_library() {
    let cases = vec![
        ("(print (map \\[x] (mul x x) (list 1 2 3)))", "[1, 4, 9]\n"),
        ("(print (filter \\[x] (gt x 1) (list 1 2 3)))", "[2, 3]\n"),
        ("(print (reduce \\[a b] (add a b) 0 (range 1 4)))", "10\n"),
        ("(print (join (list 1 2 3) \", \"))", "1, 2, 3\n"),
        ("(print (reverse (list 1 2 3)) (reverse (list)) (sum (list 1 2.5)))", "[3, 2, 1][]3.5\n"),
        (
            "(print (abs -3) (abs 2.5) (not nil) (neq 1 2) (ge 2 2) (le 3 2))",
            "32.5truetruetruefalse\n",
        ),
        (
            "(print (first (list 7 8)) (last (list 7 8)) (isEmpty (list)) (isEmpty \"x\"))",
            "78truefalse\n",
        ),
        (
            "(print (all \\[x] (gt x 0) (list 1 2)) (any \\[x] (eq x 5) (list 1 2)))",
            "truefalse\n",
        ),
        ("(print (str 1.0) (inc 1) (dec 1))", "1.020\n"),
        ("(each \\[x] (print x) (list \"a\" \"b\"))", "a\nb\n"),
        (
            "(print (type 1) (type 1.5) (type \"s\") (type nil) (type true) (type (list)) (type (dict)))",
            "IntFloatStringNilBoolListDict\n",
        ),
        ("(print (type (range 1 2)) (type print) (type and) (type \\[] 1))", "RangeFuncFuncFunc\n"),
    ];

    run_output_tests(cases);
}

#[test]
fn test_runtime_errors() {
    let cases = vec![
        ("const x 1\nas x 2", 2, EvalError::AssignConstant { name: "x".to_owned() }),
        ("var x\nvar x", 2, EvalError::AlreadyDefined { name: "x".to_owned() }),
        ("var x\nconst x 1", 2, EvalError::AlreadyDefined { name: "x".to_owned() }),
        ("(print y)", 1, EvalError::Undefined { name: "y".to_owned() }),
        ("as y 1", 1, EvalError::AssignUndefined { name: "y".to_owned() }),
        (
            "const f (func [n] (return (add n 1)))\n(f 1 2)",
            2,
            EvalError::arity(1, 2),
        ),
        ("(1 2)", 1, EvalError::NotAFunction { type_name: "Int" }),
        (
            "return 1",
            1,
            EvalError::IllegalStatement {
                statement: "return",
                context: "in functions",
            },
        ),
        (
            "\nbreak",
            2,
            EvalError::IllegalStatement {
                statement: "break",
                context: "inside a loop",
            },
        ),
        (
            "function f []\n    continue\nend\n(f)",
            2,
            EvalError::IllegalStatement {
                statement: "continue",
                context: "inside a loop",
            },
        ),
        ("var i\nfor i 5\nend", 2, EvalError::NotIterable { type_name: "Int" }),
        (
            "for j (list)\nend",
            1,
            EvalError::UndeclaredLoopVariable { name: "j".to_owned() },
        ),
        (
            "(dict \"a\")",
            1,
            EvalError::WrongArgument {
                message: "function \"dict\" requires an even number of arguments".to_owned(),
            },
        ),
        ("(get (list 1) 3)", 1, EvalError::ListOutOfBound { index: 3, size: 1 }),
        (
            "\n\n(panic \"boom\")",
            3,
            EvalError::UserPanic {
                message: "boom".to_owned(),
            },
        ),
        ("(choice 1 2)", 1, EvalError::arity(3, 2)),
        (
            "function f [a a]\nend\n(f 1 2)",
            3,
            EvalError::WrongArgument {
                message: "parameter a is declared more than once".to_owned(),
            },
        ),
        (
            "(add 1 \"a\")",
            1,
            EvalError::invalid_type(&["Int", "Float"], &Object::from("a")),
        ),
        ("function map [f xs]\nend", 1, EvalError::AlreadyDefined { name: "map".to_owned() }),
        ("as print 1", 1, EvalError::AssignConstant { name: "print".to_owned() }),
    ];

    run_error_tests(cases);
}

#[test]
fn test_errors_stop_execution() {
    let (_, result, output) = run("(print \"before\")\n(print missing)\n(print \"after\")");

    assert!(result.is_err());
    assert_eq!(output, "before\n");
}

#[test]
fn test_stdlib_errors_report_call_site() {
    let output = OutputBuffer::new();
    let mut evaluator = evaluator_with_input("", &output);
    evaluator
        .load_stdlib("function broken []\n    return missing\nend")
        .expect("standard library failed to load");

    let user = "function alsoBroken []\n    return missing\nend\n\n(broken)";
    let result = evaluator.execute(&parse(user));
    assert_eq!(
        result,
        Err(RuntimeError::new(
            5,
            EvalError::Undefined {
                name: "missing".to_owned()
            }
        ))
    );

    let result = evaluator.execute(&parse("(alsoBroken)"));
    assert_eq!(
        result,
        Err(RuntimeError::new(
            2,
            EvalError::Undefined {
                name: "missing".to_owned()
            }
        ))
    );
}

#[test]
fn test_stdlib_load_errors() {
    let output = OutputBuffer::new();
    let cases = vec!["function", "(panic \"at load\")", "\"unterminated"];

    for source in cases.into_iter() {
        let mut evaluator = evaluator_with_input("", &output);
        assert!(evaluator.load_stdlib(source).is_err(), "{}", source);
    }
}

#[test]
fn test_read_from_console() {
    let output = OutputBuffer::new();
    let mut evaluator = evaluator_with_input("alice\n", &output);

    let program = parse("varas name (read)\n(print \"hi \" name)\n(print (read))");
    assert_eq!(evaluator.execute(&program), Ok(()));
    assert_eq!(output.contents(), "hi alice\nnil\n");
}

#[test]
fn test_globals() {
    let (evaluator, result, _) = run("varas answer (mul 6 7)\nconst name \"vox\"");

    assert_eq!(result, Ok(()));
    assert_eq!(evaluator.globals().get("answer"), Some(42.into()));
    assert_eq!(evaluator.globals().get("name"), Some("vox".into()));
    assert_eq!(
        evaluator.globals().get("and"),
        Some(Object::Special(SpecialForm::And))
    );
    assert!(matches!(evaluator.globals().get("add"), Some(Object::Builtin(_))));
    assert!(matches!(evaluator.globals().get("map"), Some(Object::Function(f)) if f.stdlib));
}

#[test]
fn test_special_forms_and_natives_are_distinct() {
    for form in SpecialForm::iter() {
        assert!(!BUILTINS.contains_key(form.to_string().as_str()), "{}", form);
    }

    let evaluator = Evaluator::new(Console::new(Cursor::new(Vec::new()), OutputBuffer::new()));
    for form in SpecialForm::iter() {
        assert_eq!(
            evaluator.globals().get(&form.to_string()),
            Some(Object::Special(form))
        );
    }
    for &name in BUILTINS.keys() {
        assert!(matches!(evaluator.globals().get(name), Some(Object::Builtin(b)) if b.name == name));
    }
}
