use std::io::Cursor;
use vox_interpreter::token::Token;
use vox_interpreter::{
    run_with_console, Console, Error, EvalError, Lexer, OutputBuffer, Parser, RuntimeError,
    PRELUDE,
};

fn run_program(source: &str, input: &str) -> (Result<(), Error>, String) {
    let output = OutputBuffer::new();
    let console = Console::new(Cursor::new(input.as_bytes().to_vec()), output.clone());
    let result = run_with_console(source, PRELUDE, console);
    (result, output.contents())
}

#[test]
fn test_word_frequencies() {
    let source = r#"
# Counts how often each word appears on stdin.
const counts (dict)
varas line (read)
while line
    varas word ""
    for var ch (charList (concat line " "))
        if (eq ch " ")
            if (neq word "")
                (set counts word (add 1 (choice (in counts word) (get counts word) 0)))
            end
            as word ""
        else
            as word (concat word ch)
        end
    end
    as line (read)
end
for var w (keys counts)
    (print w ": " (get counts w))
end
"#;

    let (result, output) = run_program(source, "the cat\nthe dog\n");
    assert_eq!(result, Ok(()));
    assert_eq!(output, "the: 2\ncat: 1\ndog: 1\n");
}

#[test]
fn test_sieve() {
    let source = r#"
function primes [limit]
    varas marked (list)
    for var i (range 0 limit)
        (push marked false)
    end
    varas found (list)
    for var n (range 2 limit)
        if (not (get marked n))
            (push found n)
            for var m (range (mul n n) limit n)
                (set marked m true)
            end
        end
    end
    return found
end

(print (primes 30))
"#;

    let (result, output) = run_program(source, "");
    assert_eq!(result, Ok(()));
    assert_eq!(output, "[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]\n");
}

#[test]
fn test_higher_order_pipeline() {
    let source = r#"
const square \[x] (mul x x)
const odd \[x] (eq (mod x 2) 1)
varas squares (map square (filter odd (range 1 9)))
(print squares " total " (sum squares))
(print (join (map str (list 1.5 nil true)) "|"))
"#;

    let (result, output) = run_program(source, "");
    assert_eq!(result, Ok(()));
    assert_eq!(output, "[1, 9, 25, 49, 81] total 165\n1.5|nil|true\n");
}

#[test]
fn test_error_categories() {
    let cases = vec![
        ("(print \"unterminated)", "Lexing error at line 1"),
        ("\nvar", "Parsing error at line 2"),
        ("\n\n(print missing)", "Runtime error at line 3"),
    ];

    for (source, prefix) in cases.into_iter() {
        let (result, _) = run_program(source, "");
        let message = result.expect_err("program should fail").to_string();
        assert!(message.starts_with(prefix), "{} => {}", source, message);
    }
}

#[test]
fn test_runtime_error_value() {
    let (result, output) = run_program("(print 1)\nconst x 1\nas x 2\n(print 2)", "");

    assert_eq!(output, "1\n");
    assert_eq!(
        result,
        Err(Error::Runtime {
            source: RuntimeError::new(
                3,
                EvalError::AssignConstant {
                    name: "x".to_owned()
                }
            )
        })
    );
}

#[test]
fn test_broken_standard_library() {
    let output = OutputBuffer::new();
    let console = Console::new(Cursor::new(Vec::new()), output);
    let result = run_with_console("(print 1)", "function", console);

    let message = result.as_ref().unwrap_err().to_string();
    assert!(
        message.starts_with("Standard library failed to load: Parsing error at line 1"),
        "{}",
        message
    );

    match result {
        Err(Error::StandardLibrary { error }) => match *error {
            Error::Parse { .. } => {}
            other => panic!("expected a parse error, got {}", other),
        },
        other => panic!("expected a standard library error, got {:?}", other),
    }
}

fn tokens(source: &str) -> Vec<Token> {
    Lexer::new(source.to_owned())
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|token| token.node)
        .collect()
}

#[test]
fn test_source_round_trip() {
    let source = "varas greeting \"hi\\tthere\" (print greeting -2 3.5 nil)";
    let original = tokens(source);
    let rendered: Vec<String> = original.iter().map(Token::to_string).collect();
    assert_eq!(tokens(&rendered.join(" ")), original);

    let program = Parser::new(Lexer::new(source.to_owned()).tokenize().unwrap())
        .parse_program()
        .unwrap();
    assert_eq!(
        program.to_string(),
        "var [greeting] as greeting \"hi\\tthere\"\n(print greeting -2 3.5 nil)\n"
    );
}
