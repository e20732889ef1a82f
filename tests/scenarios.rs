use buffalo_lang::{interpret, tokenize, BuffaloError, Interpreter, InterpreterConfig, Token};

#[test]
fn scenario_double_upper_then_output() {
    let program = tokenize("Buffalo Buffalo.");
    assert_eq!(program.tokens(), &[Token::WordUpper, Token::WordUpper, Token::Output]);
    let exec = interpret(&program, 256).unwrap();
    assert_eq!(exec.output, vec![1]);
}

#[test]
fn scenario_pointer_advance_then_output() {
    let exec = interpret(&tokenize("buffalo Buffalo."), 256).unwrap();
    assert_eq!(exec.output, vec![0]);
    assert_eq!(exec.pointer, 1);
}

#[test]
fn scenario_loop_drains_tested_cell() {
    let exec = interpret(&tokenize("Buffalo Buffalo(buffalo buffalo)."), 256).unwrap();
    assert_eq!(exec.output, vec![0]);
    assert_eq!(exec.memory[0], 0);
    assert_eq!(exec.pointer, 0);
}

#[test]
fn scenario_lone_loop_end_is_fatal() {
    let mut interp = Interpreter::new(tokenize(")"));
    assert!(matches!(interp.run(), Err(BuffaloError::UnmatchedLoopEnd { ip: 0 })));
    assert!(interp.output().is_empty());
}

#[test]
fn interpreting_twice_gives_identical_results() {
    let program = tokenize("Buffalo Buffalo Buffalo Buffalo (buffalo Buffalo Buffalo Buffalo Buffalo buffalo buffalo buffalo) buffalo Buffalo .");
    let first = interpret(&program, 256).unwrap();
    let second = interpret(&program, 256).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.output, vec![2]);
}

#[test]
fn custom_tape_length_is_honoured() {
    let config = InterpreterConfig::default().with_memory_size(4);
    let mut interp = Interpreter::with_config(tokenize(&"buffalo Buffalo ".repeat(10)), config);
    interp.run().unwrap();
    assert_eq!(interp.memory().len(), 4);
    assert_eq!(interp.pointer(), 3);
}

#[test]
fn error_messages_name_the_token() {
    let err = interpret(&tokenize("Buffalo )"), 256).unwrap_err();
    assert_eq!(err.to_string(), "Unmatched loop end ')' at token 1");
}
