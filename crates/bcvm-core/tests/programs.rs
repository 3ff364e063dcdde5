use std::io::Write;

use bcvm_core::{
    run_source, BcvmConfig, BcvmError, ParseError, ProgramLoader, RuntimeError, Value,
    VirtualMachine,
};

/// Run program text, returning printed lines and the final machine
fn run(source: &str) -> (Vec<String>, VirtualMachine<Vec<u8>>) {
    let vm = run_source(BcvmConfig::new(), source, Vec::new()).expect("program failed");
    let printed = String::from_utf8(vm.output().clone()).expect("non-utf8 output");
    (printed.lines().map(str::to_string).collect(), vm)
}

/// Run program text expected to fail at runtime
fn runtime_error(source: &str) -> RuntimeError {
    match run_source(BcvmConfig::new(), source, Vec::new()) {
        Err(BcvmError::Runtime { source, .. }) => source,
        Err(other) => panic!("expected runtime error, got {}", other),
        Ok(_) => panic!("expected runtime error, program succeeded"),
    }
}

/// Build program text from `(index, opcode, arg)` rows, one field per line
fn listing(rows: &[(usize, &str, &str)]) -> String {
    let mut text = String::new();
    for (index, opcode, arg) in rows {
        text.push_str(&format!("{index}\n{opcode}\n"));
        if !arg.is_empty() {
            text.push_str(&format!("{arg}\n"));
        }
    }
    text
}

#[test]
fn hello_world_prints_space_joined_line() {
    let (lines, vm) = run(include_str!("../../../programs/hello_world.bc"));
    assert_eq!(lines, ["Hello World"]);
    assert!(vm.stack().is_empty());
}

#[test]
fn countdown_loop_uses_backward_jumps() {
    let (lines, vm) = run(include_str!("../../../programs/countdown.bc"));
    assert_eq!(lines, ["3", "2", "1", "liftoff"]);
    assert_eq!(vm.variable("n"), Some(&Value::Int(0)));
}

#[test]
fn fizzbuzz() {
    let (lines, _) = run(include_str!("../../../programs/fizzbuzz.bc"));
    assert_eq!(
        lines,
        [
            "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11", "Fizz", "13",
            "14", "FizzBuzz"
        ]
    );
}

#[test]
fn list_mutation_is_visible_through_variable() {
    let (lines, vm) = run(include_str!("../../../programs/lists.bc"));
    assert_eq!(lines, ["[10, twenty, 30] twenty"]);
    assert_eq!(
        vm.variable("xs").map(Value::to_string).as_deref(),
        Some("[10, twenty, 30]")
    );
}

#[test]
fn float_truncates_on_add_and_leaves_result_on_stack() {
    let source = listing(&[
        (0, "LOAD_CONST", "1.0"),
        (2, "LOAD_CONST", "2"),
        (4, "BINARY_ADD", ""),
        (5, "END", ""),
    ]);
    let (lines, vm) = run(&source);
    assert!(lines.is_empty());
    assert_eq!(vm.stack(), &[Value::Int(3)]);
}

#[test]
fn add_concatenates_strings_and_chars() {
    let source = listing(&[
        (0, "LOAD_GLOBAL", "print"),
        (1, "LOAD_CONST", "\"ab\""),
        (2, "LOAD_CONST", "'c'"),
        (3, "BINARY_ADD", ""),
        (4, "LOAD_CONST", "“d”"),
        (5, "BINARY_ADD", ""),
        (6, "CALL_FUNCTION", "1"),
    ]);
    let (lines, _) = run(&source);
    assert_eq!(lines, ["abcd"]);
}

#[test]
fn arithmetic_uses_left_below_right_top() {
    let source = listing(&[
        (0, "LOAD_CONST", "17"),
        (1, "LOAD_CONST", "5"),
        (2, "BINARY_SUBSTRACT", ""),
        (3, "LOAD_CONST", "17"),
        (4, "LOAD_CONST", "5"),
        (5, "BINARY_DIVIDE", ""),
        (6, "LOAD_CONST", "17"),
        (7, "LOAD_CONST", "5"),
        (8, "BINARY_MODULO", ""),
        (9, "LOAD_CONST", "3"),
        (10, "LOAD_CONST", "True"),
        (11, "BINARY_MULTIPLY", ""),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(
        vm.stack(),
        &[Value::Int(12), Value::Int(3), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn division_and_modulo_by_zero_fail() {
    let divide = listing(&[
        (0, "LOAD_CONST", "1"),
        (1, "LOAD_CONST", "0"),
        (2, "BINARY_DIVIDE", ""),
    ]);
    assert_eq!(runtime_error(&divide), RuntimeError::DivisionByZero);

    let modulo = listing(&[
        (0, "LOAD_CONST", "1"),
        (1, "LOAD_CONST", "0.0"),
        (2, "BINARY_MODULO", ""),
    ]);
    assert_eq!(runtime_error(&modulo), RuntimeError::ModuloByZero);
}

#[test]
fn float_outside_int_range_overflows_on_add() {
    let source = listing(&[
        (0, "LOAD_CONST", "1.0e30"),
        (1, "LOAD_CONST", "0"),
        (2, "BINARY_ADD", ""),
    ]);
    assert_eq!(runtime_error(&source), RuntimeError::IntegerOverflow);
}

#[test]
fn numeric_equality_across_representations() {
    for (left, right) in [("1", "1.0"), ("1", "True"), ("1.0", "true")] {
        let source = listing(&[
            (0, "LOAD_CONST", left),
            (1, "LOAD_CONST", right),
            (2, "COMPARE_OP", "=="),
        ]);
        let (_, vm) = run(&source);
        assert_eq!(vm.stack(), &[Value::Bool(true)], "{} == {}", left, right);
    }
}

#[test]
fn comparison_operand_order() {
    let source = listing(&[
        (0, "LOAD_CONST", "1"),
        (1, "LOAD_CONST", "2"),
        (2, "COMPARE_OP", "<"),
        (3, "LOAD_CONST", "\"apple\""),
        (4, "LOAD_CONST", "\"banana\""),
        (5, "COMPARE_OP", ">="),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(vm.stack(), &[Value::Bool(true), Value::Bool(false)]);
}

#[test]
fn mixed_string_numeric_comparison_fails() {
    let source = listing(&[
        (0, "LOAD_CONST", "\"1\""),
        (1, "LOAD_CONST", "1"),
        (2, "COMPARE_OP", "=="),
    ]);
    assert!(matches!(
        runtime_error(&source),
        RuntimeError::UnsupportedComparison { .. }
    ));
}

#[test]
fn logical_operators_coerce_to_bool() {
    let source = listing(&[
        (0, "LOAD_CONST", "1"),
        (1, "LOAD_CONST", "0.0"),
        (2, "BINARY_AND", ""),
        (3, "LOAD_CONST", "0"),
        (4, "LOAD_CONST", "2"),
        (5, "BINARY_OR", ""),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(vm.stack(), &[Value::Bool(false), Value::Bool(true)]);

    let bad = listing(&[
        (0, "LOAD_CONST", "\"yes\""),
        (1, "LOAD_CONST", "1"),
        (2, "BINARY_AND", ""),
    ]);
    assert_eq!(runtime_error(&bad), RuntimeError::NotConvertibleToBool("str"));
}

#[test]
fn jump_to_unknown_index_fails() {
    let source = listing(&[(0, "JUMP_ABSOLUTE", "42"), (1, "END", "")]);
    assert_eq!(runtime_error(&source), RuntimeError::UnknownJumpTarget(42));
}

#[test]
fn jump_if_false_on_true_falls_through() {
    let source = listing(&[
        (0, "LOAD_CONST", "True"),
        (1, "JUMP_IF_FALSE", "99"),
        (2, "LOAD_CONST", "\"fell through\""),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(vm.stack(), &[Value::Str("fell through".into())]);
}

#[test]
fn jump_if_true_takes_branch() {
    let source = listing(&[
        (0, "LOAD_CONST", "3"),
        (1, "JUMP_IF_TRUE", "4"),
        (2, "LOAD_CONST", "\"skipped\""),
        (3, "END", ""),
        (4, "LOAD_CONST", "\"taken\""),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(vm.stack(), &[Value::Str("taken".into())]);
}

#[test]
fn build_list_preserves_order() {
    let source = listing(&[
        (0, "LOAD_CONST", "\"A\""),
        (1, "LOAD_CONST", "\"B\""),
        (2, "LOAD_CONST", "\"C\""),
        (3, "BUILD_LIST", "3"),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(vm.stack().len(), 1);
    assert_eq!(vm.stack()[0].to_string(), "[A, B, C]");
}

#[test]
fn store_subscr_then_binary_subscr_reads_back() {
    let source = listing(&[
        (0, "LOAD_CONST", "0"),
        (1, "LOAD_CONST", "0"),
        (2, "BUILD_LIST", "2"),
        (3, "STORE_FAST", "xs"),
        (4, "LOAD_CONST", "1"),
        (5, "LOAD_FAST", "xs"),
        (6, "LOAD_CONST", "'z'"),
        (7, "STORE_SUBSCR", ""),
        (8, "LOAD_FAST", "xs"),
        (9, "LOAD_CONST", "1.7"),
        (10, "BINARY_SUBSCR", ""),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(vm.stack(), &[Value::Char('z')]);
}

#[test]
fn nested_lists_render_recursively() {
    let source = listing(&[
        (0, "LOAD_GLOBAL", "print"),
        (1, "LOAD_CONST", "1"),
        (2, "LOAD_CONST", "2.5"),
        (3, "BUILD_LIST", "2"),
        (4, "LOAD_CONST", "False"),
        (5, "BUILD_LIST", "0"),
        (6, "BUILD_LIST", "3"),
        (7, "LOAD_GLOBAL", "len"),
        (8, "CALL_FUNCTION", "2"),
    ]);
    let (lines, _) = run(&source);
    assert_eq!(lines, ["[[1, 2.5], False, []] <func len>"]);
}

#[test]
fn subscript_errors() {
    let out_of_range = listing(&[
        (0, "LOAD_CONST", "1"),
        (1, "BUILD_LIST", "1"),
        (2, "LOAD_CONST", "1"),
        (3, "BINARY_SUBSCR", ""),
    ]);
    assert_eq!(runtime_error(&out_of_range), RuntimeError::InvalidIndex);

    let negative = listing(&[
        (0, "LOAD_CONST", "1"),
        (1, "BUILD_LIST", "1"),
        (2, "LOAD_CONST", "-1"),
        (3, "BINARY_SUBSCR", ""),
    ]);
    assert_eq!(runtime_error(&negative), RuntimeError::InvalidIndex);

    let string_index = listing(&[
        (0, "BUILD_LIST", "0"),
        (1, "LOAD_CONST", "\"0\""),
        (2, "BINARY_SUBSCR", ""),
    ]);
    assert_eq!(runtime_error(&string_index), RuntimeError::InvalidIndex);

    let not_a_list = listing(&[
        (0, "LOAD_CONST", "0"),
        (1, "LOAD_CONST", "\"abc\""),
        (2, "LOAD_CONST", "'x'"),
        (3, "STORE_SUBSCR", ""),
    ]);
    assert_eq!(runtime_error(&not_a_list), RuntimeError::ExpectedList("str"));
}

#[test]
fn list_cannot_be_stored_into_itself() {
    let source = listing(&[
        (0, "LOAD_CONST", "0"),
        (1, "BUILD_LIST", "1"),
        (2, "STORE_FAST", "xs"),
        (3, "LOAD_CONST", "0"),
        (4, "LOAD_FAST", "xs"),
        (5, "LOAD_FAST", "xs"),
        (6, "STORE_SUBSCR", ""),
    ]);
    assert_eq!(runtime_error(&source), RuntimeError::SelfReference);
}

#[test]
fn list_longer_than_a_thousand_elements_builds() {
    let mut rows: Vec<(usize, &str, &str)> = (0..1100).map(|i| (i, "LOAD_CONST", "1")).collect();
    rows.push((1100, "BUILD_LIST", "1100"));
    let (_, vm) = run(&listing(&rows));
    match vm.peek_top() {
        Some(Value::List(items)) => assert_eq!(items.borrow().len(), 1100),
        other => panic!("expected list, got {:?}", other),
    }
}

#[test]
fn deeply_nested_list_prints_stores_and_drops() {
    let source = listing(&[
        (0, "LOAD_CONST", "0"),
        (1, "BUILD_LIST", "1"),
        (2, "STORE_FAST", "holder"),
        (3, "BUILD_LIST", "0"),
        (4, "STORE_FAST", "x"),
        (5, "LOAD_CONST", "0"),
        (6, "STORE_FAST", "i"),
        // x = [x] until i reaches one million
        (7, "LOAD_FAST", "x"),
        (8, "BUILD_LIST", "1"),
        (9, "STORE_FAST", "x"),
        (10, "LOAD_FAST", "i"),
        (11, "LOAD_CONST", "1"),
        (12, "BINARY_ADD", ""),
        (13, "STORE_FAST", "i"),
        (14, "LOAD_FAST", "i"),
        (15, "LOAD_CONST", "1000000"),
        (16, "COMPARE_OP", "<"),
        (17, "JUMP_IF_TRUE", "7"),
        // holder[0] = x
        (18, "LOAD_CONST", "0"),
        (19, "LOAD_FAST", "holder"),
        (20, "LOAD_FAST", "x"),
        (21, "STORE_SUBSCR", ""),
        (22, "LOAD_GLOBAL", "print"),
        (23, "LOAD_FAST", "holder"),
        (24, "CALL_FUNCTION", "1"),
    ]);
    let (lines, vm) = run(&source);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].len(), 2_000_004);
    assert!(lines[0].starts_with("[[[") && lines[0].ends_with("]]]"));
    drop(vm);
}

#[test]
fn variable_errors() {
    let source = listing(&[(0, "LOAD_FAST", "missing")]);
    assert_eq!(
        runtime_error(&source),
        RuntimeError::UndefinedVariable("missing".into())
    );

    let store_empty = listing(&[(0, "STORE_FAST", "x")]);
    assert_eq!(runtime_error(&store_empty), RuntimeError::StackUnderflow);
}

#[test]
fn call_errors() {
    let unsupported = listing(&[
        (0, "LOAD_GLOBAL", "input"),
        (1, "CALL_FUNCTION", "0"),
    ]);
    assert_eq!(
        runtime_error(&unsupported),
        RuntimeError::UnsupportedFunction("input".into())
    );

    let not_callable = listing(&[
        (0, "LOAD_CONST", "1"),
        (1, "LOAD_CONST", "2"),
        (2, "CALL_FUNCTION", "1"),
    ]);
    assert_eq!(runtime_error(&not_callable), RuntimeError::ExpectedFunction("int"));

    let missing_args = listing(&[(0, "LOAD_GLOBAL", "print"), (1, "CALL_FUNCTION", "2")]);
    assert_eq!(runtime_error(&missing_args), RuntimeError::StackUnderflow);
}

#[test]
fn print_name_is_case_insensitive() {
    let source = listing(&[
        (0, "LOAD_GLOBAL", "PRINT"),
        (1, "LOAD_CONST", "0.5"),
        (2, "CALL_FUNCTION", "1"),
    ]);
    let (lines, _) = run(&source);
    assert_eq!(lines, ["0.5"]);
}

#[test]
fn unreached_unsupported_opcode_does_not_fail() {
    let source = listing(&[
        (0, "JUMP_ABSOLUTE", "3"),
        (1, "ROT_THREE", ""),
        (2, "LOAD_CONST", "not-a-literal"),
        (3, "LOAD_CONST", "\"ok\""),
    ]);
    let (_, vm) = run(&source);
    assert_eq!(vm.stack(), &[Value::Str("ok".into())]);
}

#[test]
fn reached_invalid_literal_fails() {
    // `None` has no literal form
    let source = listing(&[(0, "LOAD_CONST", "None")]);
    assert_eq!(
        runtime_error(&source),
        RuntimeError::InvalidLiteral("None".into())
    );
}

#[test]
fn reached_unsupported_opcode_fails() {
    let source = listing(&[(0, "POP_TOP", "")]);
    assert_eq!(
        runtime_error(&source),
        RuntimeError::UnsupportedOpcode("POP_TOP".into())
    );
}

#[test]
fn non_numeric_first_line_fails_to_load() {
    let err = ProgramLoader::load_str("\n\nLOAD_CONST\n1\n").unwrap_err();
    assert!(matches!(
        err,
        BcvmError::Parse(ParseError::ExpectedIndex { line: 3, .. })
    ));
}

#[test]
fn loads_program_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, "0\n\tLOAD_CONST\n  \"from disk\"  \n\n1\nEND\n").expect("write");

    let program = ProgramLoader::load_file(file.path()).expect("load failed");
    assert_eq!(program.len(), 2);

    let mut vm = VirtualMachine::with_output(BcvmConfig::new(), program, Vec::new());
    vm.run().expect("execution failed");
    assert_eq!(vm.stack(), &[Value::Str("from disk".into())]);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = ProgramLoader::load_file(dir.path().join("absent.bc")).unwrap_err();
    assert!(matches!(err, BcvmError::Io(_)));
}
