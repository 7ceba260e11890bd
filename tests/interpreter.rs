use scriptit::{
    diagnostics::{DiagnosticKind, ScriptError},
    runtime::{ExecutionContext, Interpreter},
    script,
    value::{Value, ValueKind},
};
use std::path::Path;
use tempfile::tempdir;

fn eval(source: &str) -> Value {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured());
    interpreter
        .eval_source(source)
        .expect("evaluation should succeed")
}

fn eval_error(source: &str) -> ScriptError {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured());
    match interpreter.eval_source(source) {
        Ok(value) => panic!("expected error, received value {value}"),
        Err(err) => err,
    }
}

/// Runs `source` and returns everything it printed.
fn output_of(source: &str) -> String {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured());
    interpreter
        .eval_source(source)
        .expect("evaluation should succeed");
    interpreter.context_mut().take_output()
}

fn display(source: &str) -> String {
    eval(source).to_string()
}

fn expect_int(value: &Value) -> i64 {
    match value.0.as_ref() {
        ValueKind::Int(n) => n.to_i64().expect("int fits in i64"),
        _ => panic!("expected int, found {}", value.type_name()),
    }
}

fn expect_float(value: &Value) -> f64 {
    match value.0.as_ref() {
        ValueKind::Float(f) => *f,
        _ => panic!("expected float, found {}", value.type_name()),
    }
}

fn expect_string(value: &Value) -> String {
    match value.0.as_ref() {
        ValueKind::String(s) => s.clone(),
        _ => panic!("expected string, found {}", value.type_name()),
    }
}

fn path_literal(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn evaluates_arithmetic_with_precedence() {
    assert_eq!(expect_int(&eval("2 + 3 * 4.")), 14);
    assert_eq!(expect_int(&eval("(2 + 3) * 4.")), 20);
    assert_eq!(expect_int(&eval("2 ^ 3 ^ 2.")), 512);
    assert_eq!(expect_int(&eval("-2 ^ 2.")), 4);
    assert_eq!(expect_int(&eval("10 - 4 - 3.")), 3);
}

#[test]
fn division_stays_integral_only_when_exact() {
    assert_eq!(expect_int(&eval("8 / 2.")), 4);
    assert_eq!(expect_float(&eval("7 / 2.")), 3.5);
    assert_eq!(expect_float(&eval("7.0 / 2.")), 3.5);
    assert_eq!(display("10 / 3."), "3.33333333333333");
}

#[test]
fn modulo_truncates_toward_zero() {
    assert_eq!(expect_int(&eval("7 % 3.")), 1);
    assert_eq!(expect_int(&eval("-7 % 2.")), -1);
    assert_eq!(expect_int(&eval("(-8 / 2) * 2 + (-7 % 2).")), -9);
}

#[test]
fn integers_promote_instead_of_overflowing() {
    assert_eq!(expect_int(&eval("1000000 * 1000000.")), 1_000_000_000_000);
    assert_eq!(
        display("9223372036854775807 + 1."),
        "9223372036854775808"
    );
    assert_eq!(display("2 ^ 100."), "1267650600228229401496703205376");
    assert_eq!(
        display("123456789012345678901234567890 - 123456789012345678901234567889."),
        "1"
    );
}

#[test]
fn short_circuit_skips_the_right_operand() {
    assert_eq!(expect_int(&eval("(1==1) || (10/0).")), 1);
    assert_eq!(expect_int(&eval("(1==0) && (10/0).")), 0);
    assert_eq!(expect_int(&eval("0 or 5.")), 1);
    assert_eq!(expect_int(&eval("not 0.")), 1);
    assert_eq!(expect_int(&eval("!0.")), 1);
    assert_eq!(expect_int(&eval("!1.")), 0);
}

#[test]
fn division_by_zero_is_reported() {
    let err = eval_error("1 / 0.");
    assert_eq!(err.kind(), DiagnosticKind::DivisionByZero);
    assert!(err.to_string().contains("Division by zero"), "{err}");

    let err = eval_error("5 % 0.");
    assert_eq!(err.kind(), DiagnosticKind::DivisionByZero);
    assert!(err.to_string().contains("Modulo by zero"), "{err}");

    assert_eq!(eval_error("1.5 / 0.0.").kind(), DiagnosticKind::DivisionByZero);
}

#[test]
fn comparisons_yield_one_or_zero() {
    assert_eq!(expect_int(&eval("3 < 4.")), 1);
    assert_eq!(expect_int(&eval("3 >= 4.")), 0);
    assert_eq!(expect_int(&eval("2 == 2.0.")), 1);
    assert_eq!(expect_int(&eval("1 == \"1\".")), 0);
    assert_eq!(expect_int(&eval("1 != \"1\".")), 1);
    assert_eq!(expect_int(&eval("1 is 1.")), 1);
    assert_eq!(expect_int(&eval("1 is not 2.")), 1);
    assert_eq!(expect_int(&eval("True == 1.")), 1);
    assert_eq!(eval_error("1 < \"a\".").kind(), DiagnosticKind::Type);
}

#[test]
fn string_operators() {
    assert_eq!(expect_string(&eval("\"ab\" * 3.")), "ababab");
    assert_eq!(expect_string(&eval("3 * \"ab\".")), "ababab");
    assert_eq!(expect_string(&eval("\"n=\" + 5.")), "n=5");
    assert_eq!(expect_string(&eval("2.5 + \"x\".")), "2.5x");
    assert_eq!(expect_int(&eval("\"abc\" == \"abc\".")), 1);
    assert_eq!(expect_int(&eval("\"apple\" < \"banana\".")), 1);
    assert_eq!(expect_string(&eval("'tab\\there'.")), "tab\there");
    assert_eq!(expect_string(&eval(r#""a\"b\\c\nd"."#)), "a\"b\\c\nd");
    assert_eq!(
        expect_string(&eval(r#"repr("a\"b\\c\nd")."#)),
        r#""a\"b\\c\nd""#
    );

    let err = eval_error("\"a\" - 1.");
    assert_eq!(err.kind(), DiagnosticKind::Type);
    assert!(err.to_string().contains("string and int"), "{err}");
    assert_eq!(eval_error("\"a\" * -1.").kind(), DiagnosticKind::Type);
}

#[test]
fn oversized_repetition_is_an_error() {
    for source in [
        "\"ab\" * 9223372036854775807.",
        "9223372036854775807 * \"ab\".",
        "[1, 2] * 9223372036854775807.",
        "\"ab\" * 100000000000000000000.",
    ] {
        let err = eval_error(source);
        assert_eq!(err.kind(), DiagnosticKind::Runtime, "{source}: {err}");
    }
    assert_eq!(expect_int(&eval("len(\"\" * 9223372036854775807).")), 0);
    assert_eq!(expect_int(&eval("len([] * 9223372036854775807).")), 0);
}

#[test]
fn implicit_multiplication() {
    assert_eq!(expect_int(&eval("var x = 3. 2x.")), 6);
    assert_eq!(expect_int(&eval("2(3 + 4).")), 14);
    assert_eq!(expect_int(&eval("(1 + 1)(2 + 3).")), 10);
    assert_eq!(expect_int(&eval("var x = 2. 3x^2.")), 12);
}

#[test]
fn functions_give_values() {
    assert_eq!(
        expect_int(&eval("fn add @(a,b): give(a+b). ; add(3,4).")),
        7
    );
    assert_eq!(expect_int(&eval("fn double(n): give n * 2. ; double(21).")), 42);
    assert!(eval("fn nothing(): pass. ; nothing().").is_none());
    assert!(eval("fn early(): give. ; early().").is_none());
    assert!(eval("fn empty(): give(). ; empty().").is_none());
}

#[test]
fn recursion_resolves_the_function_by_name() {
    let value = eval(
        r#"
        fn fact(n):
            if n <= 1: give 1. ;
            give n * fact(n - 1).
        ;
        fact(25).
        "#,
    );
    assert_eq!(value.to_string(), "15511210043330985984000000");
}

#[test]
fn if_chain_takes_the_first_true_branch() {
    let source = r#"
        fn classify(n):
            if n < 0: give "negative".
            elif n == 0: give "zero".
            elif n < 10: give "small".
            else: give "large".
            ;
        ;
    "#;
    for (arg, expected) in [("-5", "negative"), ("0", "zero"), ("3", "small"), ("99", "large")] {
        let value = eval(&format!("{source} classify({arg})."));
        assert_eq!(expect_string(&value), expected);
    }
}

#[test]
fn arity_mismatch_is_an_error() {
    let err = eval_error("fn f(a): give a. ; f(1, 2).");
    assert_eq!(err.kind(), DiagnosticKind::Arity);
    assert!(err.to_string().contains("expects 1 argument"), "{err}");

    assert_eq!(eval_error("len(1, 2).").kind(), DiagnosticKind::Arity);
}

#[test]
fn undefined_names_are_errors() {
    assert_eq!(eval_error("y + 1.").kind(), DiagnosticKind::UndefinedVariable);
    assert_eq!(eval_error("missing(1).").kind(), DiagnosticKind::UndefinedVariable);
    assert_eq!(eval_error("z = 3.").kind(), DiagnosticKind::UndefinedVariable);

    let err = eval_error("var n = 1. n(2).");
    assert_eq!(err.kind(), DiagnosticKind::Type);
}

#[test]
fn functions_cannot_write_outer_bindings() {
    let err = eval_error(
        r#"
        var counter = 1.
        fn bump(): counter = counter + 1. ;
        bump().
        "#,
    );
    assert_eq!(err.kind(), DiagnosticKind::UndefinedVariable);
    assert!(err.to_string().contains("counter"), "{err}");

    let err = eval_error("var total = 0. fn add(): total += 1. ; add().");
    assert_eq!(err.kind(), DiagnosticKind::UndefinedVariable);
}

#[test]
fn functions_read_outer_bindings_and_keep_locals_private() {
    let value = eval(
        r#"
        var base = 10.
        fn add(n):
            var local = n.
            give base + local.
        ;
        add(5).
        "#,
    );
    assert_eq!(expect_int(&value), 15);

    let err = eval_error("fn f(): var hidden = 1. ; f(). hidden.");
    assert_eq!(err.kind(), DiagnosticKind::UndefinedVariable);
}

#[test]
fn blocks_share_the_enclosing_scope() {
    assert_eq!(expect_int(&eval("var x = 1. if x == 1: x = 5. ; x.")), 5);
    assert_eq!(
        expect_int(&eval("var n=5. var s=0. while n>0: s=s+n. n=n-1. ; s.")),
        15
    );
    assert_eq!(expect_int(&eval("if 1: var made = 7. ; made.")), 7);
    assert_eq!(
        expect_int(&eval("fn f(): var t = 0. for i in range(from 1 to 4): t += i. ; give t. ; f().")),
        10
    );
}

#[test]
fn closures_capture_their_defining_scope() {
    let value = eval(
        r#"
        fn make_adder():
            var base = 10.
            fn inner(n): give base + n. ;
            give inner.
        ;
        var add10 = make_adder().
        add10(5).
        "#,
    );
    assert_eq!(expect_int(&value), 15);
}

#[test]
fn range_loops_are_inclusive_in_both_directions() {
    assert_eq!(
        output_of("for i in range(from 5 to 1): print(i). ;"),
        "5\n4\n3\n2\n1\n"
    );
    assert_eq!(
        output_of("for i in range(from 1 to 3): print(i). ;"),
        "1\n2\n3\n"
    );
    assert_eq!(expect_int(&eval("for i in range(from 1 to 3): pass. ; i.")), 3);
    assert_eq!(expect_int(&eval("var n = 0. for i in range(3): n += 1. ; n.")), 4);
    assert_eq!(
        expect_int(&eval("var s = 0. for i in range(from 0 to 10 step 5): s += i. ; s.")),
        15
    );
    assert_eq!(
        output_of("for i in range(from 10 to 1 step -4): print(i). ;"),
        "10\n6\n2\n"
    );

    let err = eval_error("for i in range(from 1 to 3 step 0): pass. ;");
    assert_eq!(err.kind(), DiagnosticKind::Runtime);
}

#[test]
fn for_in_iterates_containers() {
    assert_eq!(
        expect_string(&eval("var out = \"\". for c in \"abc\": out = out + c + \"-\". ; out.")),
        "a-b-c-"
    );
    assert_eq!(
        expect_int(&eval("var t = 0. for x in [1, 2, 3]: t += x. ; t.")),
        6
    );
    assert_eq!(expect_int(&eval("var t = 0. for x in {4, 4, 5}: t += x. ; t.")), 9);
    assert_eq!(eval_error("for x in 5: pass. ;").kind(), DiagnosticKind::Type);
}

#[test]
fn compound_assignment_and_steps() {
    assert_eq!(
        expect_int(&eval("var n = 5. n += 2. n *= 3. n -= 1. n.")),
        20
    );
    assert_eq!(expect_int(&eval("var k = 7. k %= 4. k.")), 3);
    assert_eq!(expect_float(&eval("var k = 3. k /= 2. k.")), 1.5);
    assert_eq!(expect_int(&eval("var i = 1. i++. i++. i--. i.")), 2);
    assert_eq!(expect_int(&eval("var i = 1. ++i. --i. --i. i.")), 0);
}

#[test]
fn var_let_and_multiple_declarations() {
    assert_eq!(expect_int(&eval("var a = 1, b = 2, c. a + b.")), 3);
    assert!(eval("var a, b. b.").is_none());
    assert_eq!(expect_int(&eval("let x be 9. x.")), 9);
}

#[test]
fn lists_are_never_mutated_in_place() {
    let value = eval(
        r#"
        var xs = [1, 2, 3].
        var ys = append(xs, 4).
        pop(ys) == 4 and len(xs) == 3 and len(ys) == 4 and pop(xs) == 3 and len(xs) == 3.
        "#,
    );
    assert_eq!(expect_int(&value), 1);
    assert_eq!(display("[1, 2] + [3]."), "[1, 2, 3]");
    assert_eq!(display("[0] * 3."), "[0, 0, 0]");
    assert_eq!(display("list()."), "[]");
    assert_eq!(expect_int(&eval("[1, 2] < [1, 3].")), 1);
    assert_eq!(eval_error("pop([]).").kind(), DiagnosticKind::Runtime);
}

#[test]
fn sets_deduplicate_by_value() {
    assert_eq!(expect_int(&eval("len({1, 2, 3, 2}).")), 3);
    assert_eq!(expect_int(&eval("{1, 2, 3, 2} == {3, 2, 1}.")), 1);
    assert_eq!(expect_int(&eval("len(set()).")), 0);
    assert_eq!(expect_int(&eval("len(set([1, 1.0, \"1\"])).")), 2);
    assert_eq!(expect_int(&eval("len(append({1, 2}, 2)).")), 2);
}

#[test]
fn conversions_and_type_names() {
    assert_eq!(expect_int(&eval("int(3.9).")), 3);
    assert_eq!(expect_int(&eval("int(-3.9).")), -3);
    assert_eq!(expect_int(&eval("int(\" 42 \").")), 42);
    assert_eq!(expect_float(&eval("float(2).")), 2.0);
    assert_eq!(expect_float(&eval("float(\"2.5\").")), 2.5);
    assert_eq!(expect_string(&eval("str(42) + \"!\".")), "42!");
    assert_eq!(eval_error("int(\"abc\").").kind(), DiagnosticKind::Type);

    for (source, name) in [
        ("type(1).", "int"),
        ("type(1.5).", "float"),
        ("type(\"s\").", "string"),
        ("type(True).", "bool"),
        ("type(None).", "none"),
        ("type([1]).", "list"),
        ("type({1}).", "set"),
        ("fn f(): pass. ; type(f).", "function"),
    ] {
        assert_eq!(expect_string(&eval(source)), name, "{source}");
    }
}

#[test]
fn display_forms() {
    assert_eq!(display("sqrt(16)."), "4");
    assert_eq!(display("10 / 4."), "2.5");
    assert_eq!(display("True."), "True");
    assert_eq!(display("None."), "None");
    assert_eq!(display("[1, \"a\", 2.5]."), "[1, \"a\", 2.5]");
    assert_eq!(display("{\"x\"}."), "{\"x\"}");
    assert_eq!(display("fn f(): pass. ; f."), "<fn f>");
    assert_eq!(display("PI."), "3.14159265");
    assert_eq!(display("e."), "2.7182818");
}

#[test]
fn builtin_math() {
    assert_eq!(expect_int(&eval("abs(-5).")), 5);
    assert_eq!(expect_float(&eval("abs(-2.5).")), 2.5);
    assert_eq!(expect_int(&eval("floor(2.7).")), 2);
    assert_eq!(expect_int(&eval("ceil(2.1).")), 3);
    assert_eq!(expect_int(&eval("round(2.5).")), 3);
    assert_eq!(expect_int(&eval("pow(2, 10).")), 1024);
    assert_eq!(expect_int(&eval("min(3, 1, 2).")), 1);
    assert_eq!(expect_int(&eval("max([4, 9, 2]).")), 9);
    assert_eq!(expect_float(&eval("sin(0).")), 0.0);
    assert!((expect_float(&eval("log10(1000).")) - 3.0).abs() < 1e-12);
    assert!((expect_float(&eval("log2(8).")) - 3.0).abs() < 1e-12);
    assert!((expect_float(&eval("cos(PI).")) + 1.0).abs() < 1e-6);
    assert_eq!(eval_error("sqrt(\"x\").").kind(), DiagnosticKind::Type);
}

#[test]
fn builtin_collections() {
    assert_eq!(expect_int(&eval("sum([1, 2, 3]).")), 6);
    assert_eq!(expect_int(&eval("sum([1, 2], 10).")), 13);
    assert_eq!(display("sorted([3, 1, 2])."), "[1, 2, 3]");
    assert_eq!(display("sorted([3, 1, 2], True)."), "[3, 2, 1]");
    assert_eq!(display("reversed([1, 2, 3])."), "[3, 2, 1]");
    assert_eq!(expect_string(&eval("reversed(\"abc\").")), "cba");
    assert_eq!(expect_int(&eval("all([1, 1, 0]).")), 0);
    assert_eq!(expect_int(&eval("any([0, 0, 1]).")), 1);
    assert_eq!(display("range_list(3, 1)."), "[3, 2, 1]");
    assert_eq!(expect_int(&eval("len(\"héllo\").")), 5);
    assert_eq!(expect_int(&eval("isinstance(1, \"int\").")), 1);
    assert_eq!(display("bool(0)."), "False");
    assert_eq!(expect_string(&eval("repr(\"a\").")), "\"a\"");
    assert_eq!(eval_error("sorted([1, \"a\"]).").kind(), DiagnosticKind::Type);
}

#[test]
fn print_and_pprint_write_to_the_context() {
    assert_eq!(output_of("print(\"a\", 1, [\"b\"])."), "a 1 [\"b\"]\n");
    assert_eq!(output_of("pprint(\"a\")."), "\"a\"\n");
    assert_eq!(output_of("print()."), "\n");
}

#[test]
fn input_reads_from_the_configured_source() {
    let context = ExecutionContext::captured().with_input_lines(["Ada"]);
    let mut interpreter = Interpreter::with_context(context);
    interpreter
        .eval_source("var name = input(\"name? \"). print(\"hi \" + name).")
        .expect("input should succeed");
    assert_eq!(interpreter.context_mut().take_output(), "name? hi Ada\n");

    assert_eq!(eval_error("input().").kind(), DiagnosticKind::Io);
}

#[test]
fn echo_prints_expression_statements() {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured().with_echo(true));
    interpreter
        .eval_source("1 + 1. print(\"x\"). \"s\". None.")
        .expect("evaluation should succeed");
    assert_eq!(interpreter.context_mut().take_output(), "2\nx\ns\n");
}

#[test]
fn file_builtins_round_trip() {
    let temp = tempdir().expect("create temp dir");
    let file = path_literal(&temp.path().join("notes.txt"));

    let value = eval(&format!(
        r#"
        write("{file}", "hello").
        write("{file}", " world", "a").
        read("{file}").
        "#
    ));
    assert_eq!(expect_string(&value), "hello world");

    let value = eval(&format!(
        r#"
        write("{file}", "one\ntwo").
        readLine("{file}").
        "#
    ));
    assert_eq!(value.to_string(), "[\"one\", \"two\"]");

    let missing = path_literal(&temp.path().join("missing.txt"));
    let err = eval_error(&format!("read(\"{missing}\")."));
    assert_eq!(err.kind(), DiagnosticKind::Io);
}

#[test]
fn comments_are_skipped() {
    assert_eq!(expect_int(&eval("--> block\ncomment <-- 1 + 1. # trailing")), 2);
    assert_eq!(expect_int(&eval("# only a comment\n3.")), 3);
}

#[test]
fn syntax_errors() {
    for source in [
        "var x = 1 var y = 2.",
        "fn f(a, a): pass. ;",
        "fn f(): ;",
        "\"unterminated",
        "1 $ 2.",
        "if 1: pass.",
        "for i in range(from 1 3): pass. ;",
    ] {
        let err = eval_error(source);
        assert_eq!(err.kind(), DiagnosticKind::Syntax, "{source}: {err}");
    }

    let err = eval_error("var x = 1 var y = 2.");
    assert!(err.to_string().contains("found `var`"), "{err}");
    let err = eval_error("fn f(): ;");
    assert!(err.to_string().contains("use `pass`"), "{err}");
}

#[test]
fn terminator_is_optional_before_block_ends() {
    assert_eq!(expect_int(&eval("var x = 0. if 1: x = 1 ; x")), 1);
    assert_eq!(expect_int(&eval("var x = 0. if 0: x = 1 else: x = 2 ; x")), 2);
}

#[test]
fn give_outside_a_function_is_rejected() {
    let err = eval_error("give 5.");
    assert_eq!(err.kind(), DiagnosticKind::Runtime);
}

#[test]
fn errors_keep_bindings_made_before_the_failure() {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured());
    assert!(interpreter.eval_source("var a = 1. var b = 1 / 0.").is_err());
    let value = interpreter.eval_source("a.").expect("a is still bound");
    assert_eq!(expect_int(&value), 1);
}

#[test]
fn reset_restores_initial_constants() {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured());
    interpreter.eval_source("var x = 1.").expect("define x");
    interpreter.reset();
    assert_eq!(
        interpreter.eval_source("x.").expect_err("x is gone").kind(),
        DiagnosticKind::UndefinedVariable
    );
    assert_eq!(interpreter.eval_source("PI.").expect("PI").to_string(), "3.14159265");
}

#[test]
fn scripts_continue_after_a_failing_statement() {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured().with_echo(true));
    let summary = script::run_source(
        &mut interpreter,
        "print(\"before\").\nvar x = 1 / 0.\nprint(\"after\").\n1 + 2.",
    )
    .expect("script should run");

    assert_eq!(summary.executed, 4);
    assert_eq!(summary.failed, 1);
    assert!(!summary.succeeded());
    let output = interpreter.context_mut().take_output();
    assert_eq!(
        output,
        "before\nError: DivisionByZeroError: Division by zero (line 2)\nafter\n3\n"
    );
}

#[test]
fn scripts_with_syntax_errors_run_nothing() {
    let mut interpreter = Interpreter::with_context(ExecutionContext::captured());
    let summary = script::run_source(&mut interpreter, "print(\"never\").\nvar = 3.")
        .expect("script should run");

    assert!(summary.syntax_error);
    assert_eq!(summary.executed, 0);
    let output = interpreter.context_mut().take_output();
    assert!(output.starts_with("Error: SyntaxError:"), "{output}");
    assert!(!output.contains("never"));
}

#[test]
fn recursion_runs_on_the_default_test_stack() {
    let value = eval("fn s(n): if n == 0: give 0. ; give n + s(n - 1). ; s(100).");
    assert_eq!(expect_int(&value), 5050);
}

#[test]
fn recursion_through_nested_blocks_reaches_the_depth_limit() {
    let source = r#"
        fn dive(n):
            var result = 0.
            while 1:
                for i in range(from 1 to 1):
                    if n > 0: result = dive(n - 1) + 1. ;
                ;
                give result.
            ;
        ;
    "#;
    assert_eq!(expect_int(&eval(&format!("{source} dive(199)."))), 199);

    let err = eval_error(&format!("{source} dive(200)."));
    assert_eq!(err.kind(), DiagnosticKind::Runtime);
    assert!(err.to_string().contains("maximum call depth"), "{err}");
}

#[test]
fn deeply_nested_source_is_a_syntax_error() {
    let parens = format!("{}1{}.", "(".repeat(20_000), ")".repeat(20_000));
    let err = eval_error(&parens);
    assert_eq!(err.kind(), DiagnosticKind::Syntax);
    assert!(err.to_string().contains("nested"), "{err}");

    let negations = format!("{}1.", "- ".repeat(20_000));
    assert_eq!(eval_error(&negations).kind(), DiagnosticKind::Syntax);

    let blocks = format!("{}pass.{}", "if 1: ".repeat(5_000), " ;".repeat(5_000));
    assert_eq!(eval_error(&blocks).kind(), DiagnosticKind::Syntax);

    let shallow = format!("{}7{}.", "(".repeat(100), ")".repeat(100));
    assert_eq!(expect_int(&eval(&shallow)), 7);
}

#[test]
fn string_methods_return_new_strings() {
    assert_eq!(display("\"hello\".upper()."), "HELLO");
    assert_eq!(display("\"HELLO\".lower()."), "hello");
    assert_eq!(display("\"  hi  \".strip()."), "hi");
    assert_eq!(display("\"hello world\".title()."), "Hello World");
    assert_eq!(display("\"hELLO\".capitalize()."), "Hello");
    assert_eq!(display("\"hello\".reverse()."), "olleh");
    assert_eq!(display("\"a,b,c\".split(\",\")."), "[\"a\", \"b\", \"c\"]");
    assert_eq!(display("\" a  b \".split()."), "[\"a\", \"b\"]");
    assert_eq!(expect_int(&eval("\"hello world\".find(\"world\").")), 6);
    assert_eq!(expect_int(&eval("\"hello\".find(\"xyz\").")), -1);
    assert_eq!(expect_int(&eval("\"banana\".count(\"a\").")), 3);
    assert_eq!(display("\"hello world\".replace(\"world\", \"earth\")."), "hello earth");
    assert_eq!(display("\"hello world\".slice(0, 5)."), "hello");
    assert_eq!(display("\"hello\".slice(-3, 10)."), "llo");
    assert_eq!(
        output_of(concat!(
            "print(\"hello\".contains(\"ell\"), \"hello\".contains(\"xyz\")).\n",
            "print(\"hello\".startswith(\"hel\"), \"hello\".endswith(\"xyz\")).\n",
            "print(\"123\".isdigit(), \"12a\".isdigit()).\n",
            "print(\"abc\".isalpha(), \"ab1\".isalpha()).\n",
        )),
        "True False\nTrue False\nTrue False\nTrue False\n"
    );

    let value = eval("var s = \"  Mixed  \". var t = s.strip().lower(). s + \"|\" + t.");
    assert_eq!(expect_string(&value), "  Mixed  |mixed");
}

#[test]
fn list_and_set_methods() {
    assert_eq!(display("[3, 1, 2].sort()."), "[1, 2, 3]");
    assert_eq!(display("[1, 2, 3].reverse()."), "[3, 2, 1]");
    assert_eq!(display("[1, 2, 3].contains(2)."), "True");
    assert_eq!(display("[1, 2, 3].contains(5)."), "False");
    assert_eq!(expect_int(&eval("[1, 2, 2, 3, 2].count(2).")), 3);
    assert_eq!(expect_int(&eval("[10, 20, 30].index(20).")), 1);
    assert_eq!(expect_int(&eval("[10, 20, 30].index(99).")), -1);

    let value = eval("var s = {1, 2}. var s2 = s.add(3). len(s2) * 10 + len(s).");
    assert_eq!(expect_int(&value), 32);
    assert_eq!(expect_int(&eval("len({1, 2}.add(2)).")), 2);
    assert_eq!(expect_int(&eval("len({1, 2, 3}.remove(2)).")), 2);
    assert_eq!(display("{1, 2, 3}.contains(2)."), "True");
    assert_eq!(eval_error("{1}.remove(5).").kind(), DiagnosticKind::Runtime);

    let value = eval("var xs = [3, 1, 2]. var ys = xs.sort(). xs.").to_string();
    assert_eq!(value, "[3, 1, 2]");
}

#[test]
fn method_lookup_errors() {
    let err = eval_error("\"abc\".sort().");
    assert_eq!(err.kind(), DiagnosticKind::Type);
    assert!(err.to_string().contains("unknown method `sort` on string"), "{err}");

    let err = eval_error("\"abc\".upper(1).");
    assert_eq!(err.kind(), DiagnosticKind::Arity);
    assert_eq!(eval_error("[1, \"a\"].sort().").kind(), DiagnosticKind::Type);
    assert_eq!(display("5.type()."), "int");
    assert_eq!(expect_int(&eval("[1, 2].len().")), 2);
}

#[test]
fn a_spaced_dot_still_ends_the_statement() {
    let value = eval("fn upper(s): give \"user\". ; var x = \"a\". upper(x).");
    assert_eq!(expect_string(&value), "user");
    assert_eq!(output_of("print(1).\nprint(2)."), "1\n2\n");
}

#[test]
fn of_calls_a_method_on_the_value_after_it() {
    assert_eq!(display("var name = \"hello\". upper() of name."), "HELLO");
    assert_eq!(
        display("var s = \"hello world\". replace(\"world\", \"earth\") of s."),
        "hello earth"
    );
    assert_eq!(output_of("print(upper() of \"hi\")."), "HI\n");
    assert_eq!(eval_error("1 of \"x\".").kind(), DiagnosticKind::Syntax);
}

#[test]
fn points_compares_type_and_value() {
    assert_eq!(expect_int(&eval("10 points 10.")), 1);
    assert_eq!(expect_int(&eval("10 points 20.")), 0);
    assert_eq!(expect_int(&eval("10 points 10.0.")), 0);
    assert_eq!(expect_int(&eval("True points 1.")), 0);
    assert_eq!(expect_int(&eval("\"a\" points \"a\".")), 1);
    assert_eq!(expect_int(&eval("10 not points 20.")), 1);
    assert_eq!(expect_int(&eval("10 not points 10.")), 0);
    assert_eq!(expect_int(&eval("10 not points 10.0.")), 1);
}

#[test]
fn functions_overload_by_arity() {
    let source = r#"
        fn add(a, b): give a + b. ;
        fn add(a, b, c): give a + b + c. ;
    "#;
    assert_eq!(
        output_of(&format!("{source} print(add(1, 2)). print(add(1, 2, 3)).")),
        "3\n6\n"
    );

    let err = eval_error(&format!("{source} add(1)."));
    assert_eq!(err.kind(), DiagnosticKind::Arity);
    assert!(err.to_string().contains("no overload of `add` takes 1 argument"), "{err}");

    assert_eq!(
        expect_int(&eval("fn f(a, b): give a. ; fn f(a, b): give b. ; f(1, 2).")),
        2
    );
}

#[test]
fn forward_declarations_are_filled_in_later() {
    let value = eval(
        r#"
        fn my_func(a, b).
        fn my_func(a, b): give a + b. ;
        my_func(10, 20).
        "#,
    );
    assert_eq!(expect_int(&value), 30);

    assert_eq!(
        expect_int(&eval("fn g(x): give x * 2. ; fn g(x). g(4).")),
        8
    );

    let err = eval_error("fn later(x). later(1).");
    assert_eq!(err.kind(), DiagnosticKind::Runtime);
    assert!(err.to_string().contains("declared but never defined"), "{err}");
}

#[test]
fn enumerate_zip_and_map() {
    assert_eq!(display("enumerate([\"a\", \"b\"])."), "[[0, \"a\"], [1, \"b\"]]");
    assert_eq!(display("zip([1, 2, 3], [\"x\", \"y\"])."), "[[1, \"x\"], [2, \"y\"]]");
    assert_eq!(
        display("fn double(n): give n * 2. ; map(double, [1, 2, 3])."),
        "[2, 4, 6]"
    );
    assert_eq!(display("map(\"str\", [1, 2])."), "[\"1\", \"2\"]");
    assert_eq!(eval_error("map(1, [1]).").kind(), DiagnosticKind::Type);
    assert_eq!(eval_error("map([1]).").kind(), DiagnosticKind::Arity);
    assert_eq!(eval_error("zip(1, [1]).").kind(), DiagnosticKind::Type);
}
