//! Targeted tests for the language's cross-cutting properties: scoping,
//! closure capture, signal propagation, and truthiness consistency across
//! every construct that branches on a value.

use convo::config::RunnerConfig;
use convo::value::Value;
use convo::Engine;

fn engine() -> Engine {
    Engine::new(RunnerConfig::default())
}

#[test]
fn scoping_function_locals_do_not_leak_to_call_site() {
    let e = engine();
    e.run_str(concat!(
        "Define f with x:\n",
        "    Let y be x + 1\n",
        "    Return y\n",
        "Let result be f(3)\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("result"), Some(Value::Number(n)) if n == 4.0));
    assert!(e.global_env().get("y").is_none());
}

#[test]
fn closure_capture_sees_outer_params_at_call_time() {
    let e = engine();
    e.run_str(concat!(
        "Define outer with base:\n",
        "    Let scale be 2\n",
        "    Define inner with x:\n",
        "        Return (x + base) * scale\n",
        "    Return inner(10)\n",
        "Let result be outer(5)\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("result"), Some(Value::Number(n)) if n == 30.0));
}

#[test]
fn return_inside_while_inside_function_exits_the_function_not_just_the_loop() {
    let e = engine();
    e.run_str(concat!(
        "Define first_over with xs, limit:\n",
        "    Let i be 0\n",
        "    While i less than length(xs) do:\n",
        "        If xs[i] greater than limit then:\n",
        "            Return xs[i]\n",
        "        Let i be i + 1\n",
        "    Return null\n",
        "Let found be first_over([1, 2, 9, 4], 5)\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("found"), Some(Value::Number(n)) if n == 9.0));
}

#[test]
fn throw_inside_nested_blocks_reaches_nearest_enclosing_catch() {
    let e = engine();
    e.run_str(concat!(
        "Let caught be \"no\"\n",
        "Try:\n",
        "    While true do:\n",
        "        If true then:\n",
        "            Throw \"deep\"\n",
        "Catch e:\n",
        "    Let caught be e\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("caught"), Some(Value::Str(s)) if &*s == "deep"));
}

#[test]
fn truthiness_is_consistent_across_if_while_and_and_or_not() {
    let e = engine();
    e.run_str(concat!(
        "Let zero_is_truthy be false\n",
        "If 0 then:\n",
        "    Let zero_is_truthy be true\n",
        "Let empty_string_is_truthy be false\n",
        "If \"\" then:\n",
        "    Let empty_string_is_truthy be true\n",
        "Let null_is_falsy be true\n",
        "If null then:\n",
        "    Let null_is_falsy be false\n",
        "Let loops be 0\n",
        "While loops less than 1 and not false do:\n",
        "    Let loops be loops + 1\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("zero_is_truthy"), Some(Value::Bool(true))));
    assert!(matches!(e.global_env().get("empty_string_is_truthy"), Some(Value::Bool(true))));
    assert!(matches!(e.global_env().get("null_is_falsy"), Some(Value::Bool(true))));
    assert!(matches!(e.global_env().get("loops"), Some(Value::Number(n)) if n == 1.0));
}

#[test]
fn determinism_running_twice_yields_identical_bindings() {
    let source = concat!(
        "Let xs be [5, 3, 8, 1]\n",
        "Let total be 0\n",
        "For each v in xs do:\n",
        "    Let total be total + v\n",
    );
    let a = engine();
    a.run_str(source).unwrap();
    let b = engine();
    b.run_str(source).unwrap();
    match (a.global_env().get("total"), b.global_env().get("total")) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => assert_eq!(x, y),
        other => panic!("expected matching numeric totals, got {other:?}"),
    }
}

#[test]
fn parse_failure_reports_a_line_number_within_source_bounds() {
    let e = engine();
    let err = e.run_str("Say 1\nLet\n").unwrap_err();
    assert!(err.line >= 1 && err.line <= 2);
    assert_eq!(err.kind.label(), "SyntaxError");
}

#[test]
fn unresolved_identifier_error_reports_its_source_line() {
    let e = engine();
    let err = e.run_str("Say 1\nSay missing\n").unwrap_err();
    assert_eq!(err.kind.label(), "NameError");
    assert_eq!(err.line, 2);
    assert_eq!(format!("{err}"), "NameError: 'missing' is not defined (line 2)");
}

#[test]
fn return_outside_any_function_is_rejected_at_parse_time() {
    let e = engine();
    let err = e.run_str("Let x be 1\nReturn x\n").unwrap_err();
    assert_eq!(err.kind.label(), "SyntaxError");
}

#[test]
fn well_formed_program_always_produces_a_runnable_ast() {
    let e = engine();
    e.run_str(concat!(
        "Let a be 1\n",
        "Let b be 2\n",
        "If a less than b then:\n",
        "    Say \"a is smaller\"\n",
        "Else:\n",
        "    Say \"a is not smaller\"\n",
    ))
    .unwrap();
}
