//! End-to-end scenarios, run through `Engine::run_str` against a whole
//! program rather than a single pipeline stage. Mirrors the one-file-per-
//! concern layout of the teacher's own `tests/*.rs`.

use convo::config::RunnerConfig;
use convo::value::Value;
use convo::Engine;

fn engine() -> Engine {
    Engine::new(RunnerConfig::default())
}

#[test]
fn s1_hello_world() {
    let e = engine();
    e.run_str("Say \"Hello, World!\"\n").unwrap();
}

#[test]
fn s2_arithmetic_and_string_concatenation() {
    let e = engine();
    e.run_str(concat!(
        "Let price be 19.99\n",
        "Let qty be 3\n",
        "Let total be price * qty\n",
        "Say \"Total: \" + total\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("total"), Some(Value::Number(n)) if (n - 59.97).abs() < 1e-9));
}

#[test]
fn s3_while_counter() {
    let e = engine();
    e.run_str(concat!(
        "Let c be 1\n",
        "While c less than 4 do:\n",
        "    Say c\n",
        "    Let c be c + 1\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("c"), Some(Value::Number(n)) if n == 4.0));
}

#[test]
fn s4_function_and_recursion() {
    let e = engine();
    e.run_str(concat!(
        "Define fact with n:\n",
        "    If n less than 2 then:\n",
        "        Return 1\n",
        "    Return n * fact(n - 1)\n",
        "Let result be fact(5)\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("result"), Some(Value::Number(n)) if n == 120.0));
}

#[test]
fn s5_try_catch_division_by_zero() {
    let e = engine();
    e.run_str(concat!(
        "Let message be \"none\"\n",
        "Try:\n",
        "    Let x be 10 / 0\n",
        "Catch err:\n",
        "    Let message be err\n",
    ))
    .unwrap();
    match e.global_env().get("message") {
        Some(Value::Str(s)) => assert!(s.contains("division by zero")),
        other => panic!("expected a caught error string, got {other:?}"),
    }
}

#[test]
fn s6_for_each_over_a_list() {
    let e = engine();
    e.run_str(concat!(
        "Let xs be [1, 2, 3, 4]\n",
        "Let sum be 0\n",
        "For each v in xs do:\n",
        "    Let sum be sum + v\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("sum"), Some(Value::Number(n)) if n == 10.0));
}

#[test]
fn stop_halts_the_program_cleanly() {
    let e = engine();
    e.run_str(concat!(
        "Let reached be false\n",
        "Stop\n",
        "Let reached be true\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("reached"), Some(Value::Bool(false))));
}

#[test]
fn throw_uncaught_propagates_as_an_error() {
    let e = engine();
    let err = e.run_str("Throw \"boom\"\n").unwrap_err();
    assert_eq!(err.kind.label(), "Thrown");
}

#[test]
fn class_constructor_and_method_mutate_instance_state() {
    let e = engine();
    e.run_str(concat!(
        "Define Counter with start:\n",
        "    Let this.count be start\n",
        "    Define bump with by:\n",
        "        Let this.count be this.count + by\n",
        "        Return this.count\n",
        "Let c be New Counter with 10\n",
        "Let after be c.bump(5)\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("after"), Some(Value::Number(n)) if n == 15.0));
}

#[test]
fn dict_keys_and_contains_compose() {
    let e = engine();
    e.run_str(concat!(
        "Let person be {\"name\": \"Ada\", \"age\": 30}\n",
        "Let names be keys(person)\n",
        "Let has_age be contains(person, \"age\")\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("has_age"), Some(Value::Bool(true))));
    match e.global_env().get("names") {
        Some(Value::List(items)) => assert_eq!(items.borrow().len(), 2),
        other => panic!("expected a list of keys, got {other:?}"),
    }
}

#[test]
fn append_via_call_statement_mutates_list_in_place() {
    let e = engine();
    e.run_str(concat!(
        "Let xs be [1, 2]\n",
        "Call append with xs, 3\n",
        "Let len_after be length(xs)\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("len_after"), Some(Value::Number(n)) if n == 3.0));
}

#[test]
fn and_or_not_short_circuit_and_negate() {
    let e = engine();
    e.run_str(concat!(
        "Let a be true\n",
        "Let b be false\n",
        "Let both be a and b\n",
        "Let either be a or b\n",
        "Let neither be not either\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("both"), Some(Value::Bool(false))));
    assert!(matches!(e.global_env().get("either"), Some(Value::Bool(true))));
    assert!(matches!(e.global_env().get("neither"), Some(Value::Bool(false))));
}

#[test]
fn nested_closures_capture_their_defining_scope() {
    let e = engine();
    e.run_str(concat!(
        "Define make_adder with n:\n",
        "    Define add with x:\n",
        "        Return x + n\n",
        "    Return add\n",
        "Let add5 be make_adder(5)\n",
        "Let result be add5(10)\n",
    ))
    .unwrap();
    assert!(matches!(e.global_env().get("result"), Some(Value::Number(n)) if n == 15.0));
}

#[test]
fn repl_line_prints_single_expression_value_without_binding() {
    let e = engine();
    e.run_str("Let x be 41\n").unwrap();
    let v = e.run_repl_line("x + 1\n").unwrap();
    assert!(matches!(v, Some(Value::Number(n)) if n == 42.0));
}
