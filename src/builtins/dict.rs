//! `keys`, `values`, `contains`: listed against both the list and dict
//! categories in the built-ins table, so one polymorphic implementation
//! backs each name rather than two competing entries in the flat registry.
//! `contains` additionally accepts a string receiver, covering the string
//! category's own listing of the same name.

use super::{expect_arity, BuiltinFn, Package};
use crate::error::{ConvoError, ConvoResult};
use crate::value::Value;
use std::collections::HashMap;

pub struct DictPackage;

impl Package for DictPackage {
    fn register(&self, table: &mut HashMap<&'static str, BuiltinFn>) {
        table.insert("keys", keys);
        table.insert("values", values);
        table.insert("contains", contains);
    }
}

fn keys(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("keys", args, 1, line)?;
    match &args[0] {
        Value::Dict(d) => Ok(Value::list(d.borrow().keys().map(|k| Value::from(k.as_str())).collect())),
        Value::List(l) => {
            let len = l.borrow().len();
            Ok(Value::list((0..len).map(|i| Value::Number(i as f64)).collect()))
        }
        other => Err(ConvoError::type_error(
            format!("'keys' expects a dict or list, got {}", other.type_name()),
            line,
        )
        .into()),
    }
}

fn values(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("values", args, 1, line)?;
    match &args[0] {
        Value::Dict(d) => Ok(Value::list(d.borrow().values().cloned().collect())),
        Value::List(l) => Ok(Value::list(l.borrow().clone())),
        other => Err(ConvoError::type_error(
            format!("'values' expects a dict or list, got {}", other.type_name()),
            line,
        )
        .into()),
    }
}

fn contains(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("contains", args, 2, line)?;
    match (&args[0], &args[1]) {
        (Value::Dict(d), Value::Str(key)) => Ok(Value::Bool(d.borrow().contains_key(key))),
        (Value::Dict(_), other) => Err(ConvoError::type_error(
            format!("'contains' expects a string key for a dict, got {}", other.type_name()),
            line,
        )
        .into()),
        (Value::List(l), item) => Ok(Value::Bool(l.borrow().iter().any(|v| v.structural_eq(item)))),
        (Value::Str(s), Value::Str(needle)) => Ok(Value::Bool(s.contains(needle.as_ref()))),
        (other, _) => Err(ConvoError::type_error(
            format!("'contains' expects a string, list, or dict, got {}", other.type_name()),
            line,
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Dict;

    fn sample() -> Value {
        let mut d = Dict::new();
        d.insert("a".into(), Value::Number(1.0));
        d.insert("b".into(), Value::Number(2.0));
        Value::dict(d)
    }

    #[test]
    fn keys_and_values_preserve_insertion_order_on_dict() {
        let d = sample();
        assert_eq!(keys(&[d.clone()], 1).unwrap().to_display_string(), "[a, b]");
        assert_eq!(values(&[d], 1).unwrap().to_display_string(), "[1, 2]");
    }

    #[test]
    fn keys_on_list_returns_indices() {
        let xs = Value::list(vec![Value::from("x"), Value::from("y")]);
        assert_eq!(keys(&[xs], 1).unwrap().to_display_string(), "[0, 1]");
    }

    #[test]
    fn contains_checks_key_presence_on_dict() {
        let d = sample();
        assert!(matches!(contains(&[d.clone(), Value::from("a")], 1).unwrap(), Value::Bool(true)));
        assert!(matches!(contains(&[d, Value::from("z")], 1).unwrap(), Value::Bool(false)));
    }

    #[test]
    fn contains_checks_substring_on_string() {
        let v = contains(&[Value::from("hello world"), Value::from("wor")], 1).unwrap();
        assert!(matches!(v, Value::Bool(true)));
    }
}
