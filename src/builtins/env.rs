//! Process-environment built-ins: `get_env`, `set_env`, `has_env`, `list_env`.

use super::{expect_arity, expect_string, BuiltinFn, Package};
use crate::error::ConvoResult;
use crate::value::{Dict, Value};
use std::collections::HashMap;

pub struct EnvPackage;

impl Package for EnvPackage {
    fn register(&self, table: &mut HashMap<&'static str, BuiltinFn>) {
        table.insert("get_env", get_env);
        table.insert("set_env", set_env);
        table.insert("has_env", has_env);
        table.insert("list_env", list_env);
    }
}

fn get_env(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("get_env", args, 1, line)?;
    let name = expect_string(&args[0], "get_env", line)?;
    Ok(match std::env::var(name.as_ref()) {
        Ok(v) => Value::from(v),
        Err(_) => Value::Null,
    })
}

fn set_env(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("set_env", args, 2, line)?;
    let name = expect_string(&args[0], "set_env", line)?;
    let value = expect_string(&args[1], "set_env", line)?;
    std::env::set_var(name.as_ref(), value.as_ref());
    Ok(Value::Null)
}

fn has_env(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("has_env", args, 1, line)?;
    let name = expect_string(&args[0], "has_env", line)?;
    Ok(Value::Bool(std::env::var(name.as_ref()).is_ok()))
}

fn list_env(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("list_env", args, 0, line)?;
    let mut dict = Dict::new();
    for (k, v) in std::env::vars() {
        dict.insert(k, Value::from(v));
    }
    Ok(Value::dict(dict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_env_roundtrips() {
        set_env(&[Value::from("CONVO_BUILTIN_TEST"), Value::from("ok")], 1).unwrap();
        let v = get_env(&[Value::from("CONVO_BUILTIN_TEST")], 1).unwrap();
        assert_eq!(v.to_display_string(), "ok");
        assert!(matches!(has_env(&[Value::from("CONVO_BUILTIN_TEST")], 1).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn get_env_on_missing_name_is_null() {
        let v = get_env(&[Value::from("CONVO_DEFINITELY_UNSET_VARIABLE")], 1).unwrap();
        assert!(matches!(v, Value::Null));
    }
}
