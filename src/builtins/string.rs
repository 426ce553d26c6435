//! String built-ins: `lower`, `upper`, `split`, `join`.
//!
//! `contains` is also listed against strings in the built-ins table, but
//! since the name is shared with the list/dict categories, its polymorphic
//! implementation lives in [`super::dict`] alongside `keys`/`values`.

use super::{expect_arity, expect_list, expect_string, BuiltinFn, Package};
use crate::error::ConvoResult;
use crate::value::Value;
use std::collections::HashMap;

pub struct StringPackage;

impl Package for StringPackage {
    fn register(&self, table: &mut HashMap<&'static str, BuiltinFn>) {
        table.insert("lower", lower);
        table.insert("upper", upper);
        table.insert("split", split);
        table.insert("join", join);
    }
}

fn lower(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("lower", args, 1, line)?;
    Ok(Value::from(expect_string(&args[0], "lower", line)?.to_lowercase()))
}

fn upper(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("upper", args, 1, line)?;
    Ok(Value::from(expect_string(&args[0], "upper", line)?.to_uppercase()))
}

fn split(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("split", args, 2, line)?;
    let s = expect_string(&args[0], "split", line)?;
    let sep = expect_string(&args[1], "split", line)?;
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        s.split(sep.as_ref()).map(Value::from).collect()
    };
    Ok(Value::list(parts))
}

fn join(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("join", args, 2, line)?;
    let list = expect_list(&args[0], "join", line)?;
    let sep = expect_string(&args[1], "join", line)?;
    let rendered: Vec<String> = list.borrow().iter().map(|v| v.to_display_string()).collect();
    Ok(Value::from(rendered.join(sep.as_ref())))
}
