//! List built-ins: `append`, `remove`, `get`.
//!
//! `keys`/`values`/`contains` are also listed against lists in the
//! built-ins table, but since the same names are shared with the dict
//! category, their polymorphic implementations live in [`super::dict`]
//! rather than being registered twice under one flat name table.
//!
//! `append`/`remove` mutate the receiver in place (lists are `Rc<RefCell<_>>`
//! per §3.3's shared-instance semantics) and also return it, so both
//! `append(xs, v)` as a statement and `Let ys be append(xs, v)` read naturally.

use super::{expect_arity, expect_list, expect_number, BuiltinFn, Package};
use crate::error::{ConvoError, ConvoResult};
use crate::value::Value;
use std::collections::HashMap;

pub struct ListPackage;

impl Package for ListPackage {
    fn register(&self, table: &mut HashMap<&'static str, BuiltinFn>) {
        table.insert("append", append);
        table.insert("remove", remove);
        table.insert("get", get);
    }
}

fn append(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("append", args, 2, line)?;
    let list = expect_list(&args[0], "append", line)?;
    list.borrow_mut().push(args[1].clone());
    Ok(args[0].clone())
}

fn remove(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("remove", args, 2, line)?;
    let list = expect_list(&args[0], "remove", line)?;
    let idx = resolve_index(&list.borrow(), &args[1], "remove", line)?;
    let removed = list.borrow_mut().remove(idx);
    Ok(removed)
}

fn get(args: &[Value], line: usize) -> ConvoResult<Value> {
    if args.len() != 2 && args.len() != 3 {
        return Err(ConvoError::arity(
            format!("'get' expects 2 or 3 arguments, got {}", args.len()),
            line,
        )
        .into());
    }
    let list = expect_list(&args[0], "get", line)?;
    let borrowed = list.borrow();
    match resolve_index(&borrowed, &args[1], "get", line) {
        Ok(idx) => Ok(borrowed[idx].clone()),
        Err(e) if args.len() == 3 => {
            let _ = e;
            Ok(args[2].clone())
        }
        Err(e) => Err(e),
    }
}

fn resolve_index(items: &[Value], key: &Value, who: &str, line: usize) -> ConvoResult<usize> {
    let n = expect_number(key, who, line)?;
    let len = items.len() as i64;
    let mut idx = n as i64;
    if idx < 0 {
        idx += len;
    }
    if idx < 0 || idx >= len {
        return Err(ConvoError::index(
            format!("'{who}' index {} out of range (length {len})", n as i64),
            line,
        )
        .into());
    }
    Ok(idx as usize)
}
