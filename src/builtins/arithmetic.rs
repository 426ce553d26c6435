//! Arithmetic and general-purpose utility built-ins: `length`, `to_text`,
//! `to_number`, `range`, `round`, `abs`, `random_int`.

use super::{expect_arity, expect_number, BuiltinFn, Package};
use crate::error::ConvoError;
use crate::value::Value;
use rand::Rng;
use std::collections::HashMap;

pub struct ArithmeticPackage;

impl Package for ArithmeticPackage {
    fn register(&self, table: &mut HashMap<&'static str, BuiltinFn>) {
        table.insert("length", length);
        table.insert("to_text", to_text);
        table.insert("to_number", to_number);
        table.insert("range", range);
        table.insert("round", round);
        table.insert("abs", abs);
        table.insert("random_int", random_int);
    }
}

fn length(args: &[Value], line: usize) -> crate::error::ConvoResult<Value> {
    expect_arity("length", args, 1, line)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(l) => l.borrow().len(),
        Value::Dict(d) => d.borrow().len(),
        other => {
            return Err(ConvoError::type_error(
                format!("'length' expects a string, list, or dict, got {}", other.type_name()),
                line,
            )
            .into())
        }
    };
    Ok(Value::Number(n as f64))
}

fn to_text(args: &[Value], line: usize) -> crate::error::ConvoResult<Value> {
    expect_arity("to_text", args, 1, line)?;
    Ok(Value::from(args[0].to_display_string()))
}

fn to_number(args: &[Value], line: usize) -> crate::error::ConvoResult<Value> {
    expect_arity("to_number", args, 1, line)?;
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| ConvoError::runtime(format!("'{s}' is not a valid number"), line).into()),
        other => Err(ConvoError::type_error(
            format!("'to_number' cannot convert a value of type {}", other.type_name()),
            line,
        )
        .into()),
    }
}

/// `range(n)` yields `0..n`; `range(start, end)` yields `start..end`.
fn range(args: &[Value], line: usize) -> crate::error::ConvoResult<Value> {
    let (start, end) = match args.len() {
        1 => (0.0, expect_number(&args[0], "range", line)?),
        2 => (
            expect_number(&args[0], "range", line)?,
            expect_number(&args[1], "range", line)?,
        ),
        n => {
            return Err(ConvoError::arity(
                format!("'range' expects 1 or 2 arguments, got {n}"),
                line,
            )
            .into())
        }
    };
    let start = start as i64;
    let end = end as i64;
    let items = (start..end).map(|n| Value::Number(n as f64)).collect();
    Ok(Value::list(items))
}

fn round(args: &[Value], line: usize) -> crate::error::ConvoResult<Value> {
    expect_arity("round", args, 1, line)?;
    let n = expect_number(&args[0], "round", line)?;
    Ok(Value::Number(n.round()))
}

fn abs(args: &[Value], line: usize) -> crate::error::ConvoResult<Value> {
    expect_arity("abs", args, 1, line)?;
    let n = expect_number(&args[0], "abs", line)?;
    Ok(Value::Number(n.abs()))
}

fn random_int(args: &[Value], line: usize) -> crate::error::ConvoResult<Value> {
    expect_arity("random_int", args, 2, line)?;
    let lo = expect_number(&args[0], "random_int", line)? as i64;
    let hi = expect_number(&args[1], "random_int", line)? as i64;
    if lo > hi {
        return Err(ConvoError::runtime(
            format!("'random_int' range is empty ({lo}..={hi})"),
            line,
        )
        .into());
    }
    Ok(Value::Number(rand::thread_rng().gen_range(lo..=hi) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_chars_and_elements() {
        assert!(matches!(length(&[Value::from("hi")], 1).unwrap(), Value::Number(n) if n == 2.0));
        assert!(matches!(
            length(&[Value::list(vec![Value::Null, Value::Null])], 1).unwrap(),
            Value::Number(n) if n == 2.0
        ));
    }

    #[test]
    fn to_number_parses_numeric_strings() {
        assert!(matches!(to_number(&[Value::from("42")], 1).unwrap(), Value::Number(n) if n == 42.0));
    }

    #[test]
    fn to_number_rejects_garbage() {
        assert!(to_number(&[Value::from("abc")], 1).is_err());
    }

    #[test]
    fn range_with_one_arg_starts_at_zero() {
        let v = range(&[Value::Number(3.0)], 1).unwrap();
        assert_eq!(v.to_display_string(), "[0, 1, 2]");
    }

    #[test]
    fn random_int_stays_in_bounds() {
        for _ in 0..20 {
            let v = random_int(&[Value::Number(1.0), Value::Number(3.0)], 1).unwrap();
            match v {
                Value::Number(n) => assert!((1.0..=3.0).contains(&n)),
                _ => panic!("expected number"),
            }
        }
    }
}
