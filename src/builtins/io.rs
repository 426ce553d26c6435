//! Filesystem built-ins, implemented directly against `std::fs` — each one
//! a single straight-line call with no caching or retry, per the ambient
//! scoping note in the runtime design.

use super::{expect_arity, expect_string, BuiltinFn, Package};
use crate::error::{ConvoError, ConvoResult};
use crate::value::{Dict, Value};
use std::collections::HashMap;
use std::fs;
use std::io::Write as _;

pub struct IoPackage;

impl Package for IoPackage {
    fn register(&self, table: &mut HashMap<&'static str, BuiltinFn>) {
        table.insert("read_file", read_file);
        table.insert("write_file", write_file);
        table.insert("append_file", append_file);
        table.insert("file_exists", file_exists);
        table.insert("file_size", file_size);
        table.insert("delete_file", delete_file);
        table.insert("read_lines", read_lines);
        table.insert("read_json", read_json);
        table.insert("write_json", write_json);
    }
}

fn io_error(who: &str, path: &str, err: std::io::Error, line: usize) -> Box<ConvoError> {
    ConvoError::runtime(format!("'{who}' failed on '{path}': {err}"), line).into()
}

fn read_file(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("read_file", args, 1, line)?;
    let path = expect_string(&args[0], "read_file", line)?;
    let contents = fs::read_to_string(path.as_ref()).map_err(|e| io_error("read_file", &path, e, line))?;
    Ok(Value::from(contents))
}

fn write_file(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("write_file", args, 2, line)?;
    let path = expect_string(&args[0], "write_file", line)?;
    let contents = expect_string(&args[1], "write_file", line)?;
    fs::write(path.as_ref(), contents.as_bytes()).map_err(|e| io_error("write_file", &path, e, line))?;
    Ok(Value::Null)
}

fn append_file(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("append_file", args, 2, line)?;
    let path = expect_string(&args[0], "append_file", line)?;
    let contents = expect_string(&args[1], "append_file", line)?;
    let mut f = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .map_err(|e| io_error("append_file", &path, e, line))?;
    f.write_all(contents.as_bytes())
        .map_err(|e| io_error("append_file", &path, e, line))?;
    Ok(Value::Null)
}

fn file_exists(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("file_exists", args, 1, line)?;
    let path = expect_string(&args[0], "file_exists", line)?;
    Ok(Value::Bool(std::path::Path::new(path.as_ref()).exists()))
}

fn file_size(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("file_size", args, 1, line)?;
    let path = expect_string(&args[0], "file_size", line)?;
    let meta = fs::metadata(path.as_ref()).map_err(|e| io_error("file_size", &path, e, line))?;
    Ok(Value::Number(meta.len() as f64))
}

fn delete_file(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("delete_file", args, 1, line)?;
    let path = expect_string(&args[0], "delete_file", line)?;
    fs::remove_file(path.as_ref()).map_err(|e| io_error("delete_file", &path, e, line))?;
    Ok(Value::Null)
}

fn read_lines(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("read_lines", args, 1, line)?;
    let path = expect_string(&args[0], "read_lines", line)?;
    let contents = fs::read_to_string(path.as_ref()).map_err(|e| io_error("read_lines", &path, e, line))?;
    let lines = contents.lines().map(Value::from).collect();
    Ok(Value::list(lines))
}

fn read_json(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("read_json", args, 1, line)?;
    let path = expect_string(&args[0], "read_json", line)?;
    let contents = fs::read_to_string(path.as_ref()).map_err(|e| io_error("read_json", &path, e, line))?;
    let parsed: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| ConvoError::runtime(format!("'read_json' could not parse '{path}': {e}"), line))?;
    Ok(json_to_value(&parsed))
}

fn write_json(args: &[Value], line: usize) -> ConvoResult<Value> {
    expect_arity("write_json", args, 2, line)?;
    let path = expect_string(&args[0], "write_json", line)?;
    let json = value_to_json(&args[1], line)?;
    let rendered = serde_json::to_string_pretty(&json)
        .map_err(|e| ConvoError::runtime(format!("'write_json' could not encode value: {e}"), line))?;
    fs::write(path.as_ref(), rendered).map_err(|e| io_error("write_json", &path, e, line))?;
    Ok(Value::Null)
}

fn json_to_value(j: &serde_json::Value) -> Value {
    match j {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => Value::list(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            let mut dict = Dict::new();
            for (k, v) in map {
                dict.insert(k.clone(), json_to_value(v));
            }
            Value::dict(dict)
        }
    }
}

fn value_to_json(v: &Value, line: usize) -> ConvoResult<serde_json::Value> {
    Ok(match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::List(items) => {
            let mut out = Vec::new();
            for item in items.borrow().iter() {
                out.push(value_to_json(item, line)?);
            }
            serde_json::Value::Array(out)
        }
        Value::Dict(map) => {
            let mut out = serde_json::Map::new();
            for (k, val) in map.borrow().iter() {
                out.insert(k.clone(), value_to_json(val, line)?);
            }
            serde_json::Value::Object(out)
        }
        other => {
            return Err(ConvoError::type_error(
                format!("'write_json' cannot encode a value of type {}", other.type_name()),
                line,
            )
            .into())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_path(name: &str) -> String {
        temp_dir().join(name).to_string_lossy().to_string()
    }

    #[test]
    fn write_then_read_file_roundtrips() {
        let path = temp_path("convo_io_test_roundtrip.txt");
        write_file(&[Value::from(path.clone()), Value::from("hello")], 1).unwrap();
        let contents = read_file(&[Value::from(path.clone())], 1).unwrap();
        assert_eq!(contents.to_display_string(), "hello");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn file_exists_reflects_presence() {
        let path = temp_path("convo_io_test_missing.txt");
        let _ = fs::remove_file(&path);
        assert!(matches!(file_exists(&[Value::from(path)], 1).unwrap(), Value::Bool(false)));
    }

    #[test]
    fn write_then_read_json_roundtrips_a_dict() {
        let path = temp_path("convo_io_test.json");
        let mut d = Dict::new();
        d.insert("n".into(), Value::Number(3.0));
        write_json(&[Value::from(path.clone()), Value::dict(d)], 1).unwrap();
        let back = read_json(&[Value::from(path.clone())], 1).unwrap();
        assert_eq!(back.to_display_string(), "{n: 3}");
        let _ = fs::remove_file(&path);
    }
}
