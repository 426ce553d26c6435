//! Module defining runtime values: the dynamic type every Convo expression
//! evaluates to.

use crate::ast::Stmt;
use crate::environment::Environment;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// An insertion-ordered string-keyed map, backing `Value::Dict`. A plain
/// `Vec` of pairs is enough at Convo's scale and keeps iteration order
/// without pulling in an external map crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(String, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A user-defined function, carrying the environment it closed over at
/// definition time (its closure), per the invariant in §3.4.
#[derive(Debug)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Environment,
}

/// A live object created by `New`: a per-instance field table plus the
/// name of the function it was constructed from. There is deliberately no
/// separate `Class` value — see the class/function design note in
/// `DESIGN.md`; `class_fn` is the constructor function itself, reused as
/// the method/prototype lookup target.
#[derive(Debug)]
pub struct Instance {
    pub class_name: String,
    pub class_fn: Rc<FunctionValue>,
    pub fields: RefCell<Dict>,
}

/// A runtime value. Collections and compound objects are reference types
/// (`Rc`/`Rc<RefCell<_>>`) so that in-place built-ins (`append`, `Let
/// this.x be ...`) mutate the value every other binding sees, matching
/// §3.3/§3.4's shared-instance semantics.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Str(Rc<str>),
    Bool(bool),
    Null,
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
    Function(Rc<FunctionValue>),
    Instance(Rc<Instance>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(entries: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Instance(_) => "instance",
        }
    }

    /// Truthiness per the resolved design rule (§9): only `null` and
    /// `false` are falsy; every other value, including `0` and `""`, is
    /// truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Structural equality used by `equals`/`not equals` (§4.3.1).
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::List(a), Value::List(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map_or(false, |bv| v.structural_eq(bv)))
            }
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Render this value the way `Say` stringifies it for standard output
    /// (§6): no quoting of strings, minimal decimal representation of
    /// numbers, recursive rendering of collections.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::List(items) => {
                let rendered: Vec<String> =
                    items.borrow().iter().map(|v| v.to_debug_element()).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Dict(map) => {
                let rendered: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_debug_element()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Function(f) => format!("<function {}>", f.name),
            Value::Instance(i) => format!("<instance of {}>", i.class_name),
        }
    }

    /// Like [`Value::to_display_string`], but strings nested inside a list
    /// or dict keep no special quoting either — Convo's `Say` format never
    /// quotes strings, even nested ones, per §6.
    fn to_debug_element(&self) -> String {
        self.to_display_string()
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Format a number the way `Say` requires: integers print without a
/// trailing `.0`; everything else prints with Rust's default minimal
/// float representation (§6, §9 open question resolution).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_print_without_trailing_zero() {
        assert_eq!(format_number(60.0), "60");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn fractional_numbers_keep_decimals() {
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn truthiness_only_null_and_false_are_falsy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::from("").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn list_display_matches_spec_format() {
        let v = Value::list(vec![Value::Number(10.0), Value::Number(20.0)]);
        assert_eq!(v.to_display_string(), "[10, 20]");
    }

    #[test]
    fn dict_preserves_insertion_order_on_display() {
        let mut d = Dict::new();
        d.insert("b".into(), Value::Number(2.0));
        d.insert("a".into(), Value::Number(1.0));
        assert_eq!(Value::dict(d).to_display_string(), "{b: 2, a: 1}");
    }
}
