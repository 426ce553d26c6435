//! The built-in function registry, split into small per-category packages
//! the way the teacher splits its own standard library, and assembled once
//! at [`Evaluator::new`](crate::eval::Evaluator::new) time.

mod arithmetic;
mod dict;
mod env;
mod io;
mod list;
mod string;

use crate::environment::Environment;
use crate::error::{ConvoError, ConvoResult};
use crate::value::Value;
use std::collections::HashMap;

pub type BuiltinFn = fn(&[Value], usize) -> ConvoResult<Value>;

/// One related group of built-ins (arithmetic, string, list, dict, I/O,
/// environment). Modeled on `rhai`'s `Package` trait: each package knows
/// only how to register its own names into a shared table.
pub trait Package {
    fn register(&self, table: &mut HashMap<&'static str, BuiltinFn>);
}

/// The name-to-function table consulted whenever a call targets a name
/// with no matching user function in scope (§4.3.3).
pub struct Builtins {
    table: HashMap<&'static str, BuiltinFn>,
    modules: HashMap<&'static str, fn(&Environment)>,
}

impl Builtins {
    /// Build the registry Convo ships with: every category named in the
    /// built-ins table, plus the `math` convenience module used by
    /// `Import`.
    pub fn standard() -> Self {
        let mut table = HashMap::new();
        arithmetic::ArithmeticPackage.register(&mut table);
        string::StringPackage.register(&mut table);
        list::ListPackage.register(&mut table);
        dict::DictPackage.register(&mut table);
        io::IoPackage.register(&mut table);
        env::EnvPackage.register(&mut table);

        let mut modules: HashMap<&'static str, fn(&Environment)> = HashMap::new();
        modules.insert("math", |env: &Environment| {
            env.define("pi", Value::Number(std::f64::consts::PI));
            env.define("e", Value::Number(std::f64::consts::E));
        });

        Self { table, modules }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn call(&self, name: &str, args: Vec<Value>, line: usize) -> ConvoResult<Value> {
        let f = self
            .table
            .get(name)
            .ok_or_else(|| ConvoError::name(format!("'{name}' is not defined"), line))?;
        f(&args, line)
    }

    /// `Import name` (§4.3.2): looks the module up in the host-populated
    /// registry. The core ships only `"math"`; a host embedding Convo can
    /// extend this set, but that extension point is out of scope here.
    pub fn import_module(&self, name: &str, env: &Environment, line: usize) -> ConvoResult<()> {
        let f = self
            .modules
            .get(name)
            .ok_or_else(|| ConvoError::name(format!("no such module '{name}'"), line))?;
        f(env);
        Ok(())
    }
}

/// Shared arity check used by every built-in: Convo's built-ins are not
/// user functions, so a mismatch is still an `ArityError` but phrased
/// against the built-in's own name.
pub(crate) fn expect_arity(name: &str, args: &[Value], want: usize, line: usize) -> ConvoResult<()> {
    if args.len() != want {
        return Err(ConvoError::arity(
            format!("'{name}' expects {want} argument(s), got {}", args.len()),
            line,
        )
        .into());
    }
    Ok(())
}

pub(crate) fn expect_number(v: &Value, who: &str, line: usize) -> ConvoResult<f64> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(ConvoError::type_error(
            format!("'{who}' expects a number, got {}", other.type_name()),
            line,
        )
        .into()),
    }
}

pub(crate) fn expect_string(v: &Value, who: &str, line: usize) -> ConvoResult<std::rc::Rc<str>> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        other => Err(ConvoError::type_error(
            format!("'{who}' expects a string, got {}", other.type_name()),
            line,
        )
        .into()),
    }
}

pub(crate) fn expect_list(
    v: &Value,
    who: &str,
    line: usize,
) -> ConvoResult<std::rc::Rc<std::cell::RefCell<Vec<Value>>>> {
    match v {
        Value::List(l) => Ok(l.clone()),
        other => Err(ConvoError::type_error(
            format!("'{who}' expects a list, got {}", other.type_name()),
            line,
        )
        .into()),
    }
}

pub(crate) fn expect_dict(
    v: &Value,
    who: &str,
    line: usize,
) -> ConvoResult<std::rc::Rc<std::cell::RefCell<crate::value::Dict>>> {
    match v {
        Value::Dict(d) => Ok(d.clone()),
        other => Err(ConvoError::type_error(
            format!("'{who}' expects a dict, got {}", other.type_name()),
            line,
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_knows_core_names() {
        let b = Builtins::standard();
        for name in ["length", "to_text", "round", "lower", "append", "keys", "file_exists", "get_env"] {
            assert!(b.contains(name), "missing built-in {name}");
        }
    }

    #[test]
    fn unknown_builtin_is_name_error() {
        let b = Builtins::standard();
        let err = b.call("nope", vec![], 3).unwrap_err();
        assert_eq!(err.kind.label(), "NameError");
    }

    #[test]
    fn math_module_defines_constants() {
        let b = Builtins::standard();
        let env = Environment::root();
        b.import_module("math", &env, 1).unwrap();
        assert!(matches!(env.get("pi"), Some(Value::Number(_))));
    }
}
