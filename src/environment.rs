//! Module defining the lexically-scoped environment chain that backs
//! variable lookup, closures, and the `Let` rebind-or-create rule (§3.4).

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct Frame {
    vars: HashMap<String, Value>,
    parent: Option<Environment>,
}

/// A single link in the environment chain. Cloning an [`Environment`]
/// clones the `Rc`, not the bindings — every clone sees the same mutable
/// frame, which is what lets a function's closure and its later call
/// frames share state correctly.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Environment(..)")
    }
}

impl Environment {
    /// Create a fresh top-level (global) environment with no parent.
    pub fn root() -> Self {
        Self(Rc::new(RefCell::new(Frame {
            vars: HashMap::new(),
            parent: None,
        })))
    }

    /// Create a new environment nested inside `self`, e.g. a function call
    /// frame whose parent is the function's closure.
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            vars: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Look up `name`, walking outward from this frame to the root. The
    /// first match wins (§3.4).
    pub fn get(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        if let Some(v) = frame.vars.get(name) {
            return Some(v.clone());
        }
        frame.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Unconditionally bind `name` to `value` in *this* frame, shadowing
    /// any binding of the same name further out. Used for function
    /// parameters and fresh `Let` bindings.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().vars.insert(name.into(), value);
    }

    /// Implements `Let`'s rebind-or-create rule: if `name` is already
    /// bound anywhere in the chain, overwrite it there (so a `While`
    /// counter declared outside the loop body keeps updating across
    /// iterations); otherwise create a new binding in this frame.
    pub fn assign(&self, name: &str, value: Value) {
        if self.try_rebind(name, value.clone()) {
            return;
        }
        self.define(name, value);
    }

    fn try_rebind(&self, name: &str, value: Value) -> bool {
        let mut frame = self.0.borrow_mut();
        if frame.vars.contains_key(name) {
            frame.vars.insert(name.to_string(), value);
            return true;
        }
        match &frame.parent {
            Some(p) => {
                let p = p.clone();
                drop(frame);
                p.try_rebind(name, value)
            }
            None => false,
        }
    }
}
