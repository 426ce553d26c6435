//! The tree-walking evaluator: turns a parsed `Stmt` program into effects
//! (`Say` output) and a final environment, per §4.3.
//!
//! Control-flow signals (`Return`/`Throw`/`Stop`) and real runtime errors
//! both unwind through the same `ConvoResult` channel — see the note on
//! [`crate::error::ErrorKind::is_pseudo_signal`] for why that mirrors the
//! teacher's own error type.

use crate::ast::{AssignTarget, BinOp, Expr, Stmt, UnOp};
use crate::builtins::Builtins;
use crate::config::RunnerConfig;
use crate::environment::Environment;
use crate::error::{ConvoError, ConvoResult};
use crate::value::{Dict, FunctionValue, Instance, Value};
use std::rc::Rc;

/// Drives one running program: holds the built-in registry and the handful
/// of limits from [`RunnerConfig`] that bound recursion and module imports.
pub struct Evaluator {
    builtins: Builtins,
    config: RunnerConfig,
}

impl Evaluator {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            builtins: Builtins::standard(),
            config,
        }
    }

    /// Run a whole program against `env` (typically [`Environment::root`]).
    /// A top-level `Stop` ends the program quietly; a top-level `Throw`
    /// (or any other uncaught error) is returned to the caller to report.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, program: &[Stmt], env: &Environment) -> ConvoResult<()> {
        tracing::debug!(stmt_count = program.len(), "evaluating program");
        match self.exec_block(program, env, 0) {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.kind, crate::error::ErrorKind::Stop) => Ok(()),
            // The parser rejects a top-level `Return` as a SyntaxError, so this
            // should never fire; kept as a backstop so an unconsumed `Return`
            // signal never reaches a caller labeled as anything but an error.
            Err(e) if matches!(e.kind, crate::error::ErrorKind::Return(_)) => {
                Err(ConvoError::runtime("'Return' outside any function body", e.line).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Evaluate a single expression against `env`. Exposed for the REPL,
    /// which prints the value of a bare expression statement instead of
    /// discarding it (§6).
    pub fn eval_expr_pub(&self, expr: &Expr, env: &Environment) -> ConvoResult<Value> {
        self.eval_expr(expr, env, 0)
    }

    fn exec_block(&self, stmts: &[Stmt], env: &Environment, depth: usize) -> ConvoResult<()> {
        for stmt in stmts {
            self.exec_stmt(stmt, env, depth)?;
        }
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn exec_stmt(&self, stmt: &Stmt, env: &Environment, depth: usize) -> ConvoResult<()> {
        match stmt {
            Stmt::Say { expr, line } => {
                let v = self.eval_expr(expr, env, depth)?;
                let _ = *line;
                println!("{}", v.to_display_string());
                Ok(())
            }
            Stmt::Let { target, expr, line } => {
                let v = self.eval_expr(expr, env, depth)?;
                self.assign(target, v, env, depth, *line)
            }
            Stmt::FunctionDef {
                name,
                params,
                body,
                ..
            } => {
                let f = Value::Function(Rc::new(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new(body.clone()),
                    closure: env.clone(),
                }));
                env.define(name.clone(), f);
                Ok(())
            }
            Stmt::FunctionCall { name, args, line } => {
                self.call_by_name(name, args, env, depth, *line)?;
                Ok(())
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                line: _,
            } => {
                if self.eval_expr(cond, env, depth)?.is_truthy() {
                    self.exec_block(then_body, &env.child(), depth)
                } else if let Some(else_body) = else_body {
                    self.exec_block(else_body, &env.child(), depth)
                } else {
                    Ok(())
                }
            }
            Stmt::While { cond, body, .. } => {
                while self.eval_expr(cond, env, depth)?.is_truthy() {
                    self.exec_block(body, &env.child(), depth)?;
                }
                Ok(())
            }
            Stmt::ForEach {
                var_name,
                iter_expr,
                body,
                line,
            } => {
                let iterable = self.eval_expr(iter_expr, env, depth)?;
                let items = self.iteration_snapshot(&iterable, *line)?;
                for item in items {
                    let loop_env = env.child();
                    loop_env.define(var_name.clone(), item);
                    self.exec_block(body, &loop_env, depth)?;
                }
                Ok(())
            }
            Stmt::Try {
                body,
                catch_var,
                catch_body,
                ..
            } => match self.exec_block(body, &env.child(), depth) {
                Ok(()) => Ok(()),
                Err(e) if e.kind.is_catchable() => {
                    let catch_env = env.child();
                    catch_env.define(catch_var.clone(), e.into_thrown_value());
                    self.exec_block(catch_body, &catch_env, depth)
                }
                Err(e) => Err(e),
            },
            Stmt::Throw { expr, line } => {
                let v = self.eval_expr(expr, env, depth)?;
                Err(ConvoError::thrown(v, *line).into())
            }
            Stmt::Return { expr, line } => {
                let v = match expr {
                    Some(e) => self.eval_expr(e, env, depth)?,
                    None => Value::Null,
                };
                Err(ConvoError::return_signal(v, *line).into())
            }
            Stmt::Stop { line } => Err(ConvoError::stop_signal(*line).into()),
            Stmt::Import { name, line } => self.builtins.import_module(name, env, *line),
            Stmt::ExpressionStmt { expr, line: _ } => {
                self.eval_expr(expr, env, depth)?;
                Ok(())
            }
        }
    }

    fn assign(
        &self,
        target: &AssignTarget,
        value: Value,
        env: &Environment,
        depth: usize,
        line: usize,
    ) -> ConvoResult<()> {
        match target {
            AssignTarget::Name(name) => {
                env.assign(name, value);
                Ok(())
            }
            AssignTarget::Field { target, field } => {
                let recv = self.eval_expr(target, env, depth)?;
                match recv {
                    Value::Instance(inst) => {
                        inst.fields.borrow_mut().insert(field.clone(), value);
                        Ok(())
                    }
                    other => Err(ConvoError::type_error(
                        format!(
                            "cannot assign field '{field}' on a value of type {}",
                            other.type_name()
                        ),
                        line,
                    )
                    .into()),
                }
            }
        }
    }

    /// Collect the elements a `For each` iterates, snapshotting the
    /// collection at loop entry (§4.3.2: undefined ordering otherwise, so
    /// mutation inside the body never disturbs the loop in progress).
    fn iteration_snapshot(&self, value: &Value, line: usize) -> ConvoResult<Vec<Value>> {
        match value {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Dict(map) => Ok(map.borrow().keys().map(|k| Value::from(k.as_str())).collect()),
            other => Err(ConvoError::type_error(
                format!("cannot iterate a value of type {}", other.type_name()),
                line,
            )
            .into()),
        }
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn eval_expr(&self, expr: &Expr, env: &Environment, depth: usize) -> ConvoResult<Value> {
        match expr {
            Expr::NumberLit(n) => Ok(Value::Number(*n)),
            Expr::StringLit(s) => Ok(Value::from(s.as_str())),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::NullLit => Ok(Value::Null),
            Expr::Identifier { name, line } => env
                .get(name)
                .ok_or_else(|| ConvoError::name(format!("'{name}' is not defined"), *line).into()),
            Expr::Binary { op, lhs, rhs, line } => self.eval_binary(*op, lhs, rhs, env, depth, *line),
            Expr::Unary { op, operand, line } => {
                let v = self.eval_expr(operand, env, depth)?;
                match op {
                    UnOp::Not => Ok(Value::Bool(!v.is_truthy())),
                    UnOp::Neg => match v {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(ConvoError::type_error(
                            format!("cannot negate a value of type {}", other.type_name()),
                            *line,
                        )
                        .into()),
                    },
                }
            }
            Expr::ListLit(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval_expr(item, env, depth)?);
                }
                Ok(Value::list(out))
            }
            Expr::DictLit(pairs) => {
                let mut dict = Dict::new();
                for (k, v) in pairs {
                    let key = self.eval_expr(k, env, depth)?;
                    let key = match key {
                        Value::Str(s) => s.to_string(),
                        other => other.to_display_string(),
                    };
                    let value = self.eval_expr(v, env, depth)?;
                    dict.insert(key, value);
                }
                Ok(Value::dict(dict))
            }
            Expr::Index { target, key, line } => {
                let t = self.eval_expr(target, env, depth)?;
                let k = self.eval_expr(key, env, depth)?;
                self.eval_index(&t, &k, *line)
            }
            Expr::Member { target, field, line } => {
                let t = self.eval_expr(target, env, depth)?;
                self.eval_member(&t, field, *line)
            }
            Expr::Call { callee, args, line } => self.eval_call(callee, args, env, depth, *line),
            Expr::New {
                class_name,
                args,
                line,
            } => self.eval_new(class_name, args, env, depth, *line),
        }
    }

    fn eval_binary(
        &self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &Environment,
        depth: usize,
        line: usize,
    ) -> ConvoResult<Value> {
        // `and`/`or` short-circuit and return whichever operand decided the
        // result, not a coerced boolean (§4.3.1).
        match op {
            BinOp::And => {
                let l = self.eval_expr(lhs, env, depth)?;
                return if !l.is_truthy() {
                    Ok(l)
                } else {
                    self.eval_expr(rhs, env, depth)
                };
            }
            BinOp::Or => {
                let l = self.eval_expr(lhs, env, depth)?;
                return if l.is_truthy() {
                    Ok(l)
                } else {
                    self.eval_expr(rhs, env, depth)
                };
            }
            _ => {}
        }

        let l = self.eval_expr(lhs, env, depth)?;
        let r = self.eval_expr(rhs, env, depth)?;

        match op {
            BinOp::Add => match (&l, &r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(_), _) | (_, Value::Str(_)) => {
                    Ok(Value::from(format!("{}{}", l.to_display_string(), r.to_display_string())))
                }
                _ => Err(type_mismatch("add", &l, &r, line)),
            },
            BinOp::Sub => numeric_op(&l, &r, line, "subtract", |a, b| a - b),
            BinOp::Mul => numeric_op(&l, &r, line, "multiply", |a, b| a * b),
            BinOp::Div => match (&l, &r) {
                (Value::Number(_), Value::Number(b)) if *b == 0.0 => {
                    Err(ConvoError::runtime("division by zero", line).into())
                }
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => Err(type_mismatch("divide", &l, &r, line)),
            },
            BinOp::Equals => Ok(Value::Bool(l.structural_eq(&r))),
            BinOp::NotEquals => Ok(Value::Bool(!l.structural_eq(&r))),
            BinOp::Greater => compare(&l, &r, line, |o| o == std::cmp::Ordering::Greater),
            BinOp::GreaterEqual => compare(&l, &r, line, |o| o != std::cmp::Ordering::Less),
            BinOp::Less => compare(&l, &r, line, |o| o == std::cmp::Ordering::Less),
            BinOp::LessEqual => compare(&l, &r, line, |o| o != std::cmp::Ordering::Greater),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_index(&self, target: &Value, key: &Value, line: usize) -> ConvoResult<Value> {
        match (target, key) {
            (Value::List(items), Value::Number(n)) => {
                let items = items.borrow();
                let len = items.len() as i64;
                let mut idx = *n as i64;
                if idx < 0 {
                    idx += len;
                }
                if idx < 0 || idx >= len {
                    return Err(ConvoError::index(
                        format!("list index {} out of range (length {})", *n as i64, len),
                        line,
                    )
                    .into());
                }
                Ok(items[idx as usize].clone())
            }
            (Value::Dict(map), Value::Str(key)) => map
                .borrow()
                .get(key)
                .cloned()
                .ok_or_else(|| ConvoError::index(format!("no such key '{key}'"), line).into()),
            (Value::List(_), other) => Err(ConvoError::type_error(
                format!("list index must be a number, got {}", other.type_name()),
                line,
            )
            .into()),
            (Value::Dict(_), other) => Err(ConvoError::type_error(
                format!("dict key must be a string, got {}", other.type_name()),
                line,
            )
            .into()),
            (other, _) => Err(ConvoError::type_error(
                format!("cannot index a value of type {}", other.type_name()),
                line,
            )
            .into()),
        }
    }

    /// Member access: only `Instance` values have fields, falling back to
    /// the class's methods when no field of that name is set (§4.3.1).
    /// Built-ins on strings/lists/dicts are functions, not properties, so
    /// any other receiver type is a `TypeError`.
    fn eval_member(&self, target: &Value, field: &str, line: usize) -> ConvoResult<Value> {
        match target {
            Value::Instance(inst) => {
                if let Some(v) = inst.fields.borrow().get(field) {
                    return Ok(v.clone());
                }
                if let Some(method) = find_method(&inst.class_fn, field) {
                    return Ok(Value::Function(method));
                }
                Err(ConvoError::name(
                    format!("'{}' has no field or method named '{field}'", inst.class_name),
                    line,
                )
                .into())
            }
            other => Err(ConvoError::type_error(
                format!("cannot access field '{field}' on a value of type {}", other.type_name()),
                line,
            )
            .into()),
        }
    }

    fn eval_args(
        &self,
        args: &[Expr],
        env: &Environment,
        depth: usize,
    ) -> ConvoResult<Vec<Value>> {
        args.iter().map(|a| self.eval_expr(a, env, depth)).collect()
    }

    fn eval_call(
        &self,
        callee: &Expr,
        args: &[Expr],
        env: &Environment,
        depth: usize,
        line: usize,
    ) -> ConvoResult<Value> {
        match callee {
            Expr::Identifier { name, .. } => self.call_by_name(name, args, env, depth, line),
            Expr::Member { target, field, line: mline } => {
                let recv = self.eval_expr(target, env, depth)?;
                match &recv {
                    Value::Instance(inst) => {
                        let method = find_method(&inst.class_fn, field).ok_or_else(|| {
                            ConvoError::name(
                                format!("'{}' has no method named '{field}'", inst.class_name),
                                *mline,
                            )
                        })?;
                        let argv = self.eval_args(args, env, depth)?;
                        self.call_function(&method, argv, Some(recv.clone()), depth, line)
                    }
                    other => Err(ConvoError::type_error(
                        format!("cannot call a method on a value of type {}", other.type_name()),
                        line,
                    )
                    .into()),
                }
            }
            other => {
                let callee_v = self.eval_expr(other, env, depth)?;
                let argv = self.eval_args(args, env, depth)?;
                match callee_v {
                    Value::Function(f) => self.call_function(&f, argv, None, depth, line),
                    v => Err(ConvoError::type_error(
                        format!("value of type {} is not callable", v.type_name()),
                        line,
                    )
                    .into()),
                }
            }
        }
    }

    /// Resolves a bare-name call: a user function bound in scope takes
    /// priority, then the built-in registry, per §4.3.3.
    fn call_by_name(
        &self,
        name: &str,
        args: &[Expr],
        env: &Environment,
        depth: usize,
        line: usize,
    ) -> ConvoResult<Value> {
        if let Some(Value::Function(f)) = env.get(name) {
            let argv = self.eval_args(args, env, depth)?;
            return self.call_function(&f, argv, None, depth, line);
        }
        if self.builtins.contains(name) {
            let argv = self.eval_args(args, env, depth)?;
            return self.builtins.call(name, argv, line);
        }
        Err(ConvoError::name(format!("'{name}' is not defined"), line).into())
    }

    fn call_function(
        &self,
        f: &Rc<FunctionValue>,
        args: Vec<Value>,
        this: Option<Value>,
        depth: usize,
        line: usize,
    ) -> ConvoResult<Value> {
        if depth >= self.config.max_call_depth {
            return Err(ConvoError::runtime("call stack exceeded maximum depth", line).into());
        }
        if args.len() != f.params.len() {
            return Err(ConvoError::arity(
                format!(
                    "'{}' expects {} argument(s), got {}",
                    f.name,
                    f.params.len(),
                    args.len()
                ),
                line,
            )
            .into());
        }
        let call_env = f.closure.child();
        if let Some(this) = this {
            call_env.define("this", this);
        }
        for (param, arg) in f.params.iter().zip(args) {
            call_env.define(param.clone(), arg);
        }
        match self.exec_block(&f.body, &call_env, depth + 1) {
            Ok(()) => Ok(Value::Null),
            Err(e) => match e.kind {
                crate::error::ErrorKind::Return(v) => Ok(v),
                _ => Err(e),
            },
        }
    }

    /// `New ClassName with args`: run the named function as a constructor
    /// against a fresh `Instance` with `this` bound, discarding its `Return`
    /// if any (§9 design note — there is no separate `ClassDef`; any
    /// function can serve as a constructor). `Define` statements nested in
    /// its body become methods, looked up later via [`find_method`].
    fn eval_new(
        &self,
        class_name: &str,
        args: &[Expr],
        env: &Environment,
        depth: usize,
        line: usize,
    ) -> ConvoResult<Value> {
        let class_fn = match env.get(class_name) {
            Some(Value::Function(f)) => f,
            Some(_) => {
                return Err(ConvoError::type_error(
                    format!("'{class_name}' is not a function and cannot be used with New"),
                    line,
                )
                .into())
            }
            None => return Err(ConvoError::name(format!("'{class_name}' is not defined"), line).into()),
        };
        let argv = self.eval_args(args, env, depth)?;
        if argv.len() != class_fn.params.len() {
            return Err(ConvoError::arity(
                format!(
                    "'{class_name}' expects {} argument(s), got {}",
                    class_fn.params.len(),
                    argv.len()
                ),
                line,
            )
            .into());
        }

        let instance = Rc::new(Instance {
            class_name: class_name.to_string(),
            class_fn: Rc::clone(&class_fn),
            fields: std::cell::RefCell::new(Dict::new()),
        });

        let call_env = class_fn.closure.child();
        call_env.define("this", Value::Instance(Rc::clone(&instance)));
        for (param, arg) in class_fn.params.iter().zip(argv) {
            call_env.define(param.clone(), arg);
        }

        match self.exec_block(&class_fn.body, &call_env, depth + 1) {
            Ok(()) => {}
            Err(e) => match e.kind {
                crate::error::ErrorKind::Return(_) => {}
                _ => return Err(e),
            },
        }

        Ok(Value::Instance(instance))
    }
}

fn find_method(class_fn: &Rc<FunctionValue>, name: &str) -> Option<Rc<FunctionValue>> {
    class_fn.body.iter().find_map(|stmt| match stmt {
        Stmt::FunctionDef {
            name: mname,
            params,
            body,
            ..
        } if mname == name => Some(Rc::new(FunctionValue {
            name: mname.clone(),
            params: params.clone(),
            body: Rc::new(body.clone()),
            closure: class_fn.closure.child(),
        })),
        _ => None,
    })
}

fn numeric_op(
    l: &Value,
    r: &Value,
    line: usize,
    verb: &str,
    f: impl Fn(f64, f64) -> f64,
) -> ConvoResult<Value> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(*a, *b))),
        _ => Err(type_mismatch(verb, l, r, line)),
    }
}

fn type_mismatch(verb: &str, l: &Value, r: &Value, line: usize) -> Box<ConvoError> {
    ConvoError::type_error(
        format!(
            "cannot {verb} a value of type {} and a value of type {}",
            l.type_name(),
            r.type_name()
        ),
        line,
    )
    .into()
}

fn compare(l: &Value, r: &Value, line: usize, accept: impl Fn(std::cmp::Ordering) -> bool) -> ConvoResult<Value> {
    let ord = match (l, r) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.as_ref().cmp(b.as_ref())),
        _ => {
            return Err(ConvoError::type_error(
                format!(
                    "cannot compare a value of type {} with a value of type {}",
                    l.type_name(),
                    r.type_name()
                ),
                line,
            )
            .into())
        }
    };
    match ord {
        Some(o) => Ok(Value::Bool(accept(o))),
        None => Err(ConvoError::runtime("comparison produced no ordering (NaN)", line).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::token::Lexer;

    fn run_source(src: &str) -> ConvoResult<Environment> {
        let tokens = Lexer::new(src, 4, true).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let env = Environment::root();
        let evaluator = Evaluator::new(RunnerConfig::default());
        evaluator.run(&program, &env)?;
        Ok(env)
    }

    #[test]
    fn let_and_arithmetic_bind_expected_value() {
        let env = run_source("Let x be 2 + 3 * 4\n").unwrap();
        assert!(matches!(env.get("x"), Some(Value::Number(n)) if n == 14.0));
    }

    #[test]
    fn string_plus_number_concatenates() {
        let env = run_source("Let x be \"count: \" + 5\n").unwrap();
        assert!(matches!(env.get("x"), Some(Value::Str(s)) if &*s == "count: 5"));
    }

    #[test]
    fn division_by_zero_is_runtime_error() {
        let err = run_source("Let x be 1 / 0\n").unwrap_err();
        assert_eq!(err.kind.label(), "RuntimeError");
    }

    #[test]
    fn while_loop_counts_to_target() {
        let env = run_source(
            "Let n be 0\nWhile n less than 5:\n    Let n be n + 1\n",
        )
        .unwrap();
        assert!(matches!(env.get("n"), Some(Value::Number(n)) if n == 5.0));
    }

    #[test]
    fn function_call_returns_value() {
        let env = run_source(
            "Define square with x:\n    Return x * x\nLet y be square(6)\n",
        )
        .unwrap();
        assert!(matches!(env.get("y"), Some(Value::Number(n)) if n == 36.0));
    }

    #[test]
    fn try_catch_binds_runtime_error_message() {
        let env = run_source(
            "Let msg be null\nTry:\n    Let z be 1 / 0\nCatch e:\n    Let msg be e\n",
        )
        .unwrap();
        assert!(matches!(env.get("msg"), Some(Value::Str(_))));
    }

    #[test]
    fn for_each_accumulates_list_sum() {
        let env = run_source(
            "Let total be 0\nFor each n in [1, 2, 3]:\n    Let total be total + n\n",
        )
        .unwrap();
        assert!(matches!(env.get("total"), Some(Value::Number(n)) if n == 6.0));
    }

    #[test]
    fn new_constructs_instance_with_fields_and_method() {
        let env = run_source(
            "Define Counter with start:\n    Let this.count be start\n    Define bump with by:\n        Let this.count be this.count + by\n        Return this.count\nLet c be New Counter with 10\nLet r be c.bump(5)\n",
        )
        .unwrap();
        assert!(matches!(env.get("r"), Some(Value::Number(n)) if n == 15.0));
    }

    #[test]
    fn stop_halts_program_without_error() {
        run_source("Say \"a\"\nStop\nSay \"b\"\n").unwrap();
    }

    #[test]
    fn undefined_identifier_is_name_error() {
        let err = run_source("Say missing\n").unwrap_err();
        assert_eq!(err.kind.label(), "NameError");
    }

    #[test]
    fn negative_list_index_counts_from_end() {
        let env = run_source("Let xs be [1, 2, 3]\nLet last be xs[-1]\n").unwrap();
        assert!(matches!(env.get("last"), Some(Value::Number(n)) if n == 3.0));
    }
}
