//! Convo: a small, English-like scripting language. This crate hosts the
//! lexer, parser, tree-walking evaluator, and built-in function registry;
//! `src/bin/convo.rs` wraps it in a file-runner/REPL CLI.

pub mod ast;
pub mod builtins;
pub mod config;
pub mod environment;
pub mod error;
pub mod eval;
pub mod parser;
pub mod token;
pub mod value;

use config::RunnerConfig;
use environment::Environment;
use error::ConvoResult;
use eval::Evaluator;
use parser::Parser;
use token::Lexer;
use value::Value;

/// The embeddable entry point: owns one evaluator and the global
/// environment bindings persist in across calls, so a host (the CLI's
/// REPL mode, or an embedder) can run several chunks of source against
/// the same state.
pub struct Engine {
    evaluator: Evaluator,
    config: RunnerConfig,
    global: Environment,
}

impl Engine {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            evaluator: Evaluator::new(config.clone()),
            config,
            global: Environment::root(),
        }
    }

    /// The environment bindings accumulate in; exposed so a REPL can print
    /// `Let`-bound names between prompts if it wants to.
    pub fn global_env(&self) -> &Environment {
        &self.global
    }

    /// Lex, parse, and run `source` against the engine's persistent global
    /// environment.
    pub fn run_str(&self, source: &str) -> ConvoResult<()> {
        let program = self.parse(source)?;
        self.evaluator.run(&program, &self.global)
    }

    /// Like [`Engine::run_str`], but for a single REPL line: if the parsed
    /// program is exactly one expression statement, its value is returned
    /// instead of being discarded, matching §6's "printing the value of
    /// expression statements" requirement.
    pub fn run_repl_line(&self, source: &str) -> ConvoResult<Option<Value>> {
        let program = self.parse(source)?;
        if let [ast::Stmt::ExpressionStmt { expr, line }] = program.as_slice() {
            let _ = line;
            return self
                .evaluator
                .eval_expr_pub(expr, &self.global)
                .map(Some);
        }
        self.evaluator.run(&program, &self.global)?;
        Ok(None)
    }

    fn parse(&self, source: &str) -> ConvoResult<Vec<ast::Stmt>> {
        let tokens = Lexer::new(source, self.config.tab_width, self.config.strict_keywords).tokenize()?;
        Parser::new(tokens).parse_program()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_persists_bindings_across_run_str_calls() {
        let engine = Engine::new(RunnerConfig::default());
        engine.run_str("Let x be 10\n").unwrap();
        engine.run_str("Let y be x + 5\n").unwrap();
        assert!(matches!(engine.global_env().get("y"), Some(Value::Number(n)) if n == 15.0));
    }

    #[test]
    fn run_repl_line_returns_expression_value() {
        let engine = Engine::new(RunnerConfig::default());
        engine.run_str("Let x be 4\n").unwrap();
        let v = engine.run_repl_line("x + 1\n").unwrap();
        assert!(matches!(v, Some(Value::Number(n)) if n == 5.0));
    }
}
